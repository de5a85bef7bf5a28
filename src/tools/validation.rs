//! Validate tool call arguments before execution.

use super::arguments::ToolArguments;
use crate::error::{AcontextError, Result};

/// Check that every required argument is present and non-empty.
///
/// Fails with a validation error naming the first missing argument, in the
/// order the tool declared them.
pub fn validate_required(required: &[String], args: &ToolArguments) -> Result<()> {
    match required.iter().find(|name| !args.is_present(name)) {
        Some(missing) => Err(AcontextError::missing_argument(missing)),
        None => Ok(()),
    }
}

/// Require at least one of `names`, failing with `message` otherwise.
pub fn require_any(args: &ToolArguments, names: &[&str], message: &str) -> Result<()> {
    if names.iter().any(|name| args.is_present(name)) {
        Ok(())
    } else {
        Err(AcontextError::validation(message))
    }
}

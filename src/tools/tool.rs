//! Tool trait and schema conversion.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::Result;

/// Core tool trait, generic over the context the tool runs against.
///
/// `execute` receives the context mutably. Writes to it (for example a newly
/// mounted skill path) are visible to later calls in the same run; a context
/// must not be shared between concurrent runs.
#[async_trait]
pub trait Tool<C>: Send + Sync
where
    C: Send + Sync + 'static,
{
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    fn parameters(&self) -> &ToolParameters;

    /// Arguments that must be present and non-empty at call time.
    fn required_arguments(&self) -> &[String] {
        self.parameters().required()
    }

    /// Perform the side effect and describe it as text for the model.
    ///
    /// Required arguments are already checked by [`ToolPool`](super::ToolPool).
    async fn execute(&self, ctx: &mut C, args: &ToolArguments) -> Result<String>;

    /// OpenAI function-calling schema.
    fn to_openai_tool_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters().to_json_schema(),
            }
        })
    }

    /// Anthropic tool-use schema.
    fn to_anthropic_tool_schema(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "input_schema": self.parameters().to_json_schema(),
        })
    }
}

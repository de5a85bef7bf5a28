//! Convenience re-exports for common use.

pub use crate::client::{AcontextClient, DiskApi, SandboxApi, SessionApi, SkillApi};
pub use crate::config::ClientConfig;
pub use crate::conversation::{AdapterOptions, ConversationAdapter, ProcessOutcome, SessionState};
pub use crate::error::{AcontextError, Result};
pub use crate::tools::{
    disk_tools, sandbox_tools, sandbox_tools_with_timeout, skill_tools, Tool, ToolArguments,
    ToolParameters, ToolPool,
};
pub use crate::types::{ContentBlock, MessageBlob, MessageFormat, MessageMeta, MessageRole};

//! Agent tool framework.
//!
//! A [`Tool`] declares its name, description and arguments, and runs against
//! a typed context. A [`ToolPool`] keys tools by name, exports OpenAI and
//! Anthropic schemas for the whole set, and dispatches calls after checking
//! required arguments. Pre-populated pools exist for disks, skills and
//! sandboxes; each factory returns a fresh instance.

pub mod arguments;
pub mod disk;
pub mod pool;
pub mod sandbox;
pub mod skill;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use disk::{disk_tools, DiskContext, DiskToolPool};
pub use pool::ToolPool;
pub use sandbox::{sandbox_tools, sandbox_tools_with_timeout, SandboxContext, SandboxToolPool};
pub use skill::{skill_tools, SkillContext, SkillToolPool};
pub use tool::Tool;
pub use types::{ArgType, ArgumentSpec, ToolParameters};

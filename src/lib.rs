//! Acontext client SDK.
//!
//! Two pieces sit on top of the HTTP client:
//!
//! - [`tools`]: tool pools bound to a disk, the skill catalog or a sandbox,
//!   exportable as OpenAI or Anthropic tool schemas.
//! - [`conversation`]: an adapter that stores an agent runtime's event stream
//!   as session messages.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use acontext::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> acontext::error::Result<()> {
//! let client = Arc::new(AcontextClient::from_env()?);
//!
//! let pool = disk_tools();
//! let mut ctx = pool.format_context(client.clone(), "disk-1");
//! let schemas = pool.to_openai_tool_schema();
//! let out = pool
//!     .execute_tool(&mut ctx, "write_file", json!({"filename": "a.md", "content": "hi"}))
//!     .await?;
//! println!("{} tools, {out}", schemas.len());
//!
//! let mut adapter = ConversationAdapter::new(client, AdapterOptions::default());
//! adapter
//!     .process(&json!({"type": "user", "message": {"role": "user", "content": "Hi"}}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod prelude;
pub mod tools;
pub mod types;

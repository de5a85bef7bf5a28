//! Conversation adapter.
//!
//! Consumes the untyped event stream of an agent runtime, picks out the
//! session identity, normalizes user and assistant turns into
//! [`MessageBlob`](crate::types::MessageBlob)s and stores them in an
//! Acontext session.

pub mod adapter;
pub mod event;
pub mod normalize;

pub use adapter::{AdapterOptions, ConversationAdapter, ErrorCallback, ProcessOutcome, SessionState};
pub use event::{classify, is_uuid_shaped, session_id_of, EventKind};
pub use normalize::{normalize_event, NormalizedMessage};

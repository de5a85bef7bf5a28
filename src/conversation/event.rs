//! Classification of raw agent-runtime events and session id discovery.

use serde_json::Value;
use uuid::Uuid;

/// Event `type` values that carry no conversational content.
const CONTROL_TYPES: &[&str] = &[
    "system",
    "result",
    "stream_event",
    "tool_progress",
    "auth_status",
    "keep_alive",
];

/// Fields a session id may arrive in, in lookup order.
const SESSION_ID_FIELDS: &[&str] = &["session_id", "sessionId"];

/// What an event is, for the purpose of persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Administrative or lifecycle event. Only inspected for a session id.
    Control,
    /// A user turn re-emitted by the runtime. Never persisted.
    Replay,
    User,
    Assistant,
    /// Unrecognized `type`. Treated like a control event.
    Unknown,
}

/// Classify an event by its `type` field.
pub fn classify(event: &Value) -> EventKind {
    let Some(kind) = event.get("type").and_then(Value::as_str) else {
        return EventKind::Unknown;
    };
    match kind {
        "user" if is_replay(event) => EventKind::Replay,
        "user" => EventKind::User,
        "assistant" => EventKind::Assistant,
        other if CONTROL_TYPES.contains(&other) => EventKind::Control,
        _ => EventKind::Unknown,
    }
}

fn is_replay(event: &Value) -> bool {
    ["isReplay", "is_replay"]
        .iter()
        .any(|key| event.get(*key).and_then(Value::as_bool).unwrap_or(false))
}

/// The session id carried by an event, if it is present and UUID-shaped.
pub fn session_id_of(event: &Value) -> Option<&str> {
    SESSION_ID_FIELDS
        .iter()
        .filter_map(|field| event.get(*field).and_then(Value::as_str))
        .find(|candidate| is_uuid_shaped(candidate))
}

/// Canonical hyphenated 8-4-4-4-12 hex form.
pub fn is_uuid_shaped(candidate: &str) -> bool {
    // The simple, braced and urn forms all have a different length.
    candidate.len() == 36 && Uuid::try_parse(candidate).is_ok()
}

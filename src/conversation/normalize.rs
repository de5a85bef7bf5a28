//! Normalization of user/assistant events into canonical message blobs.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::debug;

use crate::types::{
    ContentBlock, MessageBlob, MessageMeta, MessageRole, ToolResultContent, ToolResultPart,
};

/// A blob ready to store, plus assistant metadata when there is any.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMessage {
    pub blob: MessageBlob,
    pub meta: Option<MessageMeta>,
}

/// Content block as it arrives from the runtime.
///
/// Every field is defaulted and tolerates a value of the wrong type, so that
/// a sparse or sloppy block still parses; kinds this protocol does not persist
/// (images, redacted thinking, server tools) land in `Unsupported`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawBlock {
    Text {
        #[serde(default, deserialize_with = "lenient_string")]
        text: String,
    },
    Thinking {
        #[serde(default, deserialize_with = "lenient_string")]
        thinking: String,
        #[serde(default, deserialize_with = "lenient_opt_string")]
        signature: Option<String>,
    },
    ToolUse {
        #[serde(default, deserialize_with = "lenient_string")]
        id: String,
        #[serde(default, deserialize_with = "lenient_string")]
        name: String,
        #[serde(default = "empty_object")]
        input: Value,
    },
    ToolResult {
        #[serde(default, deserialize_with = "lenient_string")]
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default, deserialize_with = "lenient_flag")]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unsupported,
}

fn empty_object() -> Value {
    json!({})
}

/// Non-string values read as empty.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Accepts `true`/`false` and their string spellings.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Some(flag),
        Value::String(s) => s.trim().to_ascii_lowercase().parse().ok(),
        _ => None,
    })
}

fn parse_block(raw: &Value) -> Option<RawBlock> {
    match RawBlock::deserialize(raw) {
        Ok(block) => Some(block),
        Err(err) => {
            debug!(error = %err, block = %raw, "skipping malformed content block");
            None
        }
    }
}

/// Normalize a `user` or `assistant` event.
///
/// Returns `None` when the event has no role this protocol persists or when
/// no content block survives.
pub fn normalize_event(event: &Value, include_thinking: bool) -> Option<NormalizedMessage> {
    let role = match event.get("type").and_then(Value::as_str)? {
        "user" => MessageRole::User,
        "assistant" => MessageRole::Assistant,
        _ => return None,
    };
    let message = event.get("message").unwrap_or(&Value::Null);

    let mut has_thinking = false;
    let content = match message.get("content") {
        Some(Value::String(text)) if !text.is_empty() => vec![ContentBlock::text(text.clone())],
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(parse_block)
            .filter_map(|raw| normalize_block(raw, role, include_thinking, &mut has_thinking))
            .collect(),
        _ => Vec::new(),
    };
    if content.is_empty() {
        return None;
    }

    let meta = match role {
        MessageRole::Assistant => assistant_meta(event, message, has_thinking),
        MessageRole::User => None,
    };

    Some(NormalizedMessage {
        blob: MessageBlob::new(role, content),
        meta,
    })
}

fn normalize_block(
    raw: RawBlock,
    role: MessageRole,
    include_thinking: bool,
    has_thinking: &mut bool,
) -> Option<ContentBlock> {
    match raw {
        RawBlock::Text { text } => (!text.is_empty()).then(|| ContentBlock::Text { text }),
        RawBlock::Thinking { thinking, signature } => {
            if !include_thinking || thinking.is_empty() {
                return None;
            }
            *has_thinking = true;
            Some(ContentBlock::Thinking { thinking, signature })
        }
        RawBlock::ToolUse { id, name, input } => match role {
            MessageRole::Assistant => Some(ContentBlock::ToolUse {
                id,
                name,
                input: parse_tool_input(input),
            }),
            MessageRole::User => None,
        },
        RawBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => match role {
            MessageRole::User => Some(ContentBlock::ToolResult {
                tool_use_id,
                content: tool_result_content(content),
                is_error,
            }),
            MessageRole::Assistant => None,
        },
        RawBlock::Unsupported => None,
    }
}

/// String inputs are decoded as JSON; undecodable ones are kept as `{raw}`.
fn parse_tool_input(input: Value) -> Value {
    match input {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| json!({ "raw": raw })),
        other => other,
    }
}

fn tool_result_content(content: Value) -> ToolResultContent {
    match content {
        Value::Null => ToolResultContent::default(),
        Value::String(text) => ToolResultContent::Text(text),
        Value::Array(items) => ToolResultContent::Parts(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(ToolResultPart::Text { text }),
                    Value::Object(mut obj) => match obj.remove("text") {
                        Some(Value::String(text)) => Some(ToolResultPart::Text { text }),
                        _ => None,
                    },
                    _ => None,
                })
                .collect(),
        ),
        other => ToolResultContent::Text(other.to_string()),
    }
}

fn assistant_meta(event: &Value, message: &Value, has_thinking: bool) -> Option<MessageMeta> {
    let meta = MessageMeta {
        model: message
            .get("model")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string),
        has_thinking: has_thinking.then_some(true),
        error: event.get("error").filter(|e| !e.is_null()).cloned(),
    };
    (!meta.is_empty()).then_some(meta)
}

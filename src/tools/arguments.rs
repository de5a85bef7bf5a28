//! Typed access to tool call arguments.

use serde_json::Value;

use crate::error::{AcontextError, Result};

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    value: serde_json::Map<String, Value>,
}

impl ToolArguments {
    /// Accept arguments as an object, a JSON-encoded object string, or null.
    pub fn from_value(value: Value) -> Result<Self> {
        let value = match value {
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Value::Object(Default::default())
                } else {
                    serde_json::from_str::<Value>(trimmed).map_err(|e| {
                        AcontextError::validation(format!("Failed to parse arguments: {e}"))
                    })?
                }
            }
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        match value {
            Value::Object(map) => Ok(Self { value: map }),
            other => Err(AcontextError::validation(format!(
                "expected object arguments, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Get the raw JSON value of one argument.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    /// Whether `key` carries a usable value: not absent, not null, not an empty string.
    pub fn is_present(&self, key: &str) -> bool {
        match self.value.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Get a required, non-empty string argument.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.get_str_opt(key)
            .ok_or_else(|| AcontextError::missing_argument(key))
    }

    /// Get an optional string argument. Empty strings count as absent.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Get an optional non-negative integer, accepting numeric strings.
    pub fn get_u64_opt(&self, key: &str) -> Result<Option<u64>> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .map(Some)
                .ok_or_else(|| invalid_type(key, "a non-negative integer")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| invalid_type(key, "a non-negative integer")),
            Some(_) => Err(invalid_type(key, "a non-negative integer")),
        }
    }

    /// Get an optional float, accepting numeric strings.
    pub fn get_f64_opt(&self, key: &str) -> Result<Option<f64>> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| invalid_type(key, "a number")),
            Some(_) => Err(invalid_type(key, "a number")),
        }
    }

    /// Get an optional array argument.
    pub fn get_array_opt(&self, key: &str) -> Result<Option<&Vec<Value>>> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(invalid_type(key, "an array")),
        }
    }

    /// Get an optional JSON object argument.
    pub fn get_object_opt(&self, key: &str) -> Result<Option<&Value>> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v @ Value::Object(_)) => Ok(Some(v)),
            Some(_) => Err(invalid_type(key, "an object")),
        }
    }
}

fn invalid_type(key: &str, expected: &str) -> AcontextError {
    AcontextError::validation(format!("{key} must be {expected}"))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

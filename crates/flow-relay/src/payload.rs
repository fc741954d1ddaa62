//! Inbound webhook payloads

use serde_json::{Map, Value};

use crate::error::{RelayError, RelayResult};

/// Input used when the caller sends none
pub const DEFAULT_INPUT: &str = "Hello!";

/// JSON object posted to a webhook route
///
/// Only `input` is interpreted; every other field is carried untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundPayload {
    fields: Map<String, Value>,
}

impl InboundPayload {
    /// Parse a request body, which must be a JSON object
    pub fn parse(body: &[u8]) -> RelayResult<Self> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RelayError::MalformedPayload(format!(
                "Expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// The `input` field, or [`DEFAULT_INPUT`] when missing or not a string
    pub fn input(&self) -> &str {
        self.fields
            .get("input")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INPUT)
    }

    /// Borrow the raw fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Give back the original object
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

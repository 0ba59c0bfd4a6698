//! Request and response envelope types
//!
//! The request is an untyped JSON object; the response is always exactly one
//! envelope: `{"ok": true, ...fields}` or `{"ok": false, "error": {...}}`.

use crate::errors::ToolError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Untyped request object read from standard input
pub type Request = Map<String, Value>;

/// The single response written by a tool process
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// Operation output fields, merged next to `ok: true`
    Success(Map<String, Value>),

    /// Classified or coerced failure
    Failure(ToolError),
}

impl ResponseEnvelope {
    /// Build a success envelope from an output object.
    ///
    /// `ok` belongs to the envelope; an output field with that name is dropped.
    pub fn success(mut fields: Map<String, Value>) -> Self {
        if fields.remove("ok").is_some() {
            tracing::warn!("operation output contained an `ok` field; dropped in favour of the envelope flag");
        }
        ResponseEnvelope::Success(fields)
    }

    /// Build a failure envelope
    pub fn failure(error: ToolError) -> Self {
        ResponseEnvelope::Failure(error)
    }

    /// Serialize typed operation output into a success envelope.
    ///
    /// Output that does not serialize to a JSON object cannot be merged and
    /// is reported as `UNEXPECTED`.
    pub fn from_output<T: Serialize>(output: &T) -> Result<Self, ToolError> {
        match serde_json::to_value(output) {
            Ok(Value::Object(fields)) => Ok(Self::success(fields)),
            Ok(other) => Err(ToolError::unexpected(format!(
                "operation output must be a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(ToolError::unexpected(format!(
                "failed to serialize operation output: {}",
                e
            ))),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseEnvelope::Success(_))
    }

    /// Error carried by a failure envelope
    pub fn error(&self) -> Option<&ToolError> {
        match self {
            ResponseEnvelope::Failure(err) => Some(err),
            ResponseEnvelope::Success(_) => None,
        }
    }

    /// Output fields of a success envelope
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            ResponseEnvelope::Success(fields) => Some(fields),
            ResponseEnvelope::Failure(_) => None,
        }
    }

    /// Exit status for the process that produced this envelope
    pub fn exit_status(&self) -> i32 {
        match self {
            ResponseEnvelope::Success(_) => 0,
            ResponseEnvelope::Failure(err) => err.exit_status(),
        }
    }

    /// Encode as compact JSON bytes
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Interpret a parsed JSON value as an envelope (caller side)
    pub fn from_value(value: Value) -> Result<Self, String> {
        let mut object = match value {
            Value::Object(object) => object,
            other => return Err(format!("expected a JSON object, got {}", json_kind(&other))),
        };

        match object.remove("ok") {
            Some(Value::Bool(true)) => Ok(ResponseEnvelope::Success(object)),
            Some(Value::Bool(false)) => {
                let error = object
                    .remove("error")
                    .ok_or_else(|| "failure envelope has no `error` field".to_string())?;
                serde_json::from_value::<ToolError>(error)
                    .map(ResponseEnvelope::Failure)
                    .map_err(|e| format!("invalid `error` field: {}", e))
            }
            Some(_) => Err("`ok` must be a boolean".to_string()),
            None => Err("envelope has no `ok` field".to_string()),
        }
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseEnvelope::Success(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                map.serialize_entry("ok", &true)?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ResponseEnvelope::Failure(error) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

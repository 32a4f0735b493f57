// Result normalization
//
// The flow's return value is opaque to the caller. `FlowOutput` enumerates the
// shapes a flow may hand back; `normalize` maps each to the `{data, status, message}`
// envelope consumers expect.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_SUCCESS: &str = "success";

/// Shapes a flow invocation can produce
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutput {
    /// Plain text answer
    Text(String),
    /// Flow state exposing a `response` field
    State {
        response: Option<Value>,
        /// Textual form of the whole state, used when the response is empty
        display: String,
    },
    /// Already-structured mapping, passed through untouched
    Mapping(Map<String, Value>),
    /// Typed record with named fields
    Record {
        fields: Map<String, Value>,
        display: String,
    },
    /// Anything else, in textual form
    Other(String),
}

impl FlowOutput {
    /// Classify a JSON value returned by a remote flow.
    ///
    /// A flow state crosses the wire as a plain object, so any object carrying
    /// a `response` key is read as `State`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => FlowOutput::Text(s),
            Value::Object(map) if map.contains_key("response") => {
                let display = Value::Object(map.clone()).to_string();
                FlowOutput::State {
                    response: map.get("response").cloned(),
                    display,
                }
            }
            Value::Object(map) => FlowOutput::Mapping(map),
            other => FlowOutput::Other(other.to_string()),
        }
    }

    /// Build a `Record` from any serializable value with a textual form.
    ///
    /// For in-process `Flow` implementations that return typed results; the
    /// remote backend only sees JSON and goes through `from_json`.
    pub fn record<T>(value: &T) -> Self
    where
        T: Serialize + std::fmt::Display,
    {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => FlowOutput::Record {
                fields,
                display: value.to_string(),
            },
            _ => FlowOutput::Other(value.to_string()),
        }
    }
}

/// Uniform result envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub data: Value,
    pub status: String,
    pub message: String,
}

impl ResultEnvelope {
    pub fn success(data: Value, message: impl Into<String>) -> Self {
        Self {
            data,
            status: STATUS_SUCCESS.to_string(),
            message: message.into(),
        }
    }

    fn text(text: String) -> Self {
        Self::success(Value::String(text.clone()), text)
    }
}

/// Normalized flow result: an envelope, or a mapping passed through as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedOutput {
    Envelope(ResultEnvelope),
    Passthrough(Map<String, Value>),
}

impl NormalizedOutput {
    /// Human-readable message, if the output carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            NormalizedOutput::Envelope(envelope) => Some(&envelope.message),
            NormalizedOutput::Passthrough(map) => map.get("message").and_then(Value::as_str),
        }
    }
}

/// Map a flow output onto the result envelope
pub fn normalize(output: FlowOutput) -> NormalizedOutput {
    match output {
        FlowOutput::Text(text) => NormalizedOutput::Envelope(ResultEnvelope::text(text)),
        FlowOutput::State { response, display } => {
            let text = match response {
                Some(value) if is_truthy(&value) => stringify(&value),
                _ => display,
            };
            NormalizedOutput::Envelope(ResultEnvelope::text(text))
        }
        FlowOutput::Mapping(map) => NormalizedOutput::Passthrough(map),
        FlowOutput::Record { fields, display } => {
            NormalizedOutput::Envelope(ResultEnvelope::success(Value::Object(fields), display))
        }
        FlowOutput::Other(text) => NormalizedOutput::Envelope(ResultEnvelope::text(text)),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

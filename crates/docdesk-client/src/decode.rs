//! Tolerant decoding of document-service payloads.
//!
//! Every decoder takes the endpoint label so a shape mismatch turns into an
//! [`Error::Decode`] the console can show as a note.

use serde::de::DeserializeOwned;
use serde_json::Value;

use docdesk_core::error::{Error, Result};
use docdesk_core::types::{PassageHit, SemRow};

/// Parse a response body as JSON.
pub fn parse_body(endpoint: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| {
        let head: String = body.chars().take(80).collect();
        Error::Decode { endpoint: endpoint.to_string(), note: format!("not JSON ({e}); body starts {head:?}") }
    })
}

pub fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode { endpoint: endpoint.to_string(), note: e.to_string() })
}

/// Passages arrive either as a bare array or wrapped as `{"passages": [...]}`.
pub fn passages(endpoint: &str, value: Value) -> Result<Vec<PassageHit>> {
    match value {
        Value::Array(_) => decode(endpoint, value),
        Value::Object(mut obj) => match obj.remove("passages") {
            Some(inner @ Value::Array(_)) => decode(endpoint, inner),
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(Error::Decode { endpoint: endpoint.to_string(), note: "object without a 'passages' array".into() }),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(Error::Decode { endpoint: endpoint.to_string(), note: format!("expected array, got {}", kind(&other)) }),
    }
}

/// Ranked rows must be a bare array.
pub fn sem_rows(endpoint: &str, value: Value) -> Result<Vec<SemRow>> {
    match value {
        Value::Array(_) => decode(endpoint, value),
        other => Err(Error::Decode { endpoint: endpoint.to_string(), note: format!("expected array, got {}", kind(&other)) }),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

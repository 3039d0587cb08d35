//! Shared handling of Instagram JSON responses
//!
//! Instagram reports errors in two shapes: Graph-style
//! `{"error": {"message": ..., "type": ..., "code": ...}}` and the older
//! flat `{"error_type": ..., "code": ..., "error_message": ...}`. Both can
//! arrive with a 4xx status or, occasionally, a 200.

use serde_json::{Map, Value};

use crate::error::Failure;

pub(crate) type JsonObject = Map<String, Value>;

/// Read a response body as a JSON object.
///
/// Non-2xx responses always become [`Failure::Rejected`], carrying the
/// provider message when the body is JSON and the raw text otherwise.
pub(crate) async fn read_object(response: reqwest::Response) -> Result<JsonObject, Failure> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Failure::Transport(e.without_url()))?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(body)) => Failure::Rejected {
                status: Some(status.as_u16()),
                message: provider_message(&body),
                payload: error_payload(&body),
            },
            _ => Failure::Rejected {
                status: Some(status.as_u16()),
                message: if text.trim().is_empty() {
                    String::from("unknown error")
                } else {
                    text
                },
                payload: None,
            },
        });
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(other) => Err(Failure::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Failure::Decode(e.to_string())),
    }
}

/// Turn a 2xx body that still lacks the expected data into a failure.
///
/// A body carrying an error object is a provider rejection; anything else
/// is reported as the missing `field`.
pub(crate) fn missing_or_rejected(body: &JsonObject, field: &'static str) -> Failure {
    match error_payload(body) {
        Some(payload) => Failure::Rejected {
            status: None,
            message: provider_message(body),
            payload: Some(payload),
        },
        None => Failure::MissingField(field),
    }
}

/// The provider's error object, if the body carries one.
pub(crate) fn error_payload(body: &JsonObject) -> Option<Value> {
    if let Some(error) = body.get("error") {
        return Some(error.clone());
    }
    if body.contains_key("error_message") || body.contains_key("error_type") {
        return Some(Value::Object(body.clone()));
    }
    None
}

/// Human-readable provider message, `"unknown error"` when there is none.
pub(crate) fn provider_message(body: &JsonObject) -> String {
    let nested = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str);

    nested
        .or_else(|| body.get("error_message").and_then(Value::as_str))
        .or_else(|| body.get("error_description").and_then(Value::as_str))
        .or_else(|| body.get("error").and_then(Value::as_str))
        .unwrap_or("unknown error")
        .to_owned()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

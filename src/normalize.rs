//! Conversion of raw backend bodies and client errors into the uniform
//! success/failure shape that callers branch on.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Message shown when nothing more specific can be extracted.
pub const DEFAULT_PLACEHOLDER: &str = "Something went wrong";

const MALFORMED_TOKEN_MESSAGE: &str = "Your credentials were not registered in system.";
const EXPIRED_TOKEN_MESSAGE: &str = "Your credentials has been expired.";

/// A backend-reported failure. `message` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: None,
            param: None,
            value: None,
        }
    }

    /// True when the failure names a single offending field.
    pub fn is_validation(&self) -> bool {
        self.param.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    Success { data: Value },
    Failure(Failure),
}

impl NormalizedResult {
    pub fn is_success(&self) -> bool {
        matches!(self, NormalizedResult::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            NormalizedResult::Success { data } => Some(data),
            NormalizedResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            NormalizedResult::Success { .. } => None,
            NormalizedResult::Failure(f) => Some(f),
        }
    }

    /// Success payload, or the failure as an error.
    pub fn into_data(self) -> Result<Value, ApiError> {
        match self {
            NormalizedResult::Success { data } => Ok(data),
            NormalizedResult::Failure(f) => Err(ApiError::Rejected(f)),
        }
    }
}

/// Normalize a backend response body.
pub fn normalize(body: Value) -> NormalizedResult {
    if !has_error_marker(&body) {
        return NormalizedResult::Success { data: body };
    }

    match failure_from_envelope(&body["error"]) {
        Some(failure) => NormalizedResult::Failure(failure),
        None => {
            tracing::warn!("Malformed error envelope from backend: {body}");
            NormalizedResult::Failure(Failure::new(DEFAULT_PLACEHOLDER))
        }
    }
}

/// True when the body carries a truthy top-level `error` field.
pub fn has_error_marker(body: &Value) -> bool {
    body.get("error").is_some_and(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn failure_from_envelope(error: &Value) -> Option<Failure> {
    let error_code = error.get("code").and_then(code_text);

    if let Some(message) = error.get("message").and_then(non_empty_text) {
        return Some(Failure {
            message: user_facing_message(message),
            error_code,
            param: None,
            value: None,
        });
    }

    let first = error.get("errors")?.as_array()?.first()?;
    let message = first.get("msg").and_then(non_empty_text)?;
    Some(Failure {
        message: message.to_string(),
        error_code,
        param: first.get("param").and_then(Value::as_str).map(str::to_string),
        value: first.get("value").cloned(),
    })
}

/// Rewrites technical token errors into text a user can act on.
fn user_facing_message(raw: &str) -> String {
    let mut message = raw.strip_prefix("Error: ").unwrap_or(raw).to_string();
    if message.contains("jwt malformed") {
        message = MALFORMED_TOKEN_MESSAGE.to_string();
    }
    if message.contains("jwt expired") {
        message = EXPIRED_TOKEN_MESSAGE.to_string();
    }
    message
}

fn non_empty_text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Display string for an error raised by the client.
///
/// Transport errors never reached the server and get the placeholder.
/// Errors carrying a server body surface the body's message, then the first
/// validation `msg`. Everything else uses its own display text.
pub fn parse_error(error: &ApiError, placeholder: Option<&str>) -> String {
    let placeholder = placeholder.unwrap_or(DEFAULT_PLACEHOLDER);
    match error {
        ApiError::Transport(_) => placeholder.to_string(),
        ApiError::Unauthorized { body } | ApiError::Status { body, .. } => {
            serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| {
                    let obj = v.get("error").filter(|e| e.is_object()).unwrap_or(&v);
                    message_from_error_object(obj)
                })
                .unwrap_or_else(|| placeholder.to_string())
        }
        ApiError::Rejected(failure) => failure.message.clone(),
        other => other.to_string(),
    }
}

/// [`parse_error`] for a plain JSON error object: `message`, then
/// `errors[0].msg`, then the placeholder.
pub fn parse_error_value(error: &Value, placeholder: Option<&str>) -> String {
    message_from_error_object(error)
        .unwrap_or_else(|| placeholder.unwrap_or(DEFAULT_PLACEHOLDER).to_string())
}

fn message_from_error_object(error: &Value) -> Option<String> {
    if let Some(message) = error.get("message").and_then(non_empty_text) {
        return Some(message.to_string());
    }
    error
        .get("errors")?
        .as_array()?
        .first()?
        .get("msg")
        .and_then(non_empty_text)
        .map(str::to_string)
}

use std::path::PathBuf;

use reqwest::StatusCode;

use crate::normalize::Failure;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized: {}", body_summary(.body))]
    Unauthorized { body: String },

    #[error("HTTP {status}: {}", body_summary(.body))]
    Status { status: StatusCode, body: String },

    #[error("{}", .0.message)]
    Rejected(Failure),

    #[error("Unexpected payload: {0}")]
    Decode(String),

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn body_summary(body: &str) -> &str {
    if body.trim().is_empty() {
        "(empty body)"
    } else {
        body
    }
}

impl ApiError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport_error",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Status { .. } => "http_error",
            ApiError::Rejected(_) => "rejected",
            ApiError::Decode(_) => "decode_error",
            ApiError::ConfigError { .. } => "config_error",
            ApiError::Credentials(_) => "credentials_error",
            ApiError::IoError(_) => "io_error",
        }
    }

    /// HTTP status of the server response behind this error, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Raw response body, for errors that received one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { body } | ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True when the call never produced a server response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        if let Some(status) = self.status() {
            obj.insert("status".into(), serde_json::Value::from(status.as_u16()));
        }
        if let ApiError::Rejected(failure) = self {
            if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(failure) {
                obj.extend(fields.into_iter().filter(|(k, _)| k != "message"));
            }
        }
        serde_json::json!({ "error": obj })
    }
}

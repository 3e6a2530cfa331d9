use serde::Serialize;
use serde_json::Value;

use crate::normalize::NormalizedResult;

/// `{ type, response? }` on success, `{ type, error }` on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionResult {
    Success {
        #[serde(rename = "type")]
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<Value>,
    },
    Failure {
        #[serde(rename = "type")]
        kind: String,
        error: Value,
    },
}

impl ActionResult {
    pub fn kind(&self) -> &str {
        match self {
            ActionResult::Success { kind, .. } | ActionResult::Failure { kind, .. } => kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }
}

pub fn on_success(kind: impl Into<String>, response: Option<Value>) -> ActionResult {
    ActionResult::Success {
        kind: kind.into(),
        response,
    }
}

pub fn on_failure(kind: impl Into<String>, error: impl Into<Value>) -> ActionResult {
    ActionResult::Failure {
        kind: kind.into(),
        error: error.into(),
    }
}

impl NormalizedResult {
    /// Wrap this result as an action of the given type.
    pub fn into_action(self, kind: impl Into<String>) -> ActionResult {
        match self {
            NormalizedResult::Success { data } => on_success(kind, Some(data)),
            NormalizedResult::Failure(failure) => {
                let error = serde_json::to_value(&failure)
                    .unwrap_or_else(|_| Value::String(failure.message.clone()));
                on_failure(kind, error)
            }
        }
    }
}

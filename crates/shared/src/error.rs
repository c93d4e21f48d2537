use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure body returned by every planner endpoint: `{ "error": "..." }`, sometimes
/// with a longer `message` next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// The `error` text, or `message` when `error` is blank.
    pub fn into_text(self) -> Option<String> {
        let error = self.error.trim();
        if !error.is_empty() {
            return Some(error.to_string());
        }
        self.message
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDomainError {
    #[error("unknown activity '{0}'")]
    UnknownActivity(String),
    #[error("unknown group size '{0}'")]
    UnknownGroupSize(String),
}

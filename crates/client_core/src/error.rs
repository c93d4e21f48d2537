//! Error taxonomy surfaced at controller boundaries.

use thiserror::Error;

pub const GENERIC_REQUEST_FAILURE: &str = "Request failed";
pub const ITINERARY_UNAVAILABLE: &str = "Could not load itinerary.";

/// Client-side validation failure. Raised before any request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required!")]
    MissingFields,
    #[error("Email and password are required!")]
    MissingLoginFields,
    #[error("End date must be on or after the start date.")]
    EndBeforeStart,
    #[error("Budget must be a positive amount.")]
    NonPositiveBudget,
}

/// Network or server failure for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ApiFailure {
    /// Text shown to the user: the server-provided error verbatim, else a fallback.
    pub fn display_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_REQUEST_FAILURE.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            Self::Transport(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", .0.display_message())]
    Transport(#[from] ApiFailure),
    #[error("Could not load itinerary.")]
    ResolutionFailure,
    /// A request of the same kind is already pending.
    #[error("a request is already in flight")]
    Busy,
    #[error("session storage failure: {0}")]
    Storage(String),
}

impl DisplayError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Itinerary, UserId},
    error::ApiErrorBody,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A number-or-string field. Stored preference records are not consistent about
/// how `budget` and `group_size` are encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseScalar {
    Number(f64),
    Text(String),
}

impl LooseScalar {
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                format!("{value:.0}")
            }
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

/// Most recent preference record stored for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<LooseScalar>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_size: Option<LooseScalar>,
}

/// Body of a generation request that reached the server. A failed generation can
/// still answer with a 2xx status, carrying an error body instead of days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Failed(ApiErrorBody),
    Generated(ItineraryPayload),
}

/// Response of itinerary generation. The days sit next to an echo of the submitted
/// preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItineraryPayload {
    #[serde(default)]
    pub itinerary: Itinerary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<LooseScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_size: Option<LooseScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
}

impl From<Itinerary> for ItineraryPayload {
    fn from(itinerary: Itinerary) -> Self {
        Self {
            itinerary,
            ..Self::default()
        }
    }
}

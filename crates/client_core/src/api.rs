//! Planner HTTP API: the trait seam consumed by the controllers and its reqwest
//! implementation.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{TripPreferences, UserId},
    error::ApiErrorBody,
    protocol::{
        GenerationResponse, ItineraryPayload, LoginRequest, LoginResponse, MessageResponse,
        PasswordResetRequest, SignupRequest, StoredPreferences,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::ApiFailure, session::SessionRecord};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SIGNUP_PATH: &str = "api/signup";
const LOGIN_PATH: &str = "api/login";
const PASSWORD_RESET_PATH: &str = "api/password-reset";
const TRIP_PREFERENCES_PATH: &str = "api/trip-preferences";
const GENERATE_ITINERARY_PATH: &str = "generate-itinerary";

/// What an auth request achieved, decided by which operation succeeded rather than by
/// the wording of the server's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Registered { message: String },
    LoggedIn { session: SessionRecord, message: String },
    ResetEmailSent { message: String },
}

impl AuthOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Registered { message }
            | Self::LoggedIn { message, .. }
            | Self::ResetEmailSent { message } => message,
        }
    }
}

#[async_trait]
pub trait TripPlannerApi: Send + Sync {
    async fn signup(&self, request: SignupRequest) -> Result<AuthOutcome, ApiFailure>;
    async fn login(&self, request: LoginRequest) -> Result<AuthOutcome, ApiFailure>;
    async fn request_password_reset(
        &self,
        request: PasswordResetRequest,
    ) -> Result<AuthOutcome, ApiFailure>;
    /// `Ok(None)` when the user has no stored record.
    async fn fetch_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<StoredPreferences>, ApiFailure>;
    async fn generate_itinerary(
        &self,
        preferences: &TripPreferences,
    ) -> Result<ItineraryPayload, ApiFailure>;
    async fn fetch_itinerary(
        &self,
        user_id: Option<UserId>,
    ) -> Result<ItineraryPayload, ApiFailure>;
}

pub struct HttpTripPlannerApi {
    http: Client,
    base_url: Url,
}

impl HttpTripPlannerApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiFailure> {
        self.base_url
            .join(path)
            .map_err(|err| ApiFailure::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiFailure>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        read_json(response).await
    }
}

pub fn normalize_base_url(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("API base URL must not be empty"));
    }
    let mut url =
        Url::parse(trimmed).with_context(|| format!("invalid API base URL '{trimmed}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "API base URL must use http or https, got '{}'",
            url.scheme()
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn read_json<R: DeserializeOwned>(response: Response) -> Result<R, ApiFailure> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(ApiErrorBody::into_text);
        return Err(ApiFailure::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<R>()
        .await
        .map_err(|err| ApiFailure::Decode(err.to_string()))
}

#[async_trait]
impl TripPlannerApi for HttpTripPlannerApi {
    async fn signup(&self, request: SignupRequest) -> Result<AuthOutcome, ApiFailure> {
        let body: MessageResponse = self.post_json(SIGNUP_PATH, &request).await?;
        Ok(AuthOutcome::Registered {
            message: body.message,
        })
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthOutcome, ApiFailure> {
        let body: LoginResponse = self.post_json(LOGIN_PATH, &request).await?;
        Ok(AuthOutcome::LoggedIn {
            session: SessionRecord {
                token: body.token,
                user_id: body.user_id,
                username: body.username,
            },
            message: body.message,
        })
    }

    async fn request_password_reset(
        &self,
        request: PasswordResetRequest,
    ) -> Result<AuthOutcome, ApiFailure> {
        let body: MessageResponse = self.post_json(PASSWORD_RESET_PATH, &request).await?;
        Ok(AuthOutcome::ResetEmailSent {
            message: body.message,
        })
    }

    async fn fetch_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<StoredPreferences>, ApiFailure> {
        let url = self.endpoint(&format!("{TRIP_PREFERENCES_PATH}/{}", user_id.0))?;
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        match read_json::<StoredPreferences>(response).await {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn generate_itinerary(
        &self,
        preferences: &TripPreferences,
    ) -> Result<ItineraryPayload, ApiFailure> {
        let url = self.endpoint(GENERATE_ITINERARY_PATH)?;
        debug!(%url, "POST");
        let response = self.http.post(url).json(preferences).send().await?;
        let status = response.status().as_u16();
        match read_json::<GenerationResponse>(response).await? {
            GenerationResponse::Generated(payload) => Ok(payload),
            GenerationResponse::Failed(body) => {
                warn!(
                    status,
                    error = %body.error,
                    detail = body.message.as_deref().unwrap_or_default(),
                    "itinerary generation reported a failure"
                );
                Err(ApiFailure::Status {
                    status,
                    message: body.into_text(),
                })
            }
        }
    }

    async fn fetch_itinerary(
        &self,
        user_id: Option<UserId>,
    ) -> Result<ItineraryPayload, ApiFailure> {
        let url = self.endpoint(GENERATE_ITINERARY_PATH)?;
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if let Some(user_id) = user_id {
            request = request.query(&[("user_id", user_id.0)]);
        }
        let response = request.send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;

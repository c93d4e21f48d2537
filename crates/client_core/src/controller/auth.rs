//! Auth form: mode switching, request construction and outcome handling.

use shared::{
    domain::{AuthMode, CredentialField, Credentials},
    protocol::{LoginRequest, PasswordResetRequest, SignupRequest},
};
use tracing::{debug, info, warn};

use crate::{
    api::{AuthOutcome, TripPlannerApi},
    error::{ApiFailure, DisplayError, ValidationError},
    navigation::Navigation,
    session::{Session, SessionRecord},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Signup(SignupRequest),
    Login(LoginRequest),
    ResetRequest(PasswordResetRequest),
}

impl AuthRequest {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Signup(_) => AuthMode::Signup,
            Self::Login(_) => AuthMode::Login,
            Self::ResetRequest(_) => AuthMode::ResetRequest,
        }
    }

    pub async fn send(self, api: &dyn TripPlannerApi) -> Result<AuthOutcome, ApiFailure> {
        match self {
            Self::Signup(request) => api.signup(request).await,
            Self::Login(request) => api.login(request).await,
            Self::ResetRequest(request) => api.request_password_reset(request).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFollowUp {
    ModeSwitched(AuthMode),
    /// The caller persists the record and navigates to the preference screen.
    LoggedIn(SessionRecord),
}

/// Result of a complete submission: the token that was stored, and where to go next.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSubmitted {
    pub token: Option<String>,
    pub navigate: Option<Navigation>,
}

#[derive(Debug, Default)]
pub struct AuthModeController {
    mode: AuthMode,
    credentials: Credentials,
    in_flight: bool,
    error_message: Option<String>,
    info_message: Option<String>,
}

impl AuthModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn info_message(&self) -> Option<&str> {
        self.info_message.as_deref()
    }

    /// Every switch starts from a blank form, including a switch to the current mode.
    pub fn switch_mode(&mut self, mode: AuthMode) {
        debug!(from = ?self.mode, to = ?mode, "auth mode switch");
        self.mode = mode;
        self.credentials = Credentials::default();
        self.error_message = None;
        self.info_message = None;
    }

    pub fn set_field(&mut self, field: CredentialField, value: impl Into<String>) {
        *self.credentials.field_mut(field) = value.into();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.credentials.missing_fields(self.mode).is_empty() {
            return Ok(());
        }
        Err(match self.mode {
            AuthMode::Login => ValidationError::MissingLoginFields,
            AuthMode::Signup | AuthMode::ResetRequest => ValidationError::MissingFields,
        })
    }

    fn build_request(&self) -> AuthRequest {
        let creds = &self.credentials;
        match self.mode {
            AuthMode::Signup => AuthRequest::Signup(SignupRequest {
                username: creds.username.trim().to_string(),
                email: creds.email.trim().to_string(),
                phone: creds.phone.trim().to_string(),
                password: creds.password.clone(),
            }),
            AuthMode::Login => AuthRequest::Login(LoginRequest {
                email: creds.email.trim().to_string(),
                password: creds.password.clone(),
            }),
            AuthMode::ResetRequest => AuthRequest::ResetRequest(PasswordResetRequest {
                email: creds.email.trim().to_string(),
            }),
        }
    }

    /// Validates the form and marks a request as in flight. While one is pending this
    /// returns [`DisplayError::Busy`] and leaves all state untouched.
    pub fn begin_submit(&mut self) -> Result<AuthRequest, DisplayError> {
        if self.in_flight {
            debug!(mode = ?self.mode, "auth submit ignored: request in flight");
            return Err(DisplayError::Busy);
        }

        if let Err(err) = self.validate() {
            self.error_message = Some(err.to_string());
            return Err(err.into());
        }

        let request = self.build_request();
        self.in_flight = true;
        self.error_message = None;
        self.info_message = None;
        info!(mode = ?self.mode, "auth request dispatched");
        Ok(request)
    }

    pub fn complete(
        &mut self,
        result: Result<AuthOutcome, ApiFailure>,
    ) -> Result<AuthFollowUp, DisplayError> {
        self.in_flight = false;
        match result {
            Ok(AuthOutcome::Registered { message }) => {
                info!("signup succeeded");
                self.switch_mode(AuthMode::Login);
                self.info_message = Some(message).filter(|m| !m.is_empty());
                Ok(AuthFollowUp::ModeSwitched(AuthMode::Login))
            }
            Ok(AuthOutcome::ResetEmailSent { message }) => {
                info!("password reset requested");
                self.switch_mode(AuthMode::Login);
                self.info_message = Some(message).filter(|m| !m.is_empty());
                Ok(AuthFollowUp::ModeSwitched(AuthMode::Login))
            }
            Ok(AuthOutcome::LoggedIn { session, .. }) => {
                info!(user_id = ?session.user_id, "login succeeded");
                Ok(AuthFollowUp::LoggedIn(session))
            }
            Err(failure) => {
                warn!(mode = ?self.mode, "auth request failed: {failure}");
                self.error_message = Some(failure.display_message());
                Err(failure.into())
            }
        }
    }

    /// Runs one full submission against `api`, persisting the session on login.
    pub async fn submit(
        &mut self,
        api: &dyn TripPlannerApi,
        session: &mut Session,
    ) -> Result<AuthSubmitted, DisplayError> {
        let request = self.begin_submit()?;
        let result = request.send(api).await;
        match self.complete(result)? {
            AuthFollowUp::ModeSwitched(_) => Ok(AuthSubmitted {
                token: None,
                navigate: None,
            }),
            AuthFollowUp::LoggedIn(record) => {
                let token = record.token.clone();
                self.persist(session, record)?;
                Ok(AuthSubmitted {
                    token,
                    navigate: Some(Navigation::Preferences),
                })
            }
        }
    }

    pub fn persist(
        &mut self,
        session: &mut Session,
        record: SessionRecord,
    ) -> Result<(), DisplayError> {
        session.establish(record).map_err(|err| {
            warn!("failed to persist session: {err:#}");
            let err = DisplayError::Storage(err.to_string());
            self.error_message = Some(err.to_string());
            err
        })
    }
}

#[cfg(test)]
#[path = "../tests/auth_tests.rs"]
mod tests;

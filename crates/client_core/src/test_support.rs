use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use shared::{
    domain::{Coordinate, DayPlan, DaySegment, Itinerary, TripPreferences, UserId},
    protocol::{
        ItineraryPayload, LoginRequest, PasswordResetRequest, SignupRequest, StoredPreferences,
    },
};

use crate::{
    api::{AuthOutcome, TripPlannerApi},
    error::ApiFailure,
    session::SessionRecord,
};

pub const SIGNUP: &str = "signup";
pub const LOGIN: &str = "login";
pub const RESET: &str = "reset";
pub const FETCH_PREFERENCES: &str = "fetch_preferences";
pub const GENERATE: &str = "generate";
pub const FETCH_ITINERARY: &str = "fetch_itinerary";

pub fn logged_in_record() -> SessionRecord {
    SessionRecord {
        token: Some("tok-1".into()),
        user_id: Some(UserId(7)),
        username: Some("asha".into()),
    }
}

pub fn located_day(day: u32, label: &str, lat: f64, lng: f64) -> DayPlan {
    DayPlan::new(day).with_segment(
        DaySegment::Morning,
        label,
        Some(Coordinate::new(lat, lng)),
    )
}

pub fn unlocated_day(day: u32) -> DayPlan {
    DayPlan::new(day)
        .with_segment(DaySegment::Morning, format!("Day {day} walk"), None)
        .with_segment(DaySegment::Evening, format!("Day {day} dinner"), None)
}

/// Four days where only day 1 carries a location.
pub fn four_day_itinerary() -> Itinerary {
    Itinerary(vec![
        located_day(1, "Amber Fort", 26.9855, 75.8513),
        unlocated_day(2),
        unlocated_day(3),
        unlocated_day(4),
    ])
}

pub fn payload(itinerary: Itinerary) -> ItineraryPayload {
    ItineraryPayload::from(itinerary)
}

/// Scripted API. Each operation returns a clone of its configured result and every
/// call is counted.
pub struct FakeApi {
    signup: Result<AuthOutcome, ApiFailure>,
    login: Result<AuthOutcome, ApiFailure>,
    reset: Result<AuthOutcome, ApiFailure>,
    preferences: Result<Option<StoredPreferences>, ApiFailure>,
    generate: Result<ItineraryPayload, ApiFailure>,
    fetch: Result<ItineraryPayload, ApiFailure>,
    calls: Mutex<HashMap<&'static str, usize>>,
    generated_for: Mutex<Vec<TripPreferences>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            signup: Ok(AuthOutcome::Registered {
                message: "User registered successfully!".into(),
            }),
            login: Ok(AuthOutcome::LoggedIn {
                session: logged_in_record(),
                message: "Login successful!".into(),
            }),
            reset: Ok(AuthOutcome::ResetEmailSent {
                message: "Password reset email sent successfully!".into(),
            }),
            preferences: Ok(None),
            generate: Ok(payload(Itinerary(vec![
                located_day(1, "Visit Museum", 12.97, 77.59),
                located_day(2, "Hike in Park", 12.95, 77.60),
            ]))),
            fetch: Ok(payload(four_day_itinerary())),
            calls: Mutex::new(HashMap::new()),
            generated_for: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signup(mut self, result: Result<AuthOutcome, ApiFailure>) -> Self {
        self.signup = result;
        self
    }

    pub fn with_login(mut self, result: Result<AuthOutcome, ApiFailure>) -> Self {
        self.login = result;
        self
    }

    pub fn with_preferences(
        mut self,
        result: Result<Option<StoredPreferences>, ApiFailure>,
    ) -> Self {
        self.preferences = result;
        self
    }

    pub fn with_generate(mut self, result: Result<ItineraryPayload, ApiFailure>) -> Self {
        self.generate = result;
        self
    }

    pub fn with_fetch(mut self, result: Result<ItineraryPayload, ApiFailure>) -> Self {
        self.fetch = result;
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls lock").values().sum()
    }

    pub fn generated_for(&self) -> Vec<TripPreferences> {
        self.generated_for.lock().expect("generated lock").clone()
    }

    fn record(&self, operation: &'static str) {
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(operation)
            .or_default() += 1;
    }
}

#[async_trait]
impl TripPlannerApi for FakeApi {
    async fn signup(&self, _request: SignupRequest) -> Result<AuthOutcome, ApiFailure> {
        self.record(SIGNUP);
        self.signup.clone()
    }

    async fn login(&self, _request: LoginRequest) -> Result<AuthOutcome, ApiFailure> {
        self.record(LOGIN);
        self.login.clone()
    }

    async fn request_password_reset(
        &self,
        _request: PasswordResetRequest,
    ) -> Result<AuthOutcome, ApiFailure> {
        self.record(RESET);
        self.reset.clone()
    }

    async fn fetch_preferences(
        &self,
        _user_id: UserId,
    ) -> Result<Option<StoredPreferences>, ApiFailure> {
        self.record(FETCH_PREFERENCES);
        self.preferences.clone()
    }

    async fn generate_itinerary(
        &self,
        preferences: &TripPreferences,
    ) -> Result<ItineraryPayload, ApiFailure> {
        self.record(GENERATE);
        self.generated_for
            .lock()
            .expect("generated lock")
            .push(preferences.clone());
        self.generate.clone()
    }

    async fn fetch_itinerary(
        &self,
        _user_id: Option<UserId>,
    ) -> Result<ItineraryPayload, ApiFailure> {
        self.record(FETCH_ITINERARY);
        self.fetch.clone()
    }
}

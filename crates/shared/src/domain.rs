use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ParseDomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Signup,
    Login,
    ResetRequest,
}

impl AuthMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Signup => "Sign Up",
            Self::Login => "Login",
            Self::ResetRequest => "Reset Password",
        }
    }
}

/// Raw auth form values. Every field is kept as typed by the user; which ones are
/// required depends on the active [`AuthMode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Collected by the reset form but never sent; no completion endpoint exists yet.
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Username,
    Email,
    Phone,
    Password,
    NewPassword,
}

impl Credentials {
    pub fn field_mut(&mut self, field: CredentialField) -> &mut String {
        match field {
            CredentialField::Username => &mut self.username,
            CredentialField::Email => &mut self.email,
            CredentialField::Phone => &mut self.phone,
            CredentialField::Password => &mut self.password,
            CredentialField::NewPassword => &mut self.new_password,
        }
    }

    pub fn required_fields(mode: AuthMode) -> &'static [CredentialField] {
        match mode {
            AuthMode::Signup => &[
                CredentialField::Username,
                CredentialField::Email,
                CredentialField::Phone,
                CredentialField::Password,
            ],
            AuthMode::Login => &[CredentialField::Email, CredentialField::Password],
            AuthMode::ResetRequest => &[CredentialField::Email],
        }
    }

    pub fn value(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::Username => &self.username,
            CredentialField::Email => &self.email,
            CredentialField::Phone => &self.phone,
            CredentialField::Password => &self.password,
            CredentialField::NewPassword => &self.new_password,
        }
    }

    pub fn missing_fields(&self, mode: AuthMode) -> Vec<CredentialField> {
        Self::required_fields(mode)
            .iter()
            .copied()
            .filter(|field| self.value(*field).trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    Hiking,
    Beach,
    #[serde(rename = "City Tour")]
    CityTour,
    Adventure,
    Relaxation,
}

impl Activity {
    pub const CATALOG: [Activity; 5] = [
        Activity::Hiking,
        Activity::Beach,
        Activity::CityTour,
        Activity::Adventure,
        Activity::Relaxation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hiking => "Hiking",
            Self::Beach => "Beach",
            Self::CityTour => "City Tour",
            Self::Adventure => "Adventure",
            Self::Relaxation => "Relaxation",
        }
    }
}

impl FromStr for Activity {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::CATALOG
            .into_iter()
            .find(|activity| activity.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseDomainError::UnknownActivity(wanted.to_string()))
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupSize {
    #[serde(rename = "1")]
    Solo,
    #[serde(rename = "2")]
    Pair,
    #[serde(rename = "3-5")]
    Small,
    #[serde(rename = "6+")]
    Large,
}

impl GroupSize {
    pub const ALL: [GroupSize; 4] = [
        GroupSize::Solo,
        GroupSize::Pair,
        GroupSize::Small,
        GroupSize::Large,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solo => "1",
            Self::Pair => "2",
            Self::Small => "3-5",
            Self::Large => "6+",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Solo => "1 Person",
            Self::Pair => "2 People",
            Self::Small => "3-5 People",
            Self::Large => "6+ People",
        }
    }
}

impl FromStr for GroupSize {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == wanted)
            .ok_or_else(|| ParseDomainError::UnknownGroupSize(wanted.to_string()))
    }
}

impl fmt::Display for GroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully validated preference submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    pub user_id: UserId,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "budget")]
    pub budget_inr: f64,
    pub activities: BTreeSet<Activity>,
    pub group_size: GroupSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaySegment {
    Morning,
    Afternoon,
    Evening,
}

impl DaySegment {
    pub const ALL: [DaySegment; 3] = [
        DaySegment::Morning,
        DaySegment::Afternoon,
        DaySegment::Evening,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<String>,
    #[serde(
        default,
        alias = "morningLocation",
        skip_serializing_if = "Option::is_none"
    )]
    pub morning_location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon: Option<String>,
    #[serde(
        default,
        alias = "afternoonLocation",
        skip_serializing_if = "Option::is_none"
    )]
    pub afternoon_location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<String>,
    #[serde(
        default,
        alias = "eveningLocation",
        skip_serializing_if = "Option::is_none"
    )]
    pub evening_location: Option<Coordinate>,
}

impl DayPlan {
    pub fn new(day: u32) -> Self {
        Self {
            day,
            morning: None,
            morning_location: None,
            afternoon: None,
            afternoon_location: None,
            evening: None,
            evening_location: None,
        }
    }

    pub fn with_segment(
        mut self,
        segment: DaySegment,
        label: impl Into<String>,
        location: Option<Coordinate>,
    ) -> Self {
        let label = Some(label.into());
        match segment {
            DaySegment::Morning => {
                self.morning = label;
                self.morning_location = location;
            }
            DaySegment::Afternoon => {
                self.afternoon = label;
                self.afternoon_location = location;
            }
            DaySegment::Evening => {
                self.evening = label;
                self.evening_location = location;
            }
        }
        self
    }

    pub fn label(&self, segment: DaySegment) -> Option<&str> {
        match segment {
            DaySegment::Morning => self.morning.as_deref(),
            DaySegment::Afternoon => self.afternoon.as_deref(),
            DaySegment::Evening => self.evening.as_deref(),
        }
        .filter(|label| !label.trim().is_empty())
    }

    pub fn location(&self, segment: DaySegment) -> Option<Coordinate> {
        match segment {
            DaySegment::Morning => self.morning_location,
            DaySegment::Afternoon => self.afternoon_location,
            DaySegment::Evening => self.evening_location,
        }
    }
}

/// Days in delivery order. Order is never changed to follow `day` numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Itinerary(pub Vec<DayPlan>);

impl Itinerary {
    pub fn days(&self) -> &[DayPlan] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<DayPlan>> for Itinerary {
    fn from(days: Vec<DayPlan>) -> Self {
        Self(days)
    }
}

//! Trip-preference form and itinerary-generation submission.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use shared::{
    domain::{Activity, GroupSize, TripPreferences, UserId},
    protocol::{ItineraryPayload, StoredPreferences},
};
use tracing::{debug, info, warn};

use crate::{
    api::TripPlannerApi,
    error::{ApiFailure, DisplayError, ValidationError},
};

/// Used when no session user id is known.
pub const DEFAULT_USER_ID: UserId = UserId(1);

pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), FORM_DATE_FORMAT).ok()
}

/// Form values as entered. Budget stays text until submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceForm {
    pub destination: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: String,
    pub activities: BTreeSet<Activity>,
    pub group_size: Option<GroupSize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceEdit {
    Destination(String),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
    Budget(String),
    ToggleActivity(Activity),
    SetActivity(Activity, bool),
    GroupSize(Option<GroupSize>),
}

#[derive(Debug)]
pub struct PreferenceSubmissionController {
    user_id: UserId,
    form: PreferenceForm,
    edited: bool,
    in_flight: bool,
    error_message: Option<String>,
}

impl PreferenceSubmissionController {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            form: PreferenceForm::default(),
            edited: false,
            in_flight: false,
            error_message: None,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn form(&self) -> &PreferenceForm {
        &self.form
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns `false` when the edit was rejected because a submission is pending.
    pub fn edit(&mut self, edit: PreferenceEdit) -> bool {
        if self.in_flight {
            debug!("preference edit ignored while submitting");
            return false;
        }

        let form = &mut self.form;
        match edit {
            PreferenceEdit::Destination(value) => form.destination = value,
            PreferenceEdit::StartDate(value) => form.start_date = value,
            PreferenceEdit::EndDate(value) => form.end_date = value,
            PreferenceEdit::Budget(value) => form.budget = value,
            PreferenceEdit::ToggleActivity(activity) => {
                if !form.activities.remove(&activity) {
                    form.activities.insert(activity);
                }
            }
            PreferenceEdit::SetActivity(activity, true) => {
                form.activities.insert(activity);
            }
            PreferenceEdit::SetActivity(activity, false) => {
                form.activities.remove(&activity);
            }
            PreferenceEdit::GroupSize(value) => form.group_size = value,
        }
        self.edited = true;
        true
    }

    /// Seeds the form from a stored record unless the user has already started
    /// editing. Values that do not parse are skipped.
    pub fn apply_prior(&mut self, record: &StoredPreferences) -> bool {
        if self.edited || self.in_flight {
            debug!("stored preferences arrived after user edits; not applied");
            return false;
        }

        let form = &mut self.form;
        if let Some(destination) = record.destination.as_deref() {
            form.destination = destination.trim().to_string();
        }
        form.start_date = record.start_date.as_deref().and_then(parse_form_date);
        form.end_date = record.end_date.as_deref().and_then(parse_form_date);
        if let Some(budget) = &record.budget {
            form.budget = budget.as_text();
        }
        form.activities = record
            .activities
            .iter()
            .filter_map(|raw| match raw.parse::<Activity>() {
                Ok(activity) => Some(activity),
                Err(err) => {
                    debug!("skipping stored activity: {err}");
                    None
                }
            })
            .collect();
        form.group_size = record
            .group_size
            .as_ref()
            .and_then(|size| size.as_text().parse().ok());

        info!(user_id = %self.user_id, "preference form seeded from stored record");
        true
    }

    pub fn validate(&self) -> Result<TripPreferences, ValidationError> {
        let form = &self.form;
        let destination = form.destination.trim();
        let budget = form.budget.trim();
        let (Some(start_date), Some(end_date), Some(group_size)) =
            (form.start_date, form.end_date, form.group_size)
        else {
            return Err(ValidationError::MissingFields);
        };
        if destination.is_empty() || budget.is_empty() || form.activities.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let budget_inr = budget
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or(ValidationError::NonPositiveBudget)?;
        if end_date < start_date {
            return Err(ValidationError::EndBeforeStart);
        }

        Ok(TripPreferences {
            user_id: self.user_id,
            destination: destination.to_string(),
            start_date,
            end_date,
            budget_inr,
            activities: form.activities.clone(),
            group_size,
        })
    }

    pub fn begin_submit(&mut self) -> Result<TripPreferences, DisplayError> {
        if self.in_flight {
            debug!("preference submit ignored: request in flight");
            return Err(DisplayError::Busy);
        }

        let preferences = self.validate().map_err(|err| {
            self.error_message = Some(err.to_string());
            DisplayError::from(err)
        })?;

        self.in_flight = true;
        self.error_message = None;
        info!(
            user_id = %preferences.user_id,
            destination = %preferences.destination,
            "itinerary generation requested"
        );
        Ok(preferences)
    }

    /// The form is left as it was, so a failed attempt can be resubmitted.
    pub fn complete(
        &mut self,
        result: Result<ItineraryPayload, ApiFailure>,
    ) -> Result<ItineraryPayload, DisplayError> {
        self.in_flight = false;
        match result {
            Ok(payload) => {
                info!(days = payload.itinerary.len(), "itinerary generated");
                Ok(payload)
            }
            Err(failure) => {
                warn!("itinerary generation failed: {failure}");
                self.error_message = Some(failure.display_message());
                Err(failure.into())
            }
        }
    }

    pub async fn submit(
        &mut self,
        api: &dyn TripPlannerApi,
    ) -> Result<ItineraryPayload, DisplayError> {
        let preferences = self.begin_submit()?;
        let result = api.generate_itinerary(&preferences).await;
        self.complete(result)
    }
}

#[cfg(test)]
#[path = "../tests/preferences_tests.rs"]
mod tests;

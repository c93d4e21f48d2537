pub mod api;
pub mod controller;
pub mod error;
pub mod navigation;
pub mod reveal;
pub mod runtime;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{AuthOutcome, HttpTripPlannerApi, TripPlannerApi};
pub use controller::{
    auth::AuthModeController,
    itinerary::{ItineraryPresentationController, MapMarker},
    preferences::PreferenceSubmissionController,
};
pub use error::{ApiFailure, DisplayError, ValidationError};
pub use navigation::{Navigation, Screen};
pub use runtime::{PlannerRuntime, RuntimeConfig, UiAction, Update};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionRecord, SessionStore};

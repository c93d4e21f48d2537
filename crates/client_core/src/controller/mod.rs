//! Controller layer: one state machine per screen. Controllers never perform I/O on
//! their own; they hand requests out and take completions back, which keeps them
//! drivable from tests and from [`crate::runtime::PlannerRuntime`] alike.

pub mod auth;
pub mod itinerary;
pub mod preferences;

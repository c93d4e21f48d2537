//! Itinerary presentation: resolves the itinerary once per mount, then reveals it one
//! day at a time and exposes the map markers of the visible days.

use std::time::Duration;

use shared::{
    domain::{Coordinate, DayPlan, DaySegment, Itinerary},
    protocol::ItineraryPayload,
};
use tracing::{debug, info, warn};

use crate::error::{ApiFailure, ITINERARY_UNAVAILABLE};

pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(300);

/// Where the itinerary for this mount comes from. Decided once, at entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ItinerarySource {
    Provided(Itinerary),
    Fetch,
}

impl ItinerarySource {
    /// A forwarded payload only counts when it carries at least one day.
    pub fn from_forwarded(forwarded: Option<ItineraryPayload>) -> Self {
        match forwarded {
            Some(payload) if !payload.itinerary.is_empty() => Self::Provided(payload.itinerary),
            _ => Self::Fetch,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    AwaitingSource,
    Resolving,
    Resolved(Itinerary),
    ResolutionFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// Number of days visible so far.
    Revealing(usize),
    FullyRevealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealPlan {
    pub epoch: u64,
    pub steps: usize,
    pub interval: Duration,
}

/// Work the owner of the controller has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItineraryEffect {
    Fetch,
    ScheduleReveal(RevealPlan),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub day: u32,
    pub day_index: usize,
    pub segment: DaySegment,
    pub label: String,
    pub coordinate: Coordinate,
}

#[derive(Debug)]
pub struct ItineraryPresentationController {
    interval: Duration,
    resolution: Resolution,
    revealed: usize,
    map_center: Option<Coordinate>,
    epoch: u64,
    torn_down: bool,
}

impl Default for ItineraryPresentationController {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_INTERVAL)
    }
}

impl ItineraryPresentationController {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            resolution: Resolution::AwaitingSource,
            revealed: 0,
            map_center: None,
            epoch: 0,
            torn_down: false,
        }
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn map_center(&self) -> Option<Coordinate> {
        self.map_center
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn error_text(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::ResolutionFailed(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// `None` until an itinerary has been resolved.
    pub fn reveal_phase(&self) -> Option<RevealPhase> {
        let Resolution::Resolved(itinerary) = &self.resolution else {
            return None;
        };
        if self.revealed < itinerary.len() {
            Some(RevealPhase::Revealing(self.revealed))
        } else {
            Some(RevealPhase::FullyRevealed)
        }
    }

    pub fn is_revealing(&self) -> bool {
        !self.torn_down && matches!(self.reveal_phase(), Some(RevealPhase::Revealing(_)))
    }

    pub fn visible_days(&self) -> &[DayPlan] {
        match &self.resolution {
            Resolution::Resolved(itinerary) => &itinerary.days()[..self.revealed],
            _ => &[],
        }
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        self.visible_days()
            .iter()
            .enumerate()
            .flat_map(|(day_index, day)| {
                DaySegment::ALL.into_iter().filter_map(move |segment| {
                    let label = day.label(segment)?;
                    let coordinate = day.location(segment)?;
                    Some(MapMarker {
                        day: day.day,
                        day_index,
                        segment,
                        label: label.to_string(),
                        coordinate,
                    })
                })
            })
            .collect()
    }

    /// Only the first call per mount does anything.
    pub fn enter(&mut self, source: ItinerarySource) -> Option<ItineraryEffect> {
        if self.torn_down || self.resolution != Resolution::AwaitingSource {
            debug!("itinerary source already chosen for this mount");
            return None;
        }

        match source {
            ItinerarySource::Provided(itinerary) => {
                debug!(days = itinerary.len(), "using forwarded itinerary");
                self.observe(itinerary)
            }
            ItinerarySource::Fetch => {
                info!("no forwarded itinerary; fetching");
                self.resolution = Resolution::Resolving;
                Some(ItineraryEffect::Fetch)
            }
        }
    }

    pub fn on_fetched(
        &mut self,
        result: Result<ItineraryPayload, ApiFailure>,
    ) -> Option<ItineraryEffect> {
        if self.torn_down || self.resolution != Resolution::Resolving {
            debug!("itinerary fetch completion ignored");
            return None;
        }

        match result {
            Ok(payload) => self.observe(payload.itinerary),
            Err(failure) => {
                warn!("itinerary fetch failed: {failure}");
                self.resolution = Resolution::ResolutionFailed(ITINERARY_UNAVAILABLE.to_string());
                None
            }
        }
    }

    /// Installs `itinerary` as the resolved value. Observing the value already shown
    /// changes nothing; a different value restarts the reveal under a new epoch.
    pub fn observe(&mut self, itinerary: Itinerary) -> Option<ItineraryEffect> {
        if self.torn_down {
            return None;
        }
        if matches!(&self.resolution, Resolution::Resolved(current) if *current == itinerary) {
            debug!("same itinerary observed again");
            return None;
        }

        self.epoch += 1;
        self.revealed = 0;
        self.map_center = itinerary
            .days()
            .first()
            .and_then(|day| day.location(DaySegment::Morning));
        let steps = itinerary.len();
        info!(days = steps, epoch = self.epoch, "itinerary resolved");
        self.resolution = Resolution::Resolved(itinerary);

        if steps == 0 {
            return None;
        }
        Some(ItineraryEffect::ScheduleReveal(RevealPlan {
            epoch: self.epoch,
            steps,
            interval: self.interval,
        }))
    }

    /// Returns `true` when the tick revealed a day.
    pub fn on_reveal_tick(&mut self, epoch: u64) -> bool {
        if self.torn_down || epoch != self.epoch {
            debug!(epoch, current = self.epoch, "stale reveal tick");
            return false;
        }
        let Resolution::Resolved(itinerary) = &self.resolution else {
            return false;
        };
        if self.revealed >= itinerary.len() {
            return false;
        }

        self.revealed += 1;
        debug!(visible = self.revealed, total = itinerary.len(), "day revealed");
        true
    }

    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.epoch += 1;
        debug!(epoch = self.epoch, "itinerary screen torn down");
    }
}

#[cfg(test)]
#[path = "../tests/itinerary_tests.rs"]
mod tests;

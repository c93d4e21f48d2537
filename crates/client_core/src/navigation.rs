use shared::protocol::ItineraryPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Auth,
    Preferences,
    Itinerary,
}

/// A navigation request. The itinerary screen may be handed the generated payload
/// directly; without one it fetches for itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Auth,
    Preferences,
    Itinerary { forwarded: Option<ItineraryPayload> },
}

impl Navigation {
    pub fn screen(&self) -> Screen {
        match self {
            Self::Auth => Screen::Auth,
            Self::Preferences => Screen::Preferences,
            Self::Itinerary { .. } => Screen::Itinerary,
        }
    }
}

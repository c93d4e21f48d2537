//! Event loop owning every controller. User input is applied synchronously through
//! [`PlannerRuntime::dispatch`]; network completions and reveal ticks come back as
//! events and are applied one at a time by [`PlannerRuntime::step`].

use std::{future::Future, sync::Arc, time::Duration};

use shared::{
    domain::{AuthMode, CredentialField},
    protocol::{ItineraryPayload, StoredPreferences},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    api::{AuthOutcome, TripPlannerApi},
    controller::{
        auth::{AuthFollowUp, AuthModeController},
        itinerary::{
            ItineraryEffect, ItineraryPresentationController, ItinerarySource, Resolution,
            DEFAULT_REVEAL_INTERVAL,
        },
        preferences::{PreferenceEdit, PreferenceSubmissionController, DEFAULT_USER_ID},
    },
    error::{ApiFailure, DisplayError},
    navigation::{Navigation, Screen},
    reveal::RevealScheduler,
    session::Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub reveal_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SwitchAuthMode(AuthMode),
    EditCredential(CredentialField, String),
    SubmitAuth,
    EditPreferences(PreferenceEdit),
    SubmitPreferences,
    Navigate(Navigation),
    Logout,
}

/// What changed after an action or event was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    AuthModeSwitched(AuthMode),
    Edited,
    RequestStarted,
    Navigated(Screen),
    PreferencesPrefilled,
    ItineraryResolved { days: usize },
    ItineraryFailed(String),
    /// Zero-based index of the day that just became visible.
    DayRevealed { index: usize },
    Rejected(DisplayError),
    Ignored,
}

#[derive(Debug)]
enum AppEvent {
    AuthCompleted {
        mount: u64,
        result: Result<AuthOutcome, ApiFailure>,
    },
    PriorPreferencesLoaded {
        mount: u64,
        result: Result<Option<StoredPreferences>, ApiFailure>,
    },
    ItineraryGenerated {
        mount: u64,
        result: Result<ItineraryPayload, ApiFailure>,
    },
    ItineraryFetched {
        mount: u64,
        result: Result<ItineraryPayload, ApiFailure>,
    },
    RevealTick {
        mount: u64,
        epoch: u64,
    },
}

pub struct PlannerRuntime {
    api: Arc<dyn TripPlannerApi>,
    session: Session,
    config: RuntimeConfig,
    screen: Screen,
    /// Bumped on every navigation; events carry the mount they were issued for.
    mount: u64,
    auth: AuthModeController,
    preferences: Option<PreferenceSubmissionController>,
    itinerary: Option<ItineraryPresentationController>,
    reveal: RevealScheduler,
    outstanding: usize,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl PlannerRuntime {
    /// Starts on the auth screen.
    pub fn new(api: Arc<dyn TripPlannerApi>, session: Session, config: RuntimeConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            session,
            config,
            screen: Screen::Auth,
            mount: 0,
            auth: AuthModeController::new(),
            preferences: None,
            itinerary: None,
            reveal: RevealScheduler::new(),
            outstanding: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth(&self) -> &AuthModeController {
        &self.auth
    }

    pub fn preferences(&self) -> Option<&PreferenceSubmissionController> {
        self.preferences.as_ref()
    }

    pub fn itinerary(&self) -> Option<&ItineraryPresentationController> {
        self.itinerary.as_ref()
    }

    /// No request outstanding and no day left to reveal.
    pub fn is_settled(&self) -> bool {
        self.outstanding == 0
            && !self
                .itinerary
                .as_ref()
                .is_some_and(ItineraryPresentationController::is_revealing)
    }

    pub fn dispatch(&mut self, action: UiAction) -> Update {
        match action {
            UiAction::SwitchAuthMode(mode) => {
                if self.screen != Screen::Auth {
                    return Update::Ignored;
                }
                if self.auth.is_in_flight() {
                    return Update::Rejected(DisplayError::Busy);
                }
                self.auth.switch_mode(mode);
                Update::AuthModeSwitched(mode)
            }
            UiAction::EditCredential(field, value) => {
                if self.screen != Screen::Auth {
                    return Update::Ignored;
                }
                self.auth.set_field(field, value);
                Update::Edited
            }
            UiAction::SubmitAuth => self.submit_auth(),
            UiAction::EditPreferences(edit) => {
                let Some(form) = self.preferences.as_mut() else {
                    return Update::Ignored;
                };
                if form.edit(edit) {
                    Update::Edited
                } else {
                    Update::Rejected(DisplayError::Busy)
                }
            }
            UiAction::SubmitPreferences => self.submit_preferences(),
            UiAction::Navigate(navigation) => self.navigate(navigation),
            UiAction::Logout => {
                if let Err(err) = self.session.logout() {
                    warn!("failed to clear session: {err:#}");
                    return Update::Rejected(DisplayError::Storage(err.to_string()));
                }
                info!("logged out");
                self.navigate(Navigation::Auth)
            }
        }
    }

    /// Waits for the next event and applies it. Returns `None` once settled.
    pub async fn step(&mut self) -> Option<Update> {
        if self.is_settled() {
            return None;
        }
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    pub async fn run_until_settled(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Some(update) = self.step().await {
            updates.push(update);
        }
        updates
    }

    fn submit_auth(&mut self) -> Update {
        if self.screen != Screen::Auth {
            return Update::Ignored;
        }
        let request = match self.auth.begin_submit() {
            Ok(request) => request,
            Err(err) => return Update::Rejected(err),
        };

        let api = Arc::clone(&self.api);
        self.spawn_request(
            async move { request.send(api.as_ref()).await },
            |mount, result| AppEvent::AuthCompleted { mount, result },
        );
        Update::RequestStarted
    }

    fn submit_preferences(&mut self) -> Update {
        let Some(form) = self.preferences.as_mut() else {
            return Update::Ignored;
        };
        let preferences = match form.begin_submit() {
            Ok(preferences) => preferences,
            Err(err) => return Update::Rejected(err),
        };

        let api = Arc::clone(&self.api);
        self.spawn_request(
            async move { api.generate_itinerary(&preferences).await },
            |mount, result| AppEvent::ItineraryGenerated { mount, result },
        );
        Update::RequestStarted
    }

    fn navigate(&mut self, navigation: Navigation) -> Update {
        self.teardown_current();
        self.mount += 1;
        self.screen = navigation.screen();
        info!(screen = ?self.screen, mount = self.mount, "navigated");

        match navigation {
            Navigation::Auth => self.auth = AuthModeController::new(),
            Navigation::Preferences => {
                let user_id = self.session.user_id();
                if !self.session.is_established() {
                    debug!("preference screen opened without a session");
                }
                self.preferences = Some(PreferenceSubmissionController::new(
                    user_id.unwrap_or(DEFAULT_USER_ID),
                ));
                if let Some(user_id) = user_id {
                    let api = Arc::clone(&self.api);
                    self.spawn_request(
                        async move { api.fetch_preferences(user_id).await },
                        |mount, result| AppEvent::PriorPreferencesLoaded { mount, result },
                    );
                }
            }
            Navigation::Itinerary { forwarded } => {
                let mut controller =
                    ItineraryPresentationController::new(self.config.reveal_interval);
                let effect = controller.enter(ItinerarySource::from_forwarded(forwarded));
                self.itinerary = Some(controller);
                self.apply_effect(effect);
            }
        }
        Update::Navigated(self.screen)
    }

    fn teardown_current(&mut self) {
        self.reveal.cancel();
        if let Some(mut itinerary) = self.itinerary.take() {
            itinerary.teardown();
        }
        self.preferences = None;
    }

    fn apply_effect(&mut self, effect: Option<ItineraryEffect>) {
        match effect {
            Some(ItineraryEffect::Fetch) => {
                let api = Arc::clone(&self.api);
                let user_id = self.session.user_id();
                self.spawn_request(
                    async move { api.fetch_itinerary(user_id).await },
                    |mount, result| AppEvent::ItineraryFetched { mount, result },
                );
            }
            Some(ItineraryEffect::ScheduleReveal(plan)) => {
                let mount = self.mount;
                self.reveal
                    .start(plan, self.events_tx.clone(), move |epoch| AppEvent::RevealTick {
                        mount,
                        epoch,
                    });
            }
            None => {}
        }
    }

    fn spawn_request<T, Fut, Wrap>(&mut self, request: Fut, wrap: Wrap)
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        Wrap: FnOnce(u64, T) -> AppEvent + Send + 'static,
    {
        self.outstanding += 1;
        let mount = self.mount;
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = request.await;
            let _ = events.send(wrap(mount, result));
        });
    }

    fn is_current(&self, mount: u64) -> bool {
        if mount != self.mount {
            debug!(mount, current = self.mount, "dropping event for a previous screen");
            return false;
        }
        true
    }

    fn apply(&mut self, event: AppEvent) -> Update {
        match event {
            AppEvent::AuthCompleted { mount, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if !self.is_current(mount) {
                    return Update::Ignored;
                }
                match self.auth.complete(result) {
                    Ok(AuthFollowUp::ModeSwitched(mode)) => Update::AuthModeSwitched(mode),
                    Ok(AuthFollowUp::LoggedIn(record)) => {
                        match self.auth.persist(&mut self.session, record) {
                            Ok(()) => self.navigate(Navigation::Preferences),
                            Err(err) => Update::Rejected(err),
                        }
                    }
                    Err(err) => Update::Rejected(err),
                }
            }
            AppEvent::PriorPreferencesLoaded { mount, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if !self.is_current(mount) {
                    return Update::Ignored;
                }
                let Some(form) = self.preferences.as_mut() else {
                    return Update::Ignored;
                };
                match result {
                    Ok(Some(record)) => {
                        if form.apply_prior(&record) {
                            Update::PreferencesPrefilled
                        } else {
                            Update::Ignored
                        }
                    }
                    Ok(None) => {
                        debug!("no stored preferences");
                        Update::Ignored
                    }
                    Err(failure) => {
                        warn!("could not load stored preferences: {failure}");
                        Update::Ignored
                    }
                }
            }
            AppEvent::ItineraryGenerated { mount, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if !self.is_current(mount) {
                    return Update::Ignored;
                }
                let Some(form) = self.preferences.as_mut() else {
                    return Update::Ignored;
                };
                match form.complete(result) {
                    Ok(payload) => self.navigate(Navigation::Itinerary {
                        forwarded: Some(payload),
                    }),
                    Err(err) => Update::Rejected(err),
                }
            }
            AppEvent::ItineraryFetched { mount, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if !self.is_current(mount) {
                    return Update::Ignored;
                }
                let Some(itinerary) = self.itinerary.as_mut() else {
                    return Update::Ignored;
                };
                let effect = itinerary.on_fetched(result);
                let update = match itinerary.resolution() {
                    Resolution::Resolved(resolved) => Update::ItineraryResolved {
                        days: resolved.len(),
                    },
                    Resolution::ResolutionFailed(text) => Update::ItineraryFailed(text.clone()),
                    Resolution::AwaitingSource | Resolution::Resolving => Update::Ignored,
                };
                self.apply_effect(effect);
                update
            }
            AppEvent::RevealTick { mount, epoch } => {
                if !self.is_current(mount) {
                    return Update::Ignored;
                }
                let Some(itinerary) = self.itinerary.as_mut() else {
                    return Update::Ignored;
                };
                if itinerary.on_reveal_tick(epoch) {
                    Update::DayRevealed {
                        index: itinerary.visible_days().len() - 1,
                    }
                } else {
                    Update::Ignored
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;

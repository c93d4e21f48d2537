//! Timer task behind the progressive itinerary reveal.

use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::debug;

use crate::controller::itinerary::RevealPlan;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct ActiveReveal {
    epoch: u64,
    task: JoinHandle<()>,
}

/// Runs at most one reveal task. Ticks fire at 0, 1×, 2×… the interval, each one
/// carrying the epoch it was scheduled for.
#[derive(Default)]
pub struct RevealScheduler {
    active: Option<ActiveReveal>,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any running task. Must be called from within a tokio runtime.
    pub fn start<E, F>(&mut self, plan: RevealPlan, events: UnboundedSender<E>, tick: F)
    where
        E: Send + 'static,
        F: Fn(u64) -> E + Send + 'static,
    {
        self.cancel();

        let RevealPlan {
            epoch,
            steps,
            interval,
        } = plan;
        debug!(epoch, steps, ?interval, "reveal scheduled");
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for _ in 0..steps {
                ticker.tick().await;
                if events.send(tick(epoch)).is_err() {
                    break;
                }
            }
        });
        self.active = Some(ActiveReveal { epoch, task });
    }

    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.task.is_finished() {
                debug!(epoch = active.epoch, "reveal cancelled");
            }
            active.task.abort();
        }
    }

    pub fn active_epoch(&self) -> Option<u64> {
        self.active
            .as_ref()
            .filter(|active| !active.task.is_finished())
            .map(|active| active.epoch)
    }

    pub fn is_active(&self) -> bool {
        self.active_epoch().is_some()
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/reveal_tests.rs"]
mod tests;

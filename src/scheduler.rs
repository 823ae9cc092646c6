//! Timer that drives snapshot generation.
//!
//! The scheduler is either idle or running with exactly one periodic task. Arming a new
//! interval always cancels the previous task first. Each arming gets a fresh activation
//! number; a generation only publishes if its activation is still current, so nothing a
//! cancelled timer sampled can land after [`RefreshScheduler::stop`] returns.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::RefreshInterval;
use crate::error::{DashboardError, Result};
use crate::generator::SnapshotGenerator;
use crate::snapshot::Snapshot;
use crate::state::SharedState;

/// Notifications for the rendering layer
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A new snapshot is current and history has one more point per series
    SnapshotUpdated(Arc<Snapshot>),
    /// A refresh failed; the previous snapshot and history are still current
    RefreshFailed { reason: String },
    IntervalChanged(RefreshInterval),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running(RefreshInterval),
}

struct Ticker {
    interval: RefreshInterval,
    handle: JoinHandle<()>,
}

pub struct RefreshScheduler {
    generator: Arc<Mutex<SnapshotGenerator>>,
    state: SharedState,
    events: broadcast::Sender<DashboardEvent>,
    ticker: Option<Ticker>,
}

impl RefreshScheduler {
    pub fn new(
        generator: Arc<Mutex<SnapshotGenerator>>,
        state: SharedState,
        events: broadcast::Sender<DashboardEvent>,
    ) -> Self {
        Self {
            generator,
            state,
            events,
            ticker: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.ticker {
            Some(ticker) => SchedulerState::Running(ticker.interval),
            None => SchedulerState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Arm the periodic timer. The first tick fires one full interval from now.
    /// Starting a running scheduler rearms it with `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, interval: RefreshInterval) {
        if self.disarm() {
            debug!("scheduler already running, rearming");
        }
        self.arm(interval);
        info!(interval = %interval, "refresh timer started");
    }

    /// Validate `interval_secs` and, if running, replace the timer with one at the new
    /// cadence. An invalid interval leaves the current timer untouched. While idle the
    /// scheduler stays idle.
    pub fn reconfigure(&mut self, interval_secs: u64) -> Result<RefreshInterval> {
        let interval = RefreshInterval::from_secs(interval_secs)?;
        if self.disarm() {
            self.arm(interval);
            info!(interval = %interval, "refresh timer rearmed");
        } else {
            debug!(interval = %interval, "scheduler idle, nothing to rearm");
        }
        Ok(interval)
    }

    /// Cancel the timer. No scheduled generation publishes after this returns.
    pub fn stop(&mut self) {
        if self.disarm() {
            info!("refresh timer stopped");
        }
    }

    /// Generate immediately, outside the periodic cadence and without touching the timer.
    /// Waits for an in-flight generation to finish instead of running alongside it.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>> {
        let generator = Arc::clone(&self.generator).lock_owned().await;
        let result = task::spawn_blocking(move || {
            let mut generator = generator;
            generator.generate()
        })
        .await
        .map_err(|e| DashboardError::source_unavailable(format!("refresh task failed: {}", e)))
        .and_then(|result| result);

        match &result {
            Ok(snapshot) => {
                let _ = self
                    .events
                    .send(DashboardEvent::SnapshotUpdated(Arc::clone(snapshot)));
            }
            Err(e) => {
                warn!(error = %e, "manual refresh failed");
                let _ = self.events.send(DashboardEvent::RefreshFailed {
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    fn arm(&mut self, interval: RefreshInterval) {
        let activation = self.state.write().next_activation();
        let handle = tokio::spawn(run_ticks(
            Arc::clone(&self.generator),
            self.events.clone(),
            interval,
            activation,
        ));
        self.ticker = Some(Ticker { interval, handle });
    }

    /// Returns whether a timer was armed
    fn disarm(&mut self) -> bool {
        let Some(ticker) = self.ticker.take() else {
            return false;
        };
        ticker.handle.abort();
        // Invalidates whatever the aborted task may still be sampling
        self.state.write().next_activation();
        true
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(
    generator: Arc<Mutex<SnapshotGenerator>>,
    events: broadcast::Sender<DashboardEvent>,
    interval: RefreshInterval,
    activation: u64,
) {
    let period = interval.as_duration();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Ok(guard) = Arc::clone(&generator).try_lock_owned() else {
            debug!("generation still in flight, skipping tick");
            continue;
        };

        let result = task::spawn_blocking(move || {
            let mut generator = guard;
            generator.generate_for(activation)
        })
        .await;

        match result {
            Ok(Ok(Some(snapshot))) => {
                debug!(taken_at = %snapshot.taken_at, "scheduled refresh");
                let _ = events.send(DashboardEvent::SnapshotUpdated(snapshot));
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "scheduled refresh failed, keeping last snapshot");
                let _ = events.send(DashboardEvent::RefreshFailed {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "refresh task failed, keeping last snapshot");
                let _ = events.send(DashboardEvent::RefreshFailed {
                    reason: e.to_string(),
                });
            }
        }
    }
}

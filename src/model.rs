//! The dashboard model: single source of truth for the rendering layer.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::alerts::{self, Alert, AlertThresholds};
use crate::config::{Config, RefreshConfig, RefreshInterval};
use crate::error::Result;
use crate::generator::{sample_snapshot, SnapshotGenerator, DEFAULT_PROCESS_LIMIT};
use crate::history::{HistoryPoint, Series, SeriesSample};
use crate::scheduler::{DashboardEvent, RefreshScheduler, SchedulerState};
use crate::snapshot::Snapshot;
use crate::source::MetricsSource;
use crate::state::SharedState;

/// Events buffered per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 64;

pub struct DashboardModel {
    state: SharedState,
    scheduler: RefreshScheduler,
    refresh: RefreshConfig,
    alert_thresholds: AlertThresholds,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardModel {
    /// Build a model around `source`, taking the initial snapshot synchronously.
    /// The timer is not armed until [`start`](Self::start).
    pub fn new(source: Box<dyn MetricsSource>, refresh: RefreshConfig) -> Result<Self> {
        Self::build(
            source,
            refresh,
            DEFAULT_PROCESS_LIMIT,
            AlertThresholds::default(),
        )
    }

    pub fn from_config(source: Box<dyn MetricsSource>, config: &Config) -> Result<Self> {
        config.validate()?;
        Self::build(source, config.refresh, config.process_count, config.alerts)
    }

    fn build(
        mut source: Box<dyn MetricsSource>,
        refresh: RefreshConfig,
        process_limit: usize,
        alert_thresholds: AlertThresholds,
    ) -> Result<Self> {
        let initial = sample_snapshot(source.as_mut(), process_limit)?;
        info!(source = source.name(), "initial snapshot taken");

        let state = SharedState::new(Arc::new(initial));
        let generator =
            SnapshotGenerator::new(source, state.clone()).with_process_limit(process_limit);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let scheduler = RefreshScheduler::new(
            Arc::new(Mutex::new(generator)),
            state.clone(),
            events.clone(),
        );

        Ok(Self {
            state,
            scheduler,
            refresh,
            alert_thresholds,
            events,
        })
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(self.state.read().snapshot())
    }

    /// Points of `series`, oldest first
    pub fn history_for(&self, series: Series) -> Vec<HistoryPoint<SeriesSample>> {
        self.state.read().history().series(series)
    }

    /// Like [`history_for`](Self::history_for), by series name
    pub fn history_for_name(&self, name: &str) -> Result<Vec<HistoryPoint<SeriesSample>>> {
        Ok(self.history_for(name.parse()?))
    }

    pub fn history_len(&self, series: Series) -> usize {
        self.state.read().history().len_of(series)
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        self.refresh.interval
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Arm the timer at the configured interval. Must be called within a Tokio runtime.
    pub fn start(&mut self) {
        self.scheduler.start(self.refresh.interval);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Switch to a new interval. Anything outside 1, 5 or 10 seconds is rejected and the
    /// current interval stays in effect.
    pub fn set_refresh_interval(&mut self, seconds: u64) -> Result<()> {
        let interval = match self.scheduler.reconfigure(seconds) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(seconds, current = %self.refresh.interval, "rejected refresh interval");
                return Err(e);
            }
        };
        if interval != self.refresh.interval {
            self.refresh.interval = interval;
            let _ = self.events.send(DashboardEvent::IntervalChanged(interval));
        }
        Ok(())
    }

    /// Generate right now, without moving the next scheduled tick
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>> {
        self.scheduler.refresh_now().await
    }

    /// Notifications for new snapshots, failed refreshes and interval changes
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        alerts::evaluate(&self.current_snapshot(), &self.alert_thresholds)
    }

    pub fn reset_history(&self) {
        self.state.write().clear_history();
        info!("history cleared");
    }
}

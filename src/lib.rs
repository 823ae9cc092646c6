//! Core of a live system-resource dashboard.
//!
//! A [`DashboardModel`] owns the current [`Snapshot`], one rolling [`HistoryBuffer`] per
//! charted series and a [`RefreshScheduler`] that regenerates the snapshot from a
//! pluggable [`MetricsSource`] at 1, 5 or 10 second intervals. Rendering is left to
//! whoever subscribes to the model's events.

pub mod alerts;
pub mod app;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod model;
pub mod monitor;
pub mod scheduler;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod ui;

pub use config::{Config, RefreshConfig, RefreshInterval};
pub use error::{DashboardError, Result};
pub use generator::SnapshotGenerator;
pub use history::{HistoryBuffer, HistoryPoint, Series, SeriesSample, HISTORY_CAPACITY};
pub use model::DashboardModel;
pub use scheduler::{DashboardEvent, RefreshScheduler, SchedulerState};
pub use snapshot::Snapshot;
pub use source::{MetricsSource, SourceKind, SyntheticSource};

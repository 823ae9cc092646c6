//! Bounded rolling history for the trend charts.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DashboardError;
use crate::snapshot::Snapshot;

/// Number of points kept per series
pub const HISTORY_CAPACITY: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint<T> {
    pub timestamp: DateTime<Utc>,
    pub value: T,
}

impl<T> HistoryPoint<T> {
    pub fn new(timestamp: DateTime<Utc>, value: T) -> Self {
        Self { timestamp, value }
    }
}

/// Fixed-capacity FIFO window over one series, oldest first
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    points: VecDeque<HistoryPoint<T>>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, dropping the oldest one once the window is full
    pub fn append(&mut self, point: HistoryPoint<T>) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint<T>> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&HistoryPoint<T>> {
        self.points.back()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest().map(|point| point.timestamp)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<T: Clone> HistoryBuffer<T> {
    /// Copy of the current points in chronological order
    pub fn as_sequence(&self) -> Vec<HistoryPoint<T>> {
        self.points.iter().cloned().collect()
    }
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The series that carry a trend chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl Series {
    pub const ALL: [Series; 4] = [Series::Cpu, Series::Memory, Series::Disk, Series::Network];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Series {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "memory" | "mem" | "ram" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "network" | "net" => Ok(Self::Network),
            _ => Err(DashboardError::UnknownSeries(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskThroughput {
    pub read: f64,
    pub write: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkThroughput {
    pub download: f64,
    pub upload: f64,
}

/// Value of one history point, whatever the series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesSample {
    Usage(f64),
    Disk(DiskThroughput),
    Network(NetworkThroughput),
}

/// One buffer per charted series
#[derive(Debug, Clone, Default)]
pub struct HistorySet {
    pub cpu: HistoryBuffer<f64>,
    pub memory: HistoryBuffer<f64>,
    pub disk: HistoryBuffer<DiskThroughput>,
    pub network: HistoryBuffer<NetworkThroughput>,
}

impl HistorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive one point per series from `snapshot`, stamped with its sampling time
    pub fn record(&mut self, snapshot: &Snapshot) {
        let at = snapshot.taken_at;
        self.cpu
            .append(HistoryPoint::new(at, snapshot.cpu.usage_percent.get()));
        self.memory
            .append(HistoryPoint::new(at, snapshot.memory.usage_percent.get()));
        self.disk.append(HistoryPoint::new(
            at,
            DiskThroughput {
                read: snapshot.disk.read_speed_mbs,
                write: snapshot.disk.write_speed_mbs,
            },
        ));
        self.network.append(HistoryPoint::new(
            at,
            NetworkThroughput {
                download: snapshot.network.download_speed_mbs,
                upload: snapshot.network.upload_speed_mbs,
            },
        ));
    }

    pub fn series(&self, series: Series) -> Vec<HistoryPoint<SeriesSample>> {
        match series {
            Series::Cpu => Self::widen(&self.cpu, SeriesSample::Usage),
            Series::Memory => Self::widen(&self.memory, SeriesSample::Usage),
            Series::Disk => Self::widen(&self.disk, SeriesSample::Disk),
            Series::Network => Self::widen(&self.network, SeriesSample::Network),
        }
    }

    pub fn len_of(&self, series: Series) -> usize {
        match series {
            Series::Cpu => self.cpu.len(),
            Series::Memory => self.memory.len(),
            Series::Disk => self.disk.len(),
            Series::Network => self.network.len(),
        }
    }

    pub fn clear(&mut self) {
        self.cpu.clear();
        self.memory.clear();
        self.disk.clear();
        self.network.clear();
    }

    fn widen<T: Copy>(
        buffer: &HistoryBuffer<T>,
        wrap: fn(T) -> SeriesSample,
    ) -> Vec<HistoryPoint<SeriesSample>> {
        buffer
            .iter()
            .map(|point| HistoryPoint::new(point.timestamp, wrap(point.value)))
            .collect()
    }
}

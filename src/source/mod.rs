//! Pluggable metrics sources.
//!
//! The generator only talks to [`MetricsSource`]; the synthetic source backs tests and
//! demos, [`crate::monitor::SystemMonitor`] reads the host through sysinfo.

mod synthetic;

pub use synthetic::SyntheticSource;

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::{DashboardError, Result};
use crate::monitor::SystemMonitor;
use crate::snapshot::{
    CpuReading, DiskReading, MemoryReading, NetworkReading, ProcessReading, SystemInfo,
};

/// Produces the raw readings a snapshot is assembled from.
///
/// Every sampler may fail with [`DashboardError::SourceUnavailable`]. Samplers may block,
/// the generator is always driven from the blocking pool.
pub trait MetricsSource: Send {
    fn sample_cpu(&mut self) -> Result<CpuReading>;
    fn sample_memory(&mut self) -> Result<MemoryReading>;
    fn sample_disk(&mut self) -> Result<DiskReading>;
    fn sample_network(&mut self) -> Result<NetworkReading>;
    fn sample_processes(&mut self) -> Result<ProcessReading>;

    /// Hostname and uptime; sources without host identity report "unknown" and 0
    fn sample_system(&mut self) -> Result<SystemInfo> {
        Ok(SystemInfo::default())
    }

    /// Short label used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Which source the host wires in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Synthetic,
    System,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synthetic => "synthetic",
            Self::System => "system",
        }
    }

    /// Build the source; `seed` only applies to the synthetic source
    pub fn open(&self, seed: Option<u64>) -> Box<dyn MetricsSource> {
        match self {
            Self::Synthetic => match seed {
                Some(seed) => Box::new(SyntheticSource::seeded(seed)),
                None => Box::new(SyntheticSource::new()),
            },
            Self::System => {
                let monitor = SystemMonitor::new();
                info!(cores = monitor.core_count(), "reading live system metrics");
                Box::new(monitor)
            }
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "demo" => Ok(Self::Synthetic),
            "system" | "sysinfo" => Ok(Self::System),
            other => Err(DashboardError::invalid_config(format!(
                "unknown metrics source '{}' (expected synthetic or system)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("demo".parse::<SourceKind>().unwrap(), SourceKind::Synthetic);
        assert_eq!(" SysInfo ".parse::<SourceKind>().unwrap(), SourceKind::System);
        assert!(matches!(
            "snmp".parse::<SourceKind>(),
            Err(DashboardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn open_builds_the_requested_source() {
        let mut synthetic = SourceKind::Synthetic.open(Some(5));
        assert_eq!(synthetic.name(), "synthetic");
        assert_eq!(synthetic.sample_system().unwrap().hostname, "sysdash-demo");

        assert_eq!(SourceKind::System.open(None).name(), "system");
    }
}

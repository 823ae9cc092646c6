//! Threshold alerts derived from a snapshot.

use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::snapshot::{Percent, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Cpu,
    Memory,
    Disk,
}

impl Resource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "Memory",
            Self::Disk => "Disk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub resource: Resource,
    pub level: AlertLevel,
    pub message: String,
}

/// Warning and critical levels for one resource, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
}

impl Threshold {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    pub fn validate(&self, resource: Resource) -> Result<()> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.warning) || !in_range(self.critical) {
            return Err(DashboardError::invalid_config(format!(
                "{} alert thresholds must be between 0 and 100",
                resource.label()
            )));
        }
        if self.warning > self.critical {
            return Err(DashboardError::invalid_config(format!(
                "{} warning threshold ({}) is above the critical threshold ({})",
                resource.label(),
                self.warning,
                self.critical
            )));
        }
        Ok(())
    }

    fn level(&self, usage: Percent) -> Option<(AlertLevel, f64)> {
        let usage = usage.get();
        if usage > self.critical {
            Some((AlertLevel::Critical, self.critical))
        } else if usage > self.warning {
            Some((AlertLevel::Warning, self.warning))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub cpu: Threshold,
    pub memory: Threshold,
    pub disk: Threshold,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu: Threshold::new(75.0, 90.0),
            memory: Threshold::new(80.0, 90.0),
            disk: Threshold::new(80.0, 90.0),
        }
    }
}

impl AlertThresholds {
    pub fn validate(&self) -> Result<()> {
        self.cpu.validate(Resource::Cpu)?;
        self.memory.validate(Resource::Memory)?;
        self.disk.validate(Resource::Disk)
    }
}

/// Alerts raised by `snapshot`, at most one per resource
pub fn evaluate(snapshot: &Snapshot, thresholds: &AlertThresholds) -> Vec<Alert> {
    [
        (Resource::Cpu, snapshot.cpu.usage_percent, thresholds.cpu),
        (Resource::Memory, snapshot.memory.usage_percent, thresholds.memory),
        (Resource::Disk, snapshot.disk.usage_percent, thresholds.disk),
    ]
    .into_iter()
    .filter_map(|(resource, usage, threshold)| {
        threshold.level(usage).map(|(level, limit)| Alert {
            resource,
            level,
            message: format!("{} usage over {}%", resource.label(), limit),
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MetricsSource, SyntheticSource};
    use chrono::Utc;

    fn snapshot_with(cpu: f64, memory: f64, disk: f64) -> Snapshot {
        let mut source = SyntheticSource::seeded(11);
        let mut snapshot = Snapshot {
            taken_at: Utc::now(),
            cpu: source.sample_cpu().unwrap(),
            memory: source.sample_memory().unwrap(),
            disk: source.sample_disk().unwrap(),
            network: source.sample_network().unwrap(),
            processes: source.sample_processes().unwrap(),
            system: source.sample_system().unwrap(),
        };
        snapshot.cpu.usage_percent = Percent::new(cpu);
        snapshot.memory.usage_percent = Percent::new(memory);
        snapshot.disk.usage_percent = Percent::new(disk);
        snapshot
    }

    #[test]
    fn quiet_system_raises_nothing() {
        let alerts = evaluate(&snapshot_with(40.0, 50.0, 35.0), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn levels_follow_thresholds() {
        let alerts = evaluate(&snapshot_with(95.0, 85.0, 80.0), &AlertThresholds::default());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].resource, Resource::Cpu);
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(alerts[0].message, "CPU usage over 90%");
        assert_eq!(alerts[1].resource, Resource::Memory);
        assert_eq!(alerts[1].level, AlertLevel::Warning);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let thresholds = AlertThresholds {
            disk: Threshold::new(95.0, 90.0),
            ..AlertThresholds::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(DashboardError::InvalidConfig(_))
        ));
        assert!(Threshold::new(10.0, 120.0).validate(Resource::Cpu).is_err());
    }
}

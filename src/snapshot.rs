//! Point-in-time snapshot of every metric the dashboard shows.
//!
//! A [`Snapshot`] is produced by the generator, shared behind an `Arc` and never
//! mutated afterwards. It serializes to a plain nested mapping with camelCase keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

const UTILIZATION_LOW: f64 = 30.0;
const UTILIZATION_MODERATE: f64 = 70.0;
/// Usage above which a saturated run queue counts as a bottleneck
const BOTTLENECK_USAGE: f64 = 90.0;

/// A percentage clamped to `0.0..=100.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 100.0))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Percent {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// Coarse CPU load bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationLevel {
    Low,
    Moderate,
    High,
}

impl UtilizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for UtilizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-queue load averaged over 1, 5 and 15 minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl LoadAverage {
    /// Load per core, unchanged when `cores` is 0
    pub fn per_core(&self, cores: usize) -> LoadAverage {
        if cores == 0 {
            return *self;
        }
        let cores = cores as f64;
        LoadAverage {
            one: self.one / cores,
            five: self.five / cores,
            fifteen: self.fifteen / cores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuReading {
    pub usage_percent: Percent,
    pub per_core_usage_percent: Vec<Percent>,
    pub temperature_celsius: i32,
    /// Absent on platforms without a load average
    pub load_average: Option<LoadAverage>,
    /// Mean current core frequency, when the platform reports one
    pub frequency_mhz: Option<u64>,
}

impl CpuReading {
    pub fn utilization_level(&self) -> UtilizationLevel {
        let usage = self.usage_percent.get();
        if usage <= UTILIZATION_LOW {
            UtilizationLevel::Low
        } else if usage <= UTILIZATION_MODERATE {
            UtilizationLevel::Moderate
        } else {
            UtilizationLevel::High
        }
    }

    /// Spread between the busiest and the idlest core, 0 with fewer than two cores
    pub fn core_imbalance(&self) -> f64 {
        if self.per_core_usage_percent.len() < 2 {
            return 0.0;
        }
        let (min, max) = self
            .per_core_usage_percent
            .iter()
            .map(Percent::get)
            .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        max - min
    }

    /// Load average divided by the number of cores
    pub fn normalized_load(&self) -> Option<LoadAverage> {
        self.load_average
            .map(|load| load.per_core(self.per_core_usage_percent.len()))
    }

    /// Nearly saturated and more runnable tasks than cores over the last minute
    pub fn potential_bottleneck(&self) -> bool {
        self.usage_percent.get() > BOTTLENECK_USAGE
            && self.normalized_load().is_some_and(|load| load.one > 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryReading {
    #[serde(rename = "usagePercent")]
    pub usage_percent: Percent,
    #[serde(rename = "usedGiB")]
    pub used_gib: f64,
    #[serde(rename = "totalGiB")]
    pub total_gib: f64,
    #[serde(rename = "swapUsedGiB")]
    pub swap_used_gib: f64,
    #[serde(rename = "swapTotalGiB")]
    pub swap_total_gib: f64,
}

impl MemoryReading {
    pub fn free_gib(&self) -> f64 {
        (self.total_gib - self.used_gib).max(0.0)
    }

    /// 0 when there is no swap
    pub fn swap_percent(&self) -> Percent {
        if self.swap_total_gib <= 0.0 {
            return Percent::new(0.0);
        }
        Percent::new(self.swap_used_gib / self.swap_total_gib * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub name: String,
    #[serde(rename = "totalGiB")]
    pub total_gib: f64,
    #[serde(rename = "usedGiB")]
    pub used_gib: f64,
}

impl Partition {
    pub fn free_gib(&self) -> f64 {
        (self.total_gib - self.used_gib).max(0.0)
    }

    pub fn usage_percent(&self) -> Percent {
        if self.total_gib <= 0.0 {
            return Percent::new(0.0);
        }
        Percent::new(self.used_gib / self.total_gib * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskReading {
    #[serde(rename = "usagePercent")]
    pub usage_percent: Percent,
    #[serde(rename = "readSpeedMBs")]
    pub read_speed_mbs: f64,
    #[serde(rename = "writeSpeedMBs")]
    pub write_speed_mbs: f64,
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

/// A network interface. An address is carried exactly when the link is up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInterface {
    name: String,
    state: LinkState,
    ip: Option<String>,
}

impl NetworkInterface {
    pub fn up(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LinkState::Up,
            ip: Some(ip.into()),
        }
    }

    pub fn down(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LinkState::Down,
            ip: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkReading {
    #[serde(rename = "downloadSpeedMBs")]
    pub download_speed_mbs: f64,
    #[serde(rename = "uploadSpeedMBs")]
    pub upload_speed_mbs: f64,
    pub interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReading {
    pub total: u32,
    pub running: u32,
    pub sleeping: u32,
    pub list: Vec<ProcessEntry>,
}

/// Host identity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub hostname: String,
    pub uptime_secs: u64,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            hostname: "unknown".to_string(),
            uptime_secs: 0,
        }
    }
}

/// One immutable reading of the whole system
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub cpu: CpuReading,
    pub memory: MemoryReading,
    pub disk: DiskReading,
    pub network: NetworkReading,
    pub processes: ProcessReading,
    pub system: SystemInfo,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_clamps_out_of_range_and_nan() {
        assert_eq!(Percent::new(-3.0).get(), 0.0);
        assert_eq!(Percent::new(140.0).get(), 100.0);
        assert_eq!(Percent::new(f64::NAN).get(), 0.0);
        assert_eq!(Percent::new(42.5).get(), 42.5);
    }

    #[test]
    fn free_memory_never_negative() {
        let memory = MemoryReading {
            usage_percent: Percent::new(100.0),
            used_gib: 17.0,
            total_gib: 16.0,
            swap_used_gib: 0.0,
            swap_total_gib: 0.0,
        };
        assert_eq!(memory.free_gib(), 0.0);
        assert_eq!(memory.swap_percent().get(), 0.0);
    }

    #[test]
    fn swap_percent_of_total() {
        let memory = MemoryReading {
            usage_percent: Percent::new(50.0),
            used_gib: 8.0,
            total_gib: 16.0,
            swap_used_gib: 0.5,
            swap_total_gib: 2.0,
        };
        assert_eq!(memory.swap_percent().get(), 25.0);
    }

    #[test]
    fn utilization_buckets() {
        let mut cpu = CpuReading {
            usage_percent: Percent::new(30.0),
            per_core_usage_percent: vec![Percent::new(10.0), Percent::new(55.0)],
            temperature_celsius: 55,
            load_average: None,
            frequency_mhz: None,
        };
        assert_eq!(cpu.utilization_level(), UtilizationLevel::Low);
        assert_eq!(cpu.utilization_level().to_string(), "low");
        cpu.usage_percent = Percent::new(70.0);
        assert_eq!(cpu.utilization_level(), UtilizationLevel::Moderate);
        cpu.usage_percent = Percent::new(70.1);
        assert_eq!(cpu.utilization_level(), UtilizationLevel::High);
        assert_eq!(cpu.core_imbalance(), 45.0);
    }

    #[test]
    fn bottleneck_needs_high_usage_and_saturated_cores() {
        let mut cpu = CpuReading {
            usage_percent: Percent::new(95.0),
            per_core_usage_percent: vec![Percent::new(95.0); 4],
            temperature_celsius: 80,
            load_average: Some(LoadAverage {
                one: 6.0,
                five: 4.0,
                fifteen: 2.0,
            }),
            frequency_mhz: Some(3200),
        };
        let normalized = cpu.normalized_load().unwrap();
        assert_eq!(normalized.one, 1.5);
        assert_eq!(normalized.fifteen, 0.5);
        assert!(cpu.potential_bottleneck());

        cpu.load_average = Some(LoadAverage {
            one: 3.0,
            five: 3.0,
            fifteen: 3.0,
        });
        assert!(!cpu.potential_bottleneck());

        cpu.load_average = None;
        assert!(!cpu.potential_bottleneck());

        cpu.load_average = Some(LoadAverage {
            one: 8.0,
            five: 8.0,
            fifteen: 8.0,
        });
        cpu.usage_percent = Percent::new(90.0);
        assert!(!cpu.potential_bottleneck());
    }

    #[test]
    fn interface_address_follows_link_state() {
        let up = NetworkInterface::up("eth0", "10.0.0.2");
        assert_eq!(up.state(), LinkState::Up);
        assert_eq!(up.ip(), Some("10.0.0.2"));

        let down = NetworkInterface::down("wlan0");
        assert_eq!(down.state(), LinkState::Down);
        assert_eq!(down.ip(), None);

        let json = serde_json::to_value(&down).unwrap();
        assert_eq!(json["state"], "down");
        assert!(json["ip"].is_null());
    }

    #[test]
    fn partition_usage_handles_empty_partition() {
        let partition = Partition {
            name: "/boot".to_string(),
            total_gib: 0.0,
            used_gib: 0.0,
        };
        assert_eq!(partition.usage_percent().get(), 0.0);
    }
}

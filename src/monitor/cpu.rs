use sysinfo::{Components, System};

use crate::error::{DashboardError, Result};
use crate::snapshot::{CpuReading, LoadAverage, Percent};

/// Sensor labels that carry the package/die temperature, in order of preference
const CPU_SENSOR_LABELS: [&str; 6] = ["coretemp", "k10temp", "zenpower", "acpitz", "package", "tctl"];

pub struct CpuMonitor {
    system: System,
    components: Components,
}

impl CpuMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        // Initial refresh to get baseline
        system.refresh_cpu_usage();
        Self {
            system,
            components: Components::new_with_refreshed_list(),
        }
    }

    pub fn refresh(&mut self) {
        self.system.refresh_cpu_usage();
        self.system.refresh_cpu_frequency();
        self.components.refresh();
    }

    /// Returns CPU usage for each core as a percentage
    pub fn per_core_usage(&self) -> Vec<Percent> {
        self.system
            .cpus()
            .iter()
            .map(|cpu| Percent::new(cpu.cpu_usage() as f64))
            .collect()
    }

    /// Returns average CPU usage across all cores
    pub fn average_usage(&self) -> Percent {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Percent::new(0.0);
        }

        let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        Percent::new((total / cpus.len() as f32) as f64)
    }

    /// Hottest CPU sensor, if the platform exposes one
    pub fn temperature(&self) -> Option<i32> {
        CPU_SENSOR_LABELS.iter().find_map(|wanted| {
            self.components
                .list()
                .iter()
                .filter(|component| component.label().to_ascii_lowercase().contains(wanted))
                .map(|component| component.temperature())
                .filter(|celsius| celsius.is_finite())
                .fold(None, |hottest: Option<f32>, celsius| {
                    Some(hottest.map_or(celsius, |h| h.max(celsius)))
                })
                .map(|celsius| celsius.round() as i32)
        })
    }

    /// 1, 5 and 15 minute load; Windows has none and reports zeros
    pub fn load_average(&self) -> Option<LoadAverage> {
        if cfg!(windows) {
            return None;
        }
        let load = System::load_average();
        Some(LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        })
    }

    /// Mean current frequency over all cores in MHz
    pub fn frequency(&self) -> Option<u64> {
        let cpus = self.system.cpus();
        let total: u64 = cpus.iter().map(|cpu| cpu.frequency()).sum();
        if total == 0 {
            return None;
        }
        Some(total / cpus.len() as u64)
    }

    /// Returns the number of CPU cores
    pub fn core_count(&self) -> usize {
        self.system.cpus().len()
    }

    pub fn reading(&mut self) -> Result<CpuReading> {
        self.refresh();
        if self.core_count() == 0 {
            return Err(DashboardError::source_unavailable("no CPUs reported"));
        }

        let temperature_celsius = self.temperature().unwrap_or_else(|| {
            tracing::debug!("no CPU temperature sensor found, reporting 0");
            0
        });

        Ok(CpuReading {
            usage_percent: self.average_usage(),
            per_core_usage_percent: self.per_core_usage(),
            temperature_celsius,
            load_average: self.load_average(),
            frequency_mhz: self.frequency(),
        })
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new()
    }
}

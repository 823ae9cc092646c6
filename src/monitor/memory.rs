use sysinfo::System;

use super::BYTES_PER_GIB;
use crate::error::{DashboardError, Result};
use crate::snapshot::{MemoryReading, Percent};

pub struct MemoryMonitor {
    system: System,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self { system }
    }

    pub fn refresh(&mut self) {
        self.system.refresh_memory();
    }

    /// Returns memory usage as a percentage
    pub fn usage(&self) -> Percent {
        let total = self.system.total_memory();
        let used = self.system.used_memory();

        if total == 0 {
            return Percent::new(0.0);
        }

        Percent::new(used as f64 / total as f64 * 100.0)
    }

    /// Returns total memory in bytes
    pub fn total_bytes(&self) -> u64 {
        self.system.total_memory()
    }

    /// Returns used memory in bytes
    pub fn used_bytes(&self) -> u64 {
        self.system.used_memory()
    }

    pub fn reading(&mut self) -> Result<MemoryReading> {
        self.refresh();
        let total = self.total_bytes();
        if total == 0 {
            return Err(DashboardError::source_unavailable("total memory reported as 0"));
        }

        Ok(MemoryReading {
            usage_percent: self.usage(),
            used_gib: self.used_bytes().min(total) as f64 / BYTES_PER_GIB,
            total_gib: total as f64 / BYTES_PER_GIB,
            swap_used_gib: self.system.used_swap() as f64 / BYTES_PER_GIB,
            swap_total_gib: self.system.total_swap() as f64 / BYTES_PER_GIB,
        })
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

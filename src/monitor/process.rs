use std::ffi::OsStr;

use sysinfo::{ProcessStatus, System};

use crate::error::{DashboardError, Result};
use crate::snapshot::{ProcessEntry, ProcessReading};

pub struct ProcessMonitor {
    system: System,
}

impl ProcessMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        // Process CPU usage is a delta, take the baseline now
        system.refresh_all();
        Self { system }
    }

    pub fn refresh(&mut self) {
        self.system.refresh_all();
    }

    fn lossy(name: impl AsRef<OsStr>) -> String {
        name.as_ref().to_string_lossy().into_owned()
    }

    pub fn reading(&mut self) -> Result<ProcessReading> {
        self.refresh();
        let processes = self.system.processes();
        if processes.is_empty() {
            return Err(DashboardError::source_unavailable("process table is empty"));
        }

        let total_memory = self.system.total_memory().max(1) as f64;
        // sysinfo sums usage over cores
        let cores = self.system.cpus().len().max(1) as f64;
        let mut running = 0u32;
        let mut sleeping = 0u32;
        let mut list = Vec::with_capacity(processes.len());

        // Linux lists threads alongside their processes
        for (pid, process) in processes.iter().filter(|(_, p)| p.thread_kind().is_none()) {
            match process.status() {
                ProcessStatus::Run => running += 1,
                ProcessStatus::Sleep | ProcessStatus::Idle => sleeping += 1,
                _ => {}
            }
            list.push(ProcessEntry {
                pid: pid.as_u32(),
                name: Self::lossy(process.name()),
                cpu_percent: process.cpu_usage().max(0.0) as f64 / cores,
                memory_percent: process.memory() as f64 / total_memory * 100.0,
            });
        }

        Ok(ProcessReading {
            total: list.len() as u32,
            running,
            sleeping,
            list,
        })
    }
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

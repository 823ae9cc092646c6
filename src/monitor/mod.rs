mod cpu;
mod disk;
mod memory;
mod network;
mod process;

pub use cpu::CpuMonitor;
pub use disk::DiskMonitor;
pub use memory::MemoryMonitor;
pub use network::NetworkMonitor;
pub use process::ProcessMonitor;

use sysinfo::System;

use crate::error::Result;
use crate::snapshot::{
    CpuReading, DiskReading, MemoryReading, NetworkReading, ProcessReading, SystemInfo,
};
use crate::source::MetricsSource;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1_000_000.0;

/// Metrics source that reads the local host through sysinfo and /proc
pub struct SystemMonitor {
    cpu: CpuMonitor,
    memory: MemoryMonitor,
    disk: DiskMonitor,
    network: NetworkMonitor,
    processes: ProcessMonitor,
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self {
            cpu: CpuMonitor::new(),
            memory: MemoryMonitor::new(),
            disk: DiskMonitor::new(),
            network: NetworkMonitor::new(),
            processes: ProcessMonitor::new(),
        }
    }

    /// Returns the number of CPU cores
    pub fn core_count(&self) -> usize {
        self.cpu.core_count()
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SystemMonitor {
    fn sample_cpu(&mut self) -> Result<CpuReading> {
        self.cpu.reading()
    }

    fn sample_memory(&mut self) -> Result<MemoryReading> {
        self.memory.reading()
    }

    fn sample_disk(&mut self) -> Result<DiskReading> {
        self.disk.reading()
    }

    fn sample_network(&mut self) -> Result<NetworkReading> {
        self.network.reading()
    }

    fn sample_processes(&mut self) -> Result<ProcessReading> {
        self.processes.reading()
    }

    fn sample_system(&mut self) -> Result<SystemInfo> {
        Ok(SystemInfo {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            uptime_secs: System::uptime(),
        })
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

//! Snapshot generation: sample the source, normalize, and publish together with history.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::snapshot::{DiskReading, MemoryReading, NetworkReading, ProcessReading, Snapshot};
use crate::source::MetricsSource;
use crate::state::SharedState;

/// Default number of processes kept in a snapshot
pub const DEFAULT_PROCESS_LIMIT: usize = 15;

pub struct SnapshotGenerator {
    source: Box<dyn MetricsSource>,
    state: SharedState,
    process_limit: usize,
}

impl SnapshotGenerator {
    pub fn new(source: Box<dyn MetricsSource>, state: SharedState) -> Self {
        Self {
            source,
            state,
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }

    pub fn with_process_limit(mut self, limit: usize) -> Self {
        self.process_limit = limit.max(1);
        self
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Read every sampler and assemble a normalized snapshot, without publishing it
    pub fn sample(&mut self) -> Result<Snapshot> {
        sample_snapshot(self.source.as_mut(), self.process_limit)
    }

    /// Sample and publish: the new snapshot becomes current and one point per series
    /// is appended to history, in the same critical section.
    pub fn generate(&mut self) -> Result<Arc<Snapshot>> {
        let snapshot = Arc::new(self.sample()?);
        self.state.write().commit(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Like [`generate`](Self::generate), but only publishes while the timer activation
    /// that asked for it is still the current one. Returns `Ok(None)` when the timer was
    /// cancelled or rearmed while sampling.
    pub(crate) fn generate_for(&mut self, activation: u64) -> Result<Option<Arc<Snapshot>>> {
        let snapshot = Arc::new(self.sample()?);
        let mut state = self.state.write();
        if state.activation() != activation {
            debug!(activation, "timer cancelled during sampling, discarding snapshot");
            return Ok(None);
        }
        state.commit(Arc::clone(&snapshot));
        Ok(Some(snapshot))
    }
}

/// Read every sampler of `source` and assemble a normalized snapshot.
///
/// Fails as a whole if any sampler fails.
pub fn sample_snapshot(source: &mut dyn MetricsSource, process_limit: usize) -> Result<Snapshot> {
    let taken_at = Utc::now();
    let cpu = source.sample_cpu()?;
    let memory = source.sample_memory()?;
    let disk = source.sample_disk()?;
    let network = source.sample_network()?;
    let processes = source.sample_processes()?;
    let system = source.sample_system()?;

    Ok(Snapshot {
        taken_at,
        cpu,
        memory: normalize_memory(memory),
        disk: normalize_disk(disk),
        network: normalize_network(network),
        processes: normalize_processes(processes, process_limit.max(1)),
        system,
    })
}

fn non_negative(value: f64) -> f64 {
    // NaN.max(0.0) is 0.0
    value.max(0.0)
}

fn percentage(value: f64) -> f64 {
    non_negative(value).min(100.0)
}

fn normalize_memory(mut memory: MemoryReading) -> MemoryReading {
    memory.total_gib = non_negative(memory.total_gib);
    memory.used_gib = non_negative(memory.used_gib).min(memory.total_gib);
    memory.swap_total_gib = non_negative(memory.swap_total_gib);
    memory.swap_used_gib = non_negative(memory.swap_used_gib).min(memory.swap_total_gib);
    memory
}

fn normalize_disk(mut disk: DiskReading) -> DiskReading {
    disk.read_speed_mbs = non_negative(disk.read_speed_mbs);
    disk.write_speed_mbs = non_negative(disk.write_speed_mbs);
    for partition in &mut disk.partitions {
        partition.total_gib = non_negative(partition.total_gib);
        partition.used_gib = non_negative(partition.used_gib).min(partition.total_gib);
    }
    disk
}

fn normalize_network(mut network: NetworkReading) -> NetworkReading {
    network.download_speed_mbs = non_negative(network.download_speed_mbs);
    network.upload_speed_mbs = non_negative(network.upload_speed_mbs);
    network
}

/// Positive unique pids with shares in 0..=100, busiest first, at most `limit` entries
fn normalize_processes(mut processes: ProcessReading, limit: usize) -> ProcessReading {
    let mut seen = HashSet::new();
    processes
        .list
        .retain(|entry| entry.pid > 0 && seen.insert(entry.pid));
    for entry in &mut processes.list {
        entry.cpu_percent = percentage(entry.cpu_percent);
        entry.memory_percent = percentage(entry.memory_percent);
    }
    processes.list.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    processes.list.truncate(limit);

    let classified = processes.running.saturating_add(processes.sleeping);
    processes.total = processes.total.max(classified);
    processes
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sysdash::error::{DashboardError, Result};
use sysdash::snapshot::{
    CpuReading, DiskReading, MemoryReading, NetworkReading, ProcessReading, SystemInfo,
};
use sysdash::{MetricsSource, SyntheticSource};

/// Synthetic readings, until `failing` is set
pub struct FlakySource {
    inner: SyntheticSource,
    failing: Arc<AtomicBool>,
}

impl FlakySource {
    pub fn new(seed: u64) -> (Self, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let source = Self {
            inner: SyntheticSource::seeded(seed),
            failing: Arc::clone(&failing),
        };
        (source, failing)
    }
}

impl MetricsSource for FlakySource {
    fn sample_cpu(&mut self) -> Result<CpuReading> {
        self.inner.sample_cpu()
    }

    fn sample_memory(&mut self) -> Result<MemoryReading> {
        self.inner.sample_memory()
    }

    fn sample_disk(&mut self) -> Result<DiskReading> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DashboardError::source_unavailable("disk counters unreadable"));
        }
        self.inner.sample_disk()
    }

    fn sample_network(&mut self) -> Result<NetworkReading> {
        self.inner.sample_network()
    }

    fn sample_processes(&mut self) -> Result<ProcessReading> {
        self.inner.sample_processes()
    }

    fn sample_system(&mut self) -> Result<SystemInfo> {
        self.inner.sample_system()
    }
}

/// Tracks how many samples are in flight at once
#[derive(Default)]
pub struct Concurrency {
    current: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
}

impl Concurrency {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Synthetic readings whose CPU sample blocks for `delay` of real time
pub struct SlowSource {
    inner: SyntheticSource,
    delay: Duration,
    concurrency: Arc<Concurrency>,
}

impl SlowSource {
    pub fn new(seed: u64, delay: Duration) -> (Self, Arc<Concurrency>) {
        let concurrency = Arc::new(Concurrency::default());
        let source = Self {
            inner: SyntheticSource::seeded(seed),
            delay,
            concurrency: Arc::clone(&concurrency),
        };
        (source, concurrency)
    }
}

impl MetricsSource for SlowSource {
    fn sample_cpu(&mut self) -> Result<CpuReading> {
        let now = self.concurrency.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.concurrency.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.concurrency.current.fetch_sub(1, Ordering::SeqCst);
        self.concurrency.completed.fetch_add(1, Ordering::SeqCst);
        self.inner.sample_cpu()
    }

    fn sample_memory(&mut self) -> Result<MemoryReading> {
        self.inner.sample_memory()
    }

    fn sample_disk(&mut self) -> Result<DiskReading> {
        self.inner.sample_disk()
    }

    fn sample_network(&mut self) -> Result<NetworkReading> {
        self.inner.sample_network()
    }

    fn sample_processes(&mut self) -> Result<ProcessReading> {
        self.inner.sample_processes()
    }

    fn sample_system(&mut self) -> Result<SystemInfo> {
        self.inner.sample_system()
    }
}

/// Let paused time run forward in small steps so every tick gets to finish its work
pub async fn advance(total: Duration) {
    let step = Duration::from_millis(100);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        let next = step.min(total - elapsed);
        tokio::time::sleep(next).await;
        elapsed += next;
    }
}

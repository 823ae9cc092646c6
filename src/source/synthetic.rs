use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::MetricsSource;
use crate::error::Result;
use crate::snapshot::{
    CpuReading, DiskReading, LoadAverage, MemoryReading, NetworkInterface, NetworkReading,
    Partition, Percent, ProcessEntry, ProcessReading, SystemInfo,
};

const TOTAL_MEMORY_GIB: f64 = 15.8;
const TOTAL_SWAP_GIB: f64 = 2.0;
const HOSTNAME: &str = "sysdash-demo";

/// Per-core usage ranges, one per simulated core
const CORE_RANGES: [(f64, f64); 4] = [(30.0, 80.0), (20.0, 70.0), (10.0, 60.0), (15.0, 65.0)];

const PARTITIONS: [(&str, f64); 3] = [("/", 128.0), ("/home", 324.0), ("/var", 64.0)];

/// (pid, name, base cpu %, base memory %)
const PROCESSES: [(u32, &str, f64, f64); 5] = [
    (1, "systemd", 0.2, 1.5),
    (1293, "firefox", 8.5, 12.6),
    (1820, "neovim", 2.3, 3.8),
    (2145, "python", 14.2, 5.2),
    (3012, "node", 6.7, 8.4),
];

const PROCESS_TOTAL: u32 = 124;
const PROCESS_RUNNING: u32 = 3;

/// Random readings inside fixed, plausible ranges.
///
/// Every sample is drawn independently of the previous one.
pub struct SyntheticSource {
    rng: StdRng,
    /// Uptime at construction, in seconds
    boot_offset: u64,
    started: Instant,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence of readings
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        // Between one hour and ten days
        let boot_offset = rng.gen_range(3_600..864_000);
        Self {
            rng,
            boot_offset,
            started: Instant::now(),
        }
    }

    fn round1(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SyntheticSource {
    fn sample_cpu(&mut self) -> Result<CpuReading> {
        let per_core = CORE_RANGES
            .iter()
            .map(|&(lo, hi)| Percent::new(self.rng.gen_range(lo..hi).floor()))
            .collect();

        Ok(CpuReading {
            usage_percent: Percent::new(self.rng.gen_range(30.0..70.0_f64).floor()),
            per_core_usage_percent: per_core,
            temperature_celsius: self.rng.gen_range(50..70),
            load_average: Some(LoadAverage {
                one: Self::round2(self.rng.gen_range(0.5..4.0)),
                five: Self::round2(self.rng.gen_range(0.5..3.0)),
                fifteen: Self::round2(self.rng.gen_range(0.5..2.5)),
            }),
            frequency_mhz: Some(self.rng.gen_range(2_400..3_600)),
        })
    }

    fn sample_memory(&mut self) -> Result<MemoryReading> {
        let usage = self.rng.gen_range(40.0..70.0_f64).floor();
        Ok(MemoryReading {
            usage_percent: Percent::new(usage),
            used_gib: Self::round1(TOTAL_MEMORY_GIB * usage / 100.0),
            total_gib: TOTAL_MEMORY_GIB,
            swap_used_gib: Self::round1(TOTAL_SWAP_GIB * self.rng.gen_range(0.0..0.3)),
            swap_total_gib: TOTAL_SWAP_GIB,
        })
    }

    fn sample_disk(&mut self) -> Result<DiskReading> {
        let usage = self.rng.gen_range(30.0..50.0_f64).floor();
        let partitions = PARTITIONS
            .iter()
            .map(|&(name, total)| {
                let share = (usage / 100.0 * self.rng.gen_range(0.8..1.2)).min(1.0);
                Partition {
                    name: name.to_string(),
                    total_gib: total,
                    used_gib: Self::round1(total * share),
                }
            })
            .collect();

        Ok(DiskReading {
            usage_percent: Percent::new(usage),
            read_speed_mbs: self.rng.gen_range(0.0..15.0),
            write_speed_mbs: self.rng.gen_range(0.0..8.0),
            partitions,
        })
    }

    fn sample_network(&mut self) -> Result<NetworkReading> {
        Ok(NetworkReading {
            download_speed_mbs: self.rng.gen_range(0.0..5.0),
            upload_speed_mbs: self.rng.gen_range(0.0..2.0),
            interfaces: vec![
                NetworkInterface::up("eth0", "192.168.1.100"),
                NetworkInterface::down("wlan0"),
            ],
        })
    }

    fn sample_processes(&mut self) -> Result<ProcessReading> {
        let list = PROCESSES
            .iter()
            .map(|&(pid, name, cpu, memory)| ProcessEntry {
                pid,
                name: name.to_string(),
                cpu_percent: Self::round1(cpu * self.rng.gen_range(0.5..1.5)),
                memory_percent: Self::round1(memory * self.rng.gen_range(0.9..1.1)),
            })
            .collect();

        Ok(ProcessReading {
            total: PROCESS_TOTAL,
            running: PROCESS_RUNNING,
            sleeping: PROCESS_TOTAL - PROCESS_RUNNING,
            list,
        })
    }

    fn sample_system(&mut self) -> Result<SystemInfo> {
        Ok(SystemInfo {
            hostname: HOSTNAME.to_string(),
            uptime_secs: self.boot_offset + self.started.elapsed().as_secs(),
        })
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

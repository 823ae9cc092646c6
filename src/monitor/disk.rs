use std::fs;
use std::io;
use std::time::Instant;

use sysinfo::Disks;

use super::{BYTES_PER_GIB, BYTES_PER_MB};
use crate::error::{DashboardError, Result};
use crate::snapshot::{DiskReading, Partition, Percent};

const DISKSTATS_PATH: &str = "/proc/diskstats";
const SECTOR_BYTES: f64 = 512.0;

/// Monitors mounted partitions and disk throughput from /proc/diskstats
pub struct DiskMonitor {
    last_read_sectors: u64,
    last_write_sectors: u64,
    last_time: Instant,
    read_mbs: f64,
    write_mbs: f64,
}

impl DiskMonitor {
    pub fn new() -> Self {
        let (read_sectors, write_sectors) = Self::read_disk_stats().unwrap_or((0, 0));
        Self {
            last_read_sectors: read_sectors,
            last_write_sectors: write_sectors,
            last_time: Instant::now(),
            read_mbs: 0.0,
            write_mbs: 0.0,
        }
    }

    pub fn refresh(&mut self) -> Result<()> {
        let (read_sectors, write_sectors) = match Self::read_disk_stats() {
            Ok(counters) => counters,
            Err(e) if cfg!(target_os = "linux") => {
                return Err(DashboardError::source_unavailable(format!(
                    "cannot read {}: {}",
                    DISKSTATS_PATH, e
                )));
            }
            // No diskstats outside Linux, throughput stays at zero
            Err(_) => (0, 0),
        };
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_time).as_secs_f64();

        if elapsed > 0.0 {
            let read_delta = read_sectors.saturating_sub(self.last_read_sectors);
            let write_delta = write_sectors.saturating_sub(self.last_write_sectors);
            self.read_mbs = read_delta as f64 * SECTOR_BYTES / BYTES_PER_MB / elapsed;
            self.write_mbs = write_delta as f64 * SECTOR_BYTES / BYTES_PER_MB / elapsed;
        }

        self.last_read_sectors = read_sectors;
        self.last_write_sectors = write_sectors;
        self.last_time = now;
        Ok(())
    }

    /// Mounted partitions with a non-zero size, ordered by mount point
    pub fn partitions(&self) -> Vec<Partition> {
        let disks = Disks::new_with_refreshed_list();
        let mut partitions: Vec<Partition> = disks
            .list()
            .iter()
            .filter(|disk| disk.total_space() > 0)
            .map(|disk| {
                let total = disk.total_space();
                let used = total.saturating_sub(disk.available_space());
                Partition {
                    name: disk.mount_point().display().to_string(),
                    total_gib: total as f64 / BYTES_PER_GIB,
                    used_gib: used as f64 / BYTES_PER_GIB,
                }
            })
            .collect();
        partitions.sort_by(|a, b| a.name.cmp(&b.name));
        partitions.dedup_by(|a, b| a.name == b.name);
        partitions
    }

    pub fn reading(&mut self) -> Result<DiskReading> {
        self.refresh()?;
        let partitions = self.partitions();

        let total: f64 = partitions.iter().map(|p| p.total_gib).sum();
        let used: f64 = partitions.iter().map(|p| p.used_gib).sum();
        let usage_percent = if total > 0.0 {
            Percent::new(used / total * 100.0)
        } else {
            Percent::new(0.0)
        };

        Ok(DiskReading {
            usage_percent,
            read_speed_mbs: self.read_mbs,
            write_speed_mbs: self.write_mbs,
            partitions,
        })
    }

    /// Check if a device name represents a physical (whole) device rather than a partition.
    /// Handles traditional devices (sda, hda, vda), NVMe (nvme0n1), MMC (mmcblk0), etc.
    fn is_physical_device(device_name: &str) -> bool {
        if device_name.starts_with("loop")
            || device_name.starts_with("ram")
            || device_name.starts_with("dm-")
        {
            return false;
        }

        // NVMe and MMC partitions carry a 'p' before the partition number:
        // nvme0n1 / nvme0n1p1, mmcblk0 / mmcblk0p1
        if let Some(rest) = device_name.strip_prefix("nvme") {
            return match rest.find('n') {
                Some(n_pos) => !rest[n_pos + 1..]
                    .trim_start_matches(|c: char| c.is_ascii_digit())
                    .starts_with('p'),
                None => true,
            };
        }
        if let Some(rest) = device_name.strip_prefix("mmcblk") {
            return !rest
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .starts_with('p');
        }

        // sda = base device, sda1 = partition
        device_name
            .chars()
            .last()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
    }

    /// Total sectors read/written across physical devices
    fn read_disk_stats() -> io::Result<(u64, u64)> {
        let content = fs::read_to_string(DISKSTATS_PATH)?;
        Ok(Self::parse_disk_stats(&content))
    }

    fn parse_disk_stats(content: &str) -> (u64, u64) {
        let mut total_read = 0u64;
        let mut total_write = 0u64;

        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 14 || !Self::is_physical_device(parts[2]) {
                continue;
            }

            // Field 6 is sectors read, field 10 is sectors written (1-indexed)
            if let (Ok(read), Ok(write)) = (parts[5].parse::<u64>(), parts[9].parse::<u64>()) {
                total_read += read;
                total_write += write;
            }
        }

        (total_read, total_write)
    }
}

impl Default for DiskMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_devices_exclude_partitions() {
        assert!(DiskMonitor::is_physical_device("sda"));
        assert!(!DiskMonitor::is_physical_device("sda1"));
        assert!(DiskMonitor::is_physical_device("nvme0n1"));
        assert!(!DiskMonitor::is_physical_device("nvme0n1p2"));
        assert!(DiskMonitor::is_physical_device("mmcblk0"));
        assert!(!DiskMonitor::is_physical_device("mmcblk0p1"));
        assert!(!DiskMonitor::is_physical_device("loop3"));
        assert!(!DiskMonitor::is_physical_device("dm-0"));
    }

    #[test]
    fn diskstats_sums_whole_devices_only() {
        let content = "\
   8       0 sda 100 0 2000 0 50 0 1000 0 0 0 0 0 0 0 0
   8       1 sda1 90 0 1800 0 40 0 900 0 0 0 0 0 0 0 0
 259       0 nvme0n1 10 0 300 0 5 0 70 0 0 0 0 0 0 0 0
   7       0 loop0 1 0 8 0 0 0 0 0 0 0 0 0 0 0 0
";
        assert_eq!(DiskMonitor::parse_disk_stats(content), (2300, 1070));
    }
}

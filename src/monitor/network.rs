use std::fs;
use std::time::Instant;

use sysinfo::{NetworkData, Networks};

use super::BYTES_PER_MB;
use crate::error::{DashboardError, Result};
use crate::snapshot::{NetworkInterface, NetworkReading};

const LOOPBACK: &str = "lo";

/// Tracks interface byte counters to derive download/upload throughput
pub struct NetworkMonitor {
    last_received: u64,
    last_transmitted: u64,
    last_time: Instant,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        let (received, transmitted) = Self::totals(&Networks::new_with_refreshed_list());
        Self {
            last_received: received,
            last_transmitted: transmitted,
            last_time: Instant::now(),
        }
    }

    fn totals(networks: &Networks) -> (u64, u64) {
        networks
            .list()
            .iter()
            .filter(|(name, _)| name.as_str() != LOOPBACK)
            .fold((0, 0), |(rx, tx), (_, data)| {
                (rx + data.total_received(), tx + data.total_transmitted())
            })
    }

    /// Reads /sys/class/net/<name>/operstate; "unknown" counts as up for
    /// point-to-point devices that never report a carrier
    fn link_is_up(name: &str) -> bool {
        fs::read_to_string(format!("/sys/class/net/{}/operstate", name))
            .map(|state| matches!(state.trim(), "up" | "unknown"))
            .unwrap_or(false)
    }

    /// Prefers an IPv4 address, falls back to the first address of any family
    fn address(data: &NetworkData) -> Option<String> {
        let networks = data.ip_networks();
        networks
            .iter()
            .find(|network| network.addr.is_ipv4())
            .or_else(|| networks.first())
            .map(|network| network.addr.to_string())
    }

    fn interface(name: &str, data: &NetworkData) -> NetworkInterface {
        match Self::address(data) {
            // An up link without an address is reported as down
            Some(ip) if Self::link_is_up(name) => NetworkInterface::up(name, ip),
            _ => NetworkInterface::down(name),
        }
    }

    pub fn reading(&mut self) -> Result<NetworkReading> {
        let networks = Networks::new_with_refreshed_list();
        if networks.list().is_empty() {
            return Err(DashboardError::source_unavailable("no network interfaces reported"));
        }

        let (received, transmitted) = Self::totals(&networks);
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_time).as_secs_f64();

        let (download_speed_mbs, upload_speed_mbs) = if elapsed > 0.0 {
            (
                received.saturating_sub(self.last_received) as f64 / BYTES_PER_MB / elapsed,
                transmitted.saturating_sub(self.last_transmitted) as f64 / BYTES_PER_MB / elapsed,
            )
        } else {
            (0.0, 0.0)
        };

        self.last_received = received;
        self.last_transmitted = transmitted;
        self.last_time = now;

        let mut interfaces: Vec<NetworkInterface> = networks
            .list()
            .iter()
            .filter(|(name, _)| name.as_str() != LOOPBACK)
            .map(|(name, data)| Self::interface(name, data))
            .collect();
        interfaces.sort_by(|a, b| a.name().cmp(b.name()));

        Ok(NetworkReading {
            download_speed_mbs,
            upload_speed_mbs,
            interfaces,
        })
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

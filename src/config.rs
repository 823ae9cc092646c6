//! Dashboard configuration, read from an INI file.
//!
//! ```ini
//! [general]
//! RefreshInterval=5
//! Source=synthetic
//! LogLevel=info
//!
//! [display]
//! ProcessCount=15
//!
//! [alerts]
//! CpuWarning=75
//! CpuCritical=90
//! ```
//!
//! Missing keys take their defaults. Values that do not parse fall back to the default with
//! a warning; values that parse but are out of range are rejected.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use serde::Serialize;
use tracing::{debug, warn};

use crate::alerts::{AlertThresholds, Threshold};
use crate::error::{DashboardError, Result};
use crate::generator::DEFAULT_PROCESS_LIMIT;
use crate::source::SourceKind;

pub const CONFIG_FILE_NAME: &str = "sysdash.ini";

/// Supported refresh intervals in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u64")]
pub enum RefreshInterval {
    One = 1,
    #[default]
    Five = 5,
    Ten = 10,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 3] = [Self::One, Self::Five, Self::Ten];

    pub fn from_secs(seconds: u64) -> Result<Self> {
        match seconds {
            1 => Ok(Self::One),
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            other => Err(DashboardError::invalid_config(format!(
                "refresh interval must be 1, 5 or 10 seconds, got {}",
                other
            ))),
        }
    }

    pub fn as_secs(&self) -> u64 {
        *self as u64
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::One => "1s",
            Self::Five => "5s",
            Self::Ten => "10s",
        }
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> Self {
        interval.as_secs()
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = DashboardError;

    fn try_from(seconds: u64) -> Result<Self> {
        Self::from_secs(seconds)
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshConfig {
    pub interval: RefreshInterval,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub source: SourceKind,
    pub log_level: String,
    /// Processes kept per snapshot
    pub process_count: usize,
    pub alerts: AlertThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            source: SourceKind::default(),
            log_level: "info".to_string(),
            process_count: DEFAULT_PROCESS_LIMIT,
            alerts: AlertThresholds::default(),
        }
    }
}

impl Config {
    /// Load `path`, or the defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| DashboardError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_ini(&ini)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let defaults = Self::default();
        let general = ini.section(Some("general"));
        let display = ini.section(Some("display"));
        let alerts = ini.section(Some("alerts"));

        let interval_secs = parse_field(
            general,
            "RefreshInterval",
            defaults.refresh.interval.as_secs(),
        );
        let source = match general.and_then(|s| s.get("Source")) {
            Some(value) => value.parse()?,
            None => defaults.source,
        };

        let threshold = |prefix: &str, default: Threshold| {
            Threshold::new(
                parse_field(alerts, &format!("{}Warning", prefix), default.warning),
                parse_field(alerts, &format!("{}Critical", prefix), default.critical),
            )
        };

        let config = Self {
            refresh: RefreshConfig {
                interval: RefreshInterval::from_secs(interval_secs)?,
            },
            source,
            log_level: general
                .and_then(|s| s.get("LogLevel"))
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.log_level),
            process_count: parse_field(display, "ProcessCount", defaults.process_count),
            alerts: AlertThresholds {
                cpu: threshold("Cpu", defaults.alerts.cpu),
                memory: threshold("Memory", defaults.alerts.memory),
                disk: threshold("Disk", defaults.alerts.disk),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(DashboardError::invalid_config(
                "process count must be greater than 0",
            ));
        }
        self.alerts.validate()
    }

    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("general"))
            .set("RefreshInterval", self.refresh.interval.as_secs().to_string())
            .set("Source", self.source.as_str())
            .set("LogLevel", self.log_level.as_str());
        ini.with_section(Some("display"))
            .set("ProcessCount", self.process_count.to_string());
        ini.with_section(Some("alerts"))
            .set("CpuWarning", self.alerts.cpu.warning.to_string())
            .set("CpuCritical", self.alerts.cpu.critical.to_string())
            .set("MemoryWarning", self.alerts.memory.warning.to_string())
            .set("MemoryCritical", self.alerts.memory.critical.to_string())
            .set("DiskWarning", self.alerts.disk.warning.to_string())
            .set("DiskCritical", self.alerts.disk.critical.to_string());
        ini
    }

    /// Write the configuration, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }
}

fn parse_field<T: FromStr + fmt::Display>(
    section: Option<&Properties>,
    key: &str,
    default: T,
) -> T {
    let Some(raw) = section.and_then(|s| s.get(key)) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("ignoring unparseable {}={:?}, using {}", key, raw, default);
            default
        }
    }
}

/// Config file location, in order of preference:
/// 1. ./sysdash.ini (current directory)
/// 2. <user config dir>/sysdash/sysdash.ini
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }

    if let Some(dirs) = directories::BaseDirs::new() {
        return dirs.config_dir().join("sysdash").join(CONFIG_FILE_NAME);
    }

    local
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config> {
        let ini = Ini::load_from_str(text).expect("valid ini syntax");
        Config::from_ini(&ini)
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
        assert_eq!(Config::default().refresh.interval, RefreshInterval::Five);
    }

    #[test]
    fn reads_every_section() {
        let config = parse(
            "[general]\nRefreshInterval=10\nSource=system\nLogLevel=debug\n\
             [display]\nProcessCount=5\n\
             [alerts]\nCpuWarning=60\nCpuCritical=85\n",
        )
        .unwrap();
        assert_eq!(config.refresh.interval, RefreshInterval::Ten);
        assert_eq!(config.source, SourceKind::System);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.process_count, 5);
        assert_eq!(config.alerts.cpu, Threshold::new(60.0, 85.0));
        assert_eq!(config.alerts.memory, AlertThresholds::default().memory);
    }

    #[test]
    fn out_of_set_interval_is_rejected() {
        let err = parse("[general]\nRefreshInterval=3\n").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }

    #[test]
    fn garbage_values_fall_back_to_defaults() {
        let config = parse("[general]\nRefreshInterval=soon\n[display]\nProcessCount=lots\n").unwrap();
        assert_eq!(config.refresh.interval, RefreshInterval::Five);
        assert_eq!(config.process_count, DEFAULT_PROCESS_LIMIT);
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(parse("[general]\nSource=snmp\n").is_err());
    }

    #[test]
    fn interval_set_is_exactly_one_five_ten() {
        for secs in 0..=20 {
            let accepted = RefreshInterval::from_secs(secs).is_ok();
            assert_eq!(accepted, matches!(secs, 1 | 5 | 10), "interval {}", secs);
        }
        assert_eq!(RefreshInterval::Ten.as_duration(), Duration::from_secs(10));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = Config {
            refresh: RefreshConfig {
                interval: RefreshInterval::One,
            },
            process_count: 8,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, Config::default());
    }
}

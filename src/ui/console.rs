//! Plain-text rendering of dashboard events, and the commands typed back at it.

use std::fmt::Write as _;
use std::io::{self, Write};

use tracing::warn;

use crate::alerts::{Alert, AlertLevel};
use crate::error::Result;
use crate::history::{HistoryPoint, Series, SeriesSample};
use crate::scheduler::DashboardEvent;
use crate::snapshot::{LinkState, Snapshot};

/// Writes one line per event to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleRenderer {
    json: bool,
}

impl ConsoleRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render(&self, event: &DashboardEvent, alerts: &[Alert]) -> Result<()> {
        match event {
            DashboardEvent::SnapshotUpdated(snapshot) => {
                let line = if self.json {
                    snapshot.to_json()?
                } else {
                    summary_line(snapshot, alerts)
                };
                print_line(&line)?;
            }
            DashboardEvent::RefreshFailed { reason } => {
                warn!("refresh failed: {}", reason);
            }
            DashboardEvent::IntervalChanged(interval) => {
                if !self.json {
                    print_line(&format!("refresh interval is now {}", interval))?;
                }
            }
        }
        Ok(())
    }

    pub fn render_history(&self, series: Series, points: &[HistoryPoint<SeriesSample>]) -> Result<()> {
        if self.json {
            return print_line(&serde_json::to_string(points)?);
        }
        let values: Vec<String> = points.iter().map(|p| format_sample(&p.value)).collect();
        print_line(&format!("{} ({} points): {}", series, points.len(), values.join(" ")))
    }

    pub fn render_alerts(&self, alerts: &[Alert]) -> Result<()> {
        if self.json {
            return print_line(&serde_json::to_string(alerts)?);
        }
        if alerts.is_empty() {
            return print_line("no alerts");
        }
        for alert in alerts {
            print_line(&format!("[{}] {}", level_tag(alert.level), alert.message))?;
        }
        Ok(())
    }
}

fn print_line(line: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}

fn level_tag(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Warning => "warn",
        AlertLevel::Critical => "crit",
    }
}

fn format_sample(sample: &SeriesSample) -> String {
    match sample {
        SeriesSample::Usage(value) => format!("{:.0}", value),
        SeriesSample::Disk(t) => format!("{:.1}/{:.1}", t.read, t.write),
        SeriesSample::Network(t) => format!("{:.1}/{:.1}", t.download, t.upload),
    }
}

/// `cpu 45% (moderate, 58C) | mem 6.2/15.8 GiB | disk 35% r 3.1 w 1.2 MB/s | ...`
pub(crate) fn summary_line(snapshot: &Snapshot, alerts: &[Alert]) -> String {
    let cpu = &snapshot.cpu;
    let memory = &snapshot.memory;
    let disk = &snapshot.disk;
    let network = &snapshot.network;
    let processes = &snapshot.processes;

    let mut line = format!(
        "{} cpu {:.0}% ({}, {}C) | mem {:.1}/{:.1} GiB | disk {:.0}% r {:.1} w {:.1} MB/s | \
         net down {:.2} up {:.2} MB/s",
        snapshot.taken_at.format("%H:%M:%S"),
        cpu.usage_percent.get(),
        cpu.utilization_level(),
        cpu.temperature_celsius,
        memory.used_gib,
        memory.total_gib,
        disk.usage_percent.get(),
        disk.read_speed_mbs,
        disk.write_speed_mbs,
        network.download_speed_mbs,
        network.upload_speed_mbs,
    );

    if let Some(load) = cpu.load_average {
        let _ = write!(line, " | load {:.2}", load.one);
    }
    if cpu.potential_bottleneck() {
        line.push_str(" !bottleneck");
    }
    if memory.swap_total_gib > 0.0 {
        let _ = write!(line, " | swap {:.0}%", memory.swap_percent().get());
    }

    let up: Vec<&str> = network
        .interfaces
        .iter()
        .filter(|i| i.state() == LinkState::Up)
        .map(|i| i.name())
        .collect();
    if !up.is_empty() {
        let _ = write!(line, " [{}]", up.join(","));
    }

    let _ = write!(
        line,
        " | procs {} ({} running)",
        processes.total, processes.running
    );
    if let Some(top) = processes.list.first() {
        let _ = write!(line, " top {} {:.1}%", top.name, top.cpu_percent);
    }
    for alert in alerts {
        let _ = write!(line, " !{} {}", level_tag(alert.level), alert.resource.label());
    }
    line
}

/// A line typed on stdin while the dashboard runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Interval(u64),
    History(String),
    Alerts,
    ClearHistory,
    Quit,
    Help,
}

impl Command {
    pub const HELP: &'static str =
        "commands: r (refresh), i <1|5|10> (interval), h <cpu|memory|disk|network> (history), \
         a (alerts), c (clear history), q (quit)";

    /// `None` for blank or unrecognized input
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match words.next()? {
            "r" | "refresh" => Self::Refresh,
            "i" | "interval" => Self::Interval(words.next()?.parse().ok()?),
            "h" | "history" => Self::History(words.next()?.to_string()),
            "a" | "alerts" => Self::Alerts,
            "c" | "clear" => Self::ClearHistory,
            "q" | "quit" | "exit" => Self::Quit,
            "?" | "help" => Self::Help,
            _ => return None,
        };
        Some(command)
    }
}

use std::path::PathBuf;
use std::thread;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::model::DashboardModel;
use crate::scheduler::DashboardEvent;
use crate::ui::{Command, ConsoleRenderer};

/// How the host presents the dashboard
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Emit snapshots as JSON lines instead of summary lines
    pub json: bool,
    /// Write the last snapshot here on shutdown
    pub export: Option<PathBuf>,
    /// Read commands from stdin while running
    pub interactive: bool,
    /// Seed for the synthetic source
    pub seed: Option<u64>,
}

/// Main application state
pub struct App {
    model: DashboardModel,
    renderer: ConsoleRenderer,
    export_path: Option<PathBuf>,
    interactive: bool,
    is_monitoring: bool,
}

impl App {
    /// Open the configured source and take the first snapshot
    pub fn new(config: &Config, options: AppOptions) -> Result<Self> {
        let model = DashboardModel::from_config(config.source.open(options.seed), config)?;

        Ok(Self {
            model,
            renderer: ConsoleRenderer::new(options.json),
            export_path: options.export,
            interactive: options.interactive,
            is_monitoring: false,
        })
    }

    pub fn model(&self) -> &DashboardModel {
        &self.model
    }

    /// Print the current snapshot as pretty JSON
    pub fn print_snapshot(&self) -> Result<()> {
        println!("{}", self.model.current_snapshot().to_json_pretty()?);
        Ok(())
    }

    /// Render updates until `shutdown` flips to true or a quit command arrives.
    /// Must be called within a Tokio runtime.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut events = self.model.subscribe();
        let (command_tx, mut commands) = mpsc::channel(16);
        let mut commands_open = self.interactive;
        if self.interactive {
            spawn_stdin_reader(command_tx);
            println!("{}", Command::HELP);
        }

        self.model.start();
        self.is_monitoring = true;
        self.renderer.render(
            &DashboardEvent::SnapshotUpdated(self.model.current_snapshot()),
            &self.model.alerts(),
        )?;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutdown requested");
                        break;
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => self.renderer.render(&event, &self.model.alerts())?,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "renderer fell behind, skipping updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                line = commands.recv(), if commands_open => match line {
                    Some(line) => {
                        if !self.handle_line(&line).await? {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed");
                        commands_open = false;
                    }
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Returns false once the user asked to quit
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let Some(command) = Command::parse(line) else {
            if !line.trim().is_empty() {
                println!("{}", Command::HELP);
            }
            return Ok(true);
        };

        match command {
            Command::Refresh => {
                // Failures are already reported through the event stream
                let _ = self.model.refresh_now().await;
            }
            Command::Interval(seconds) => {
                if let Err(e) = self.model.set_refresh_interval(seconds) {
                    println!("{}", e);
                }
            }
            Command::History(name) => match name.parse() {
                Ok(series) => self
                    .renderer
                    .render_history(series, &self.model.history_for(series))?,
                Err(e) => println!("{}", e),
            },
            Command::Alerts => self.renderer.render_alerts(&self.model.alerts())?,
            Command::ClearHistory => self.model.reset_history(),
            Command::Help => println!("{}", Command::HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Clean shutdown
    pub fn shutdown(&mut self) {
        if self.is_monitoring {
            self.is_monitoring = false;
            self.model.stop();
        }

        if let Some(path) = self.export_path.take() {
            let written = self
                .model
                .current_snapshot()
                .to_json_pretty()
                .and_then(|json| Ok(std::fs::write(&path, json)?));
            match written {
                Ok(()) => info!("exported last snapshot to {}", path.display()),
                Err(e) => error!("failed to export snapshot to {}: {}", path.display(), e),
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Forward stdin lines on a plain thread; a blocking read would otherwise hold up runtime
/// shutdown.
fn spawn_stdin_reader(tx: mpsc::Sender<String>) {
    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sysdash::app::{App, AppOptions};
use sysdash::config::{default_config_path, Config, RefreshInterval};
use sysdash::error::Result;
use sysdash::source::SourceKind;

/// Live system resource dashboard
#[derive(Parser, Debug)]
#[command(name = "sysdash", version, about)]
struct Args {
    /// Refresh interval in seconds (1, 5 or 10)
    #[arg(short, long, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Config file (defaults to ./sysdash.ini, then the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Metrics source: synthetic or system
    #[arg(long)]
    source: Option<SourceKind>,

    /// Seed for the synthetic source
    #[arg(long)]
    seed: Option<u64>,

    /// Print one snapshot as JSON and exit
    #[arg(long)]
    once: bool,

    /// Emit every update as a JSON line
    #[arg(long)]
    json: bool,

    /// Write the final snapshot as pretty JSON on exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Save the effective configuration and exit
    #[arg(long)]
    write_config: bool,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Read commands (refresh, interval, history, alerts) from stdin
    #[arg(long)]
    interactive: bool,
}

fn load_config(args: &Args, path: &Path) -> Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(seconds) = args.interval {
        config.refresh.interval = RefreshInterval::from_secs(seconds)?;
    }
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args, config: Config, config_path: PathBuf) -> Result<()> {
    if args.write_config {
        config.save(&config_path)?;
        println!("Wrote configuration to {}", config_path.display());
        return Ok(());
    }

    let mut app = App::new(
        &config,
        AppOptions {
            json: args.json,
            export: args.export,
            interactive: args.interactive,
            seed: args.seed,
        },
    )?;

    if args.once {
        return app.print_snapshot();
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    }) {
        error!("failed to install Ctrl-C handler: {}", e);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    info!(
        source = %config.source,
        interval = %config.refresh.interval,
        "dashboard running"
    );
    runtime.block_on(app.run(shutdown_rx))?;

    // Stop the timer before the runtime goes away
    app.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = match load_config(&args, &config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log_level);
    info!("using configuration at {}", config_path.display());

    match run(args, config, config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sysdash: {}", e);
            ExitCode::FAILURE
        }
    }
}

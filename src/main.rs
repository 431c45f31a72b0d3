mod types;
mod analytics;
mod source;
mod config;
mod engine;
mod web;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{ConfigManager, MonitorConfig, SourceConfig};
use engine::Poller;
use source::{source_from_config, TradeSource};
use web::{start_dashboard_server, AppState, DashboardState, DashboardView};

#[derive(Parser)]
#[command(name = "trade-monitor")]
#[command(author = "Trading Bot")]
#[command(version)]
#[command(about = "Live performance monitor for a trading bot's trade log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "monitor.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read trades from this CSV file
    #[arg(long, global = true, conflicts_with = "sheet_id")]
    file: Option<PathBuf>,

    /// Read trades from this published spreadsheet
    #[arg(long, global = true)]
    sheet_id: Option<String>,

    /// Sub-sheet id of the published spreadsheet
    #[arg(long, global = true, default_value = "0")]
    gid: String,

    /// Strategy label to report on (exact match)
    #[arg(short, long, global = true, conflicts_with = "all_strategies")]
    strategy: Option<String>,

    /// Report on every row regardless of its Strategy label
    #[arg(long, global = true)]
    all_strategies: bool,

    /// Seconds between refreshes
    #[arg(short, long, global = true)]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the live dashboard
    Serve {
        /// Dashboard port (defaults to server.port from the config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the metrics to the terminal on every refresh
    Watch,
    /// Refresh once, print the result and exit
    Snapshot {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Output file path
        #[arg(short, long, default_value = "monitor.toml")]
        output: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Trade Monitor v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Serve { port } => {
            let (config, source) = prepare(&cli)?;
            let port = port.unwrap_or(config.server.port);
            run_dashboard(config, source, port).await?;
        }
        Commands::Watch => {
            let (config, source) = prepare(&cli)?;
            run_watch(config, source).await;
        }
        Commands::Snapshot { json } => {
            let (config, source) = prepare(&cli)?;
            run_snapshot(config, source, *json).await?;
        }
        Commands::InitConfig { output, force } => {
            write_default_config(Path::new(output), *force)?;
        }
    }

    Ok(())
}

/// Load and validate the configuration, then open the trade log it names.
fn prepare(cli: &Cli) -> Result<(MonitorConfig, Arc<dyn TradeSource>)> {
    let mut config = MonitorConfig::load(&cli.config)?;
    apply_overrides(&mut config, cli);
    config
        .validate()
        .map_err(|errors| anyhow!("invalid configuration: {}", errors.join(", ")))?;

    let source: Arc<dyn TradeSource> =
        Arc::from(source_from_config(&config.source, config.polling.fetch_timeout())?);
    info!("Trade log: {}", source.describe());

    Ok((config, source))
}

fn apply_overrides(config: &mut MonitorConfig, cli: &Cli) {
    if let Some(path) = &cli.file {
        config.source = SourceConfig::File { path: path.clone() };
    }
    if let Some(sheet_id) = &cli.sheet_id {
        config.source = SourceConfig::Sheet {
            sheet_id: sheet_id.clone(),
            gid: cli.gid.clone(),
        };
    }
    if cli.all_strategies {
        config.filter.strategy = None;
    } else if let Some(strategy) = &cli.strategy {
        config.filter.strategy = Some(strategy.clone());
    }
    if let Some(interval) = cli.interval {
        config.polling.interval_secs = interval;
    }
}

fn write_default_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    std::fs::write(output, MonitorConfig::default().to_toml()?)?;
    info!("Default configuration written to {}", output.display());
    Ok(())
}

async fn run_dashboard(config: MonitorConfig, source: Arc<dyn TradeSource>, port: u16) -> Result<()> {
    let dashboard = DashboardState::new(config.display.title.clone());
    let config_manager = Arc::new(ConfigManager::new(config));

    let poller = Poller::new(source, Arc::clone(&config_manager), dashboard.clone());
    let poller_task = tokio::spawn(poller.run());

    let state = AppState {
        dashboard,
        config_manager,
    };

    tokio::select! {
        result = start_dashboard_server(state, port) => result?,
        stopped = poller_task => match stopped {
            Err(e) => bail!("Poller stopped unexpectedly: {}", e),
            Ok(()) => bail!("Poller exited"),
        },
        _ = tokio::signal::ctrl_c() => info!("Shutting down dashboard"),
    }

    Ok(())
}

async fn run_watch(config: MonitorConfig, source: Arc<dyn TradeSource>) {
    let title = config.display.title.clone();
    let interval = config.polling.interval();
    let poller = Poller::new(
        source,
        Arc::new(ConfigManager::new(config)),
        DashboardState::new(title.clone()),
    );

    loop {
        let data = poller.refresh().await;

        // Redraw in place
        print!("\x1B[2J\x1B[H");
        println!("{}", title);
        data.view.print();
        if let Some(at) = data.refreshed_at {
            println!("Last refresh {} | next in {}s", at.format("%H:%M:%S"), interval.as_secs());
        }

        tokio::time::sleep(interval).await;
    }
}

async fn run_snapshot(config: MonitorConfig, source: Arc<dyn TradeSource>, json: bool) -> Result<()> {
    let title = config.display.title.clone();
    let poller = Poller::new(
        source,
        Arc::new(ConfigManager::new(config)),
        DashboardState::new(title),
    );

    let data = poller.refresh().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        data.view.print();
    }

    if let DashboardView::Unavailable { source, message } = &data.view {
        bail!("{} unavailable: {}", source, message);
    }
    Ok(())
}

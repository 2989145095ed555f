mod api;
mod clock;
mod config;
mod diff;
mod errors;
mod models;
mod notifier;
mod pipeline;
mod scheduler;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::pipeline::Monitor;
use crate::scheduler::Scheduler;
use crate::storage::SnapshotStore;

#[derive(Parser)]
#[command(
    name = "listing-monitor",
    about = "Watches a paginated shop listing and reports items that disappear",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// What to run when no subcommand is given
    #[arg(long, value_enum, default_value_t = Mode::Both)]
    mode: Mode,

    #[command(flatten)]
    overrides: Overrides,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Force one scrape + diff now and print the result as JSON
    Check,

    /// Show the stored current/previous snapshots and what sold between them
    Show,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// HTTP API only
    Api,
    /// Background loop only
    Monitor,
    /// API and background loop
    Both,
}

/// Flags that win over config files and MONITOR_* variables.
#[derive(Args)]
struct Overrides {
    /// Seconds between scrapes
    #[arg(long, env = "SCRAPE_INTERVAL", global = true)]
    interval: Option<u64>,

    /// API listen port
    #[arg(long, env = "PORT", global = true)]
    port: Option<u16>,

    #[arg(long, env = "BUSINESS_START", global = true)]
    business_start: Option<u32>,

    #[arg(long, env = "BUSINESS_END", global = true)]
    business_end: Option<u32>,

    /// Webhook for sold-item alerts; empty disables notifications
    #[arg(long, env = "DISCORD_WEBHOOK", global = true)]
    webhook_url: Option<String>,

    /// Directory holding the snapshot files
    #[arg(long, global = true)]
    data_dir: Option<std::path::PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(v) = self.interval {
            config.schedule.interval_secs = v;
        }
        if let Some(v) = self.port {
            config.api.port = v;
        }
        if let Some(v) = self.business_start {
            config.schedule.business_start = v;
        }
        if let Some(v) = self.business_end {
            config.schedule.business_end = v;
        }
        if let Some(v) = self.webhook_url {
            config.notifier.webhook_url = v;
        }
        if let Some(v) = self.data_dir {
            config.storage.data_dir = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "listing_monitor=info,tower_http=info,warn",
        1 => "listing_monitor=debug,tower_http=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = AppConfig::load()?;
    cli.overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Some(Command::Check) => {
            let monitor = Monitor::from_config(config).context("Failed to build monitor")?;
            let report = monitor.force_check().await.context("Force check failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Some(Command::Show) => {
            let store = SnapshotStore::open(&config.storage.data_dir)?;
            let current = store.read_current()?;
            let previous = store.read_previous()?;

            println!("─────────────────────────────────");
            println!("  Listing monitor: stored snapshots");
            println!("─────────────────────────────────");
            for (label, snap) in [("Current ", &current), ("Previous", &previous)] {
                match snap {
                    Some(s) => println!(
                        "  {} : {} items, {} clicks, {} ({})",
                        label,
                        s.count(),
                        s.expansions,
                        s.captured_at.to_rfc3339(),
                        s.source
                    ),
                    None => println!("  {} : -", label),
                }
            }
            if let Some(cur) = &current {
                let sold = diff::sold(previous.as_ref(), cur);
                let sold: Vec<&str> = sold.iter().map(String::as_str).collect();
                println!(
                    "  Sold     : {}",
                    if sold.is_empty() { "-".to_string() } else { sold.join(", ") }
                );
            }
            println!("─────────────────────────────────");
        }

        None => run(config, cli.mode).await?,
    }

    Ok(())
}

async fn run(config: AppConfig, mode: Mode) -> Result<()> {
    info!("Listing monitor starting");
    info!("Mode: {:?}", mode);
    info!("Target: {} ({:?} driver)", config.scraper.target_url, config.scraper.driver);
    info!(
        "Business hours: {} {}",
        config.business_hours_label(),
        config.schedule.timezone
    );
    info!("Check interval: {}s", config.schedule.interval_secs);
    info!(
        "Notifications: {}",
        if config.notifications_enabled() { "enabled" } else { "disabled" }
    );

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let monitor = Arc::new(Monitor::from_config(config).context("Failed to build monitor")?);

    let loop_handle = match mode {
        Mode::Monitor | Mode::Both => Some(Scheduler::new(Arc::clone(&monitor)).spawn()),
        Mode::Api => None,
    };

    match mode {
        Mode::Api | Mode::Both => {
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Starting API server on {}", addr);
            axum::serve(listener, api::build_router(monitor))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("API server failed")?;
        }
        Mode::Monitor => {
            info!("Monitor-only mode, no API server");
            shutdown_signal().await;
        }
    }

    if let Some(handle) = loop_handle {
        handle.abort();
    }
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

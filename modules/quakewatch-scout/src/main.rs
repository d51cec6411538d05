use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quakewatch_archive::{Archive, ArchiveConfig, CapabilityProfile};
use quakewatch_common::ScoutConfig;
use quakewatch_scout::{InvocationContext, RunResponse, Scout};
use quakewatch_store::{MemorySnapshotStore, PgSnapshotStore, SnapshotStore};

#[derive(Parser)]
#[command(name = "quakewatch", about = "Scrape the IGP reported-earthquakes page into a snapshot store")]
struct Cli {
    /// Fetch profile: plain, js-rendered-proxy or headless-browser
    #[arg(long)]
    profile: Option<CapabilityProfile>,

    /// Page to scrape, overriding TARGET_URL
    #[arg(long)]
    target_url: Option<String>,

    /// Snapshot backend. Defaults to postgres when DATABASE_URL is set
    #[arg(long, value_enum)]
    store: Option<StoreKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one invocation and print the response
    Run,
    /// Re-run on a fixed interval until interrupted
    Watch {
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    Memory,
    Postgres,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let mut config = ScoutConfig::from_env()?;
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    if let Some(url) = cli.target_url {
        config.target_url = url;
    }
    config.log_redacted();

    let fetcher = Archive::new(ArchiveConfig::from(&config)).context("Failed to build page fetcher")?;
    let store = build_store(cli.store, &config).await?;
    let scout = Scout::new(Arc::new(fetcher), store, config);

    match cli.command {
        Command::Run => {
            let response = scout.run(&InvocationContext::new("run")).await;
            print_response(&response)?;
            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Command::Watch { interval_secs } => {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs, "Watching");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let response = scout.run(&InvocationContext::new("watch")).await;
                        print_response(&response)?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping watch");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("quakewatch=info".parse()?);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

async fn build_store(kind: Option<StoreKind>, config: &ScoutConfig) -> Result<Arc<dyn SnapshotStore>> {
    let kind = kind.unwrap_or(match config.database_url {
        Some(_) => StoreKind::Postgres,
        None => StoreKind::Memory,
    });

    match kind {
        StoreKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let store = PgSnapshotStore::connect_lazy(url)?;
            if let Err(e) = store.migrate().await {
                warn!(error = %e, "Snapshot store migrations failed; runs will report persistence failures");
            }
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            if config.database_url.is_none() {
                warn!("DATABASE_URL not set, records are kept in memory only");
            }
            Ok(Arc::new(MemorySnapshotStore::new()))
        }
    }
}

fn print_response(response: &RunResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

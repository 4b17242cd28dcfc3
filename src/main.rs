//! CLI entry point for the forecast combiner.
//!
//! Provides subcommands for fetching provider forecasts into per-provider
//! artifacts, combining available artifacts per location, and doing both in
//! one run. Scheduling is left to cron or a systemd timer.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vader_combiner::{
    collect::{FetchSummary, fetch_all},
    config::AppConfig,
    consensus::driver::combine_all,
    providers::{ApiKeys, ProviderId, build_providers},
};

#[derive(Parser)]
#[command(name = "vader_combiner")]
#[command(about = "Combine hourly forecasts from several weather providers", long_about = None)]
struct Cli {
    /// JSON config file (locations, provider priority, artifact names)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the config
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch provider forecasts and write one artifact per provider and location
    Fetch {
        /// Only fetch these providers (repeatable); default is every configured provider
        #[arg(short, long = "provider", value_name = "ID")]
        providers: Vec<ProviderId>,

        /// Maximum number of concurrent requests
        #[arg(short = 'j', long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Combine existing artifacts into combined_<location>.json and combined.json
    Combine,
    /// Fetch, then combine
    Run {
        /// Only fetch these providers (repeatable)
        #[arg(short, long = "provider", value_name = "ID")]
        providers: Vec<ProviderId>,

        /// Maximum number of concurrent requests
        #[arg(short = 'j', long, default_value_t = 4)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/vader_combiner.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("vader_combiner.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    config.validate()?;

    match cli.command {
        Commands::Fetch {
            providers,
            concurrency,
        } => {
            fetch(&config, &providers, concurrency).await?;
        }
        Commands::Combine => {
            combine(&config)?;
        }
        Commands::Run {
            providers,
            concurrency,
        } => {
            fetch(&config, &providers, concurrency).await?;
            combine(&config)?;
        }
    }

    Ok(())
}

/// Filter from `var`, or `default` when the variable is unset or invalid.
fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

async fn fetch(config: &AppConfig, only: &[ProviderId], concurrency: usize) -> Result<FetchSummary> {
    let (providers, skipped) = build_providers(config, &ApiKeys::from_env(), only)?;
    if providers.is_empty() {
        warn!("No providers to fetch");
    }

    let mut summary = fetch_all(config, providers, concurrency).await?;
    summary.skipped = skipped.len();

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        data_dir = %config.data_dir.display(),
        "Fetch finished"
    );
    Ok(summary)
}

fn combine(config: &AppConfig) -> Result<()> {
    let (_, summaries) = combine_all(config)?;

    for s in &summaries {
        info!(
            location = %s.location,
            providers = s.providers,
            entries = s.entries,
            "Location summary"
        );
    }

    let empty = summaries.iter().filter(|s| s.entries == 0).count();
    info!(
        locations = summaries.len(),
        empty,
        "Combine finished"
    );
    Ok(())
}

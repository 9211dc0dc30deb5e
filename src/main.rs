//! gw2walls main entry point
//!
//! This is the command-line interface for the gw2walls wallpaper harvester.

use anyhow::Context;
use clap::Parser;
use gw2walls::config::{config_fingerprint, load_config, validate, Config};
use gw2walls::crawler::HttpFetcher;
use gw2walls::download::print_report;
use gw2walls::pipeline::run_pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// gw2walls: find and download Guild Wars 2 wallpapers
///
/// Scans the releases index and the media page for wallpaper links and
/// downloads every one matching the requested dimension.
#[derive(Parser, Debug)]
#[command(name = "gw2walls")]
#[command(version)]
#[command(about = "Find and download Guild Wars 2 wallpapers", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Dimensions of the wallpapers to download (e.g. 1920x1080)
    #[arg(short, long)]
    dimension: Option<String>,

    /// Directory to download files to
    #[arg(short, long, value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Skip media wallpapers
    #[arg(long)]
    skip_media: bool,

    /// Skip release wallpapers
    #[arg(long, alias = "skip-release")]
    skip_releases: bool,

    /// Maximum number of concurrent downloads
    #[arg(short = 'j', long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Keep files that already exist instead of overwriting them
    #[arg(long)]
    no_overwrite: bool,

    /// Append a short hash of the source URL to every file name
    #[arg(long)]
    disambiguate_names: bool,

    /// Cancel the whole run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Exit with a non-zero status if any download failed
    #[arg(long)]
    fail_on_error: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dimension) = &self.dimension {
            config.download.dimension = dimension.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.download.output_path = output_path.clone();
        }
        if let Some(max_parallel) = self.max_parallel {
            config.download.max_parallel = max_parallel;
        }
        if self.skip_media {
            config.crawler.skip_media = true;
        }
        if self.skip_releases {
            config.crawler.skip_releases = true;
        }
        if self.no_overwrite {
            config.download.overwrite_existing = false;
        }
        if self.disambiguate_names {
            config.download.disambiguate_names = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if config.download.output_path.is_relative() {
        let cwd = std::env::current_dir().context("Failed to read working directory")?;
        config.download.output_path = cwd.join(&config.download.output_path);
    }

    let fingerprint = config_fingerprint(&config)?;
    tracing::info!(
        "Dimensions: {} Path: {} (config {})",
        config.download.dimension,
        config.download.output_path.display(),
        &fingerprint[..12]
    );

    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)
        .context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, cli.timeout);

    let report = run_pipeline(&config, Arc::new(fetcher), cancel).await?;

    if !cli.quiet {
        print_report(&report.download);
    }

    if cli.fail_on_error && !report.is_success() {
        tracing::error!(
            "{} downloads failed, {} cancelled",
            report.download.failed,
            report.download.cancelled
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gw2walls=info,warn"),
            1 => EnvFilter::new("gw2walls=debug,info"),
            2 => EnvFilter::new("gw2walls=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the run on Ctrl-C and, if set, after the overall deadline
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout_secs: Option<u64>) {
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding work");
            on_interrupt.cancel();
        }
    });

    if let Some(secs) = timeout_secs {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = on_deadline.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    tracing::warn!("Run deadline of {}s reached, cancelling", secs);
                    on_deadline.cancel();
                }
            }
        });
    }
}

//! Audio-Harvest main entry point
//!
//! This is the command-line interface for the Audio-Harvest listing crawler
//! and batch downloader.

use anyhow::{bail, Context};
use audio_harvest::config::{load_config_with_hash, Config};
use audio_harvest::output::{
    consume_events, event_channel, print_crawl_summary, print_download_summary, print_entries,
};
use audio_harvest::{CrawlOrchestrator, DownloadOrchestrator, Entry, Fetcher};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Audio-Harvest: a paginated media listing crawler
///
/// Audio-Harvest crawls a run of listing pages in parallel, merges the
/// entries it finds in page order, and downloads a selected index range
/// with gap-free `NNN_title.mp3` numbering that continues across runs.
#[derive(Parser, Debug)]
#[command(name = "audio-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paginated media listing crawler and batch downloader", long_about = None)]
struct Cli {
    /// Listing URL to crawl
    #[arg(value_name = "URL", required_unless_present = "direct")]
    url: Option<String>,

    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First listing page to crawl
    #[arg(long, default_value_t = 1)]
    start_page: u32,

    /// Last listing page to crawl (defaults to the start page)
    #[arg(long)]
    end_page: Option<u32>,

    /// Width of the listing-page worker pool
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16))]
    crawl_workers: Option<u32>,

    /// Width of the download worker pool
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16))]
    download_workers: Option<u32>,

    /// First entry index to download (1-based)
    #[arg(long, default_value_t = 1)]
    from: usize,

    /// Last entry index to download (defaults to the last entry)
    #[arg(long)]
    to: Option<usize>,

    /// Destination directory (overrides the configured one)
    #[arg(short, long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Crawl and list entries without downloading
    #[arg(long, conflicts_with = "direct")]
    list_only: bool,

    /// Download these asset URLs directly instead of crawling
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with = "url")]
    direct: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let fetcher = Fetcher::new().context("failed to build HTTP client")?;
    let (sink, stream) = event_channel();
    let consumer = tokio::spawn(consume_events(stream));

    let entries = if cli.direct.is_empty() {
        let Some(base_url) = cli.url.as_deref() else {
            bail!("a listing URL is required unless --direct is given");
        };
        let end_page = cli.end_page.unwrap_or(cli.start_page);

        let mut orchestrator =
            CrawlOrchestrator::new(&config, fetcher.clone())?.with_events(sink.clone());
        if let Some(workers) = cli.crawl_workers {
            orchestrator = orchestrator.with_concurrency(workers);
        }

        let report = orchestrator
            .crawl(base_url, cli.start_page, end_page)
            .await
            .context("crawl failed")?;

        print_crawl_summary(&report);
        print_entries(&report.entries);
        report.entries
    } else {
        tracing::info!("Direct mode: {} URLs", cli.direct.len());
        Entry::direct_list(cli.direct.iter().cloned())
    };

    if cli.list_only || entries.is_empty() {
        drop(sink);
        consumer.await?;
        return Ok(());
    }

    let destination = cli
        .dest
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.download.destination));
    let to = cli.to.unwrap_or(entries.len());

    let mut orchestrator = DownloadOrchestrator::new(&config, fetcher)?.with_events(sink);
    if let Some(workers) = cli.download_workers {
        orchestrator = orchestrator.with_concurrency(workers);
    }

    let report = orchestrator
        .download_range(&entries, cli.from, to, &destination)
        .await
        .context("download failed")?;

    // The orchestrator holds the last sink; dropping it lets the consumer finish
    drop(orchestrator);
    let tally = consumer.await?;
    tracing::debug!(
        "Events: {} dispatched, {} succeeded, {} failed",
        tally.dispatched,
        tally.succeeded,
        tally.failed
    );

    print_download_summary(&report);

    if report.failed > 0 && report.succeeded == 0 {
        bail!("all {} downloads failed", report.failed);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("audio_harvest=info,warn"),
            1 => EnvFilter::new("audio_harvest=debug,info"),
            2 => EnvFilter::new("audio_harvest=trace,debug"),
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

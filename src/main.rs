//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest crawl engine.

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::crawler::{selector_extractor, ItemHook};
use sumi_harvest::output::{load_statistics, print_statistics, Record};
use sumi_harvest::{CrawlMode, Crawler, Page, SqliteLinkStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a resumable crawl engine
///
/// Sumi-Harvest crawls the sites named in a TOML configuration, follows links
/// that match the configured domains and paths, and writes one JSON record
/// per page using the `[extract]` selectors.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, configurable crawl engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Keep the existing frontier and continue where the last crawl stopped
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Clear the provider's frontier before crawling
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and print the effective settings without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show frontier statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.fresh {
        config.mode = CrawlMode::StartFromScratch;
    } else if cli.resume {
        config.mode = CrawlMode::Continue;
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
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

/// Handles --dry-run: prints the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    sumi_harvest::config::validate(config)?;

    println!("=== Sumi-Harvest Dry Run ===\n");
    print!("{}", toml::to_string_pretty(config)?);
    println!();
    println!("Allowed domains: {}", config.allowed_domains().join(", "));
    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling '{}' from {} entry URLs",
        config.name,
        config.entry_urls.len()
    );

    Ok(())
}

/// Handles --stats: shows frontier statistics for the configured provider
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.sqlite_path.display());

    let store = SqliteLinkStore::new(&config.output.sqlite_path).with_context(|| {
        format!(
            "Cannot open link store at {}",
            config.output.sqlite_path.display()
        )
    })?;
    let stats = load_statistics(&store, &config.name)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    match config.mode {
        CrawlMode::StartFromScratch => tracing::info!("Starting fresh crawl"),
        CrawlMode::Continue => tracing::info!("Continuing previous crawl"),
    }
    tracing::info!("Entry URLs: {}", config.entry_urls.len());

    let on_item_crawled: ItemHook = if config.extract.is_empty() {
        Arc::new(|page: &Page| {
            let mut record = Record::new();
            record.insert("url".to_string(), json!(page.url));
            Some(record)
        })
    } else {
        selector_extractor(&config.extract)?
    };

    let mut crawler = Crawler::builder(config)
        .hooks(sumi_harvest::Hooks {
            on_item_crawled: Some(on_item_crawled),
            ..Default::default()
        })
        .build()?;

    match crawler.crawl().await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully: {} pages processed, {} failed",
                report.pages_processed,
                report.pages_failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

//! Image-Harvester main entry point
//!
//! This is the command-line interface for the Image-Harvester crawler and downloader.

use anyhow::Context;
use clap::Parser;
use image_harvester::config::{load_config_with_hash, Config};
use image_harvester::crawler::{initial_seeds, Crawler};
use image_harvester::download::Downloader;
use image_harvester::output::{print_crawl_summary, print_download_summary, write_image_list};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Image-Harvester: a keyword-driven image crawler
///
/// Image-Harvester crawls image sites for a keyword while respecting
/// robots.txt, collects matching image URLs, and downloads them with
/// curl or wget.
#[derive(Parser, Debug)]
#[command(name = "image-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A keyword-driven image crawler and downloader", long_about = None)]
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

    /// Validate config and show the seed URLs without crawling
    #[arg(long, conflicts_with = "crawl_only")]
    dry_run: bool,

    /// Crawl and print the image URLs without downloading
    #[arg(long)]
    crawl_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, cli.crawl_only, !cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_harvester=info,warn"),
            1 => EnvFilter::new("image_harvester=debug,info"),
            2 => EnvFilter::new("image_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the configuration and the seed set
fn handle_dry_run(config: &Config) {
    println!("=== Image-Harvester Dry Run ===\n");

    println!("Keyword: {}", config.keyword);
    println!("Output directory: {}", config.output_dir().display());

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Rate limit: {}ms", config.crawler.rate_limit_ms);
    println!("  Queue capacity: {}", config.crawler.queue_capacity());
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Follow subdomains: {}", config.crawler.follow_subdomains);
    println!("  Ignore robots.txt: {}", config.crawler.ignore_robots);
    println!("  Skip thumbnails: {}", config.crawler.skip_thumbnails);

    println!("\nDownload:");
    println!("  Downloader: {:?}", config.download.downloader);
    if config.download.filters_dimensions() {
        println!(
            "  Minimum size: {}x{}",
            config.download.min_width, config.download.min_height
        );
    }

    let seeds = initial_seeds(config);
    println!("\nSeed URLs ({}):", seeds.len());
    for seed in &seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
    if seeds.is_empty() {
        println!("✗ No seed URLs; a crawl would fail");
    } else {
        println!("✓ Would start crawling with {} seed URLs", seeds.len());
    }
}

/// Handles the main crawl and download
async fn handle_harvest(config: Config, crawl_only: bool, show_progress: bool) -> anyhow::Result<()> {
    // Resolve external tools before any network work
    // The output directory is created by the first download, after tools resolve
    let downloader = if crawl_only {
        None
    } else {
        Some(Downloader::from_config(&config)?.with_progress(show_progress))
    };

    let crawler = Crawler::new(config)?.with_progress(show_progress);
    let crawl_summary = crawler.start().await.context("Crawl failed")?;
    let image_urls = crawler.image_urls();

    let Some(downloader) = downloader else {
        write_image_list(std::io::stdout().lock(), &image_urls)?;
        return Ok(());
    };

    if show_progress {
        print_crawl_summary(&crawl_summary);
        println!();
    }

    if image_urls.is_empty() {
        tracing::warn!("No images found, nothing to download");
        return Ok(());
    }

    let download_summary = downloader
        .download_images(&image_urls)
        .await
        .context("Download failed")?;

    if show_progress {
        print_download_summary(&download_summary, downloader.filters_dimensions());
        println!(
            "\nImages saved to: {}",
            downloader.output_dir().display()
        );
    }

    Ok(())
}

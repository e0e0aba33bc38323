//! Image downloader
//!
//! This module turns collected image URLs into files:
//! - One external transfer per URL, bounded by a semaphore
//! - Deterministic file names derived from the URL
//! - Removal of empty downloads and optional minimum-size filtering

mod backend;
mod filename;
mod probe;

pub use backend::{CurlBackend, TransferBackend, WgetBackend};
pub use filename::{extract_filename_from_url, sanitize_filename};
pub use probe::{parse_dimensions, DimensionProbe, IdentifyProbe};

use crate::config::{Config, DownloaderKind};
use crate::{HarvestError, Result};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Errors for a single image download
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("transfer of {url} failed: {message}")]
    Transfer { url: String, message: String },

    #[error("failed to run external command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("downloaded file is empty")]
    EmptyFile,

    #[error("cannot read dimensions of {}: {message}", path.display())]
    Probe { path: PathBuf, message: String },
}

/// Counters reported when a download batch finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Images saved, including files that already existed
    pub succeeded: usize,

    /// Transfers that failed, produced an empty file, or could not be probed
    pub failed: usize,

    /// Images removed for being below the minimum dimensions
    pub filtered: usize,

    /// Bytes written by this batch
    pub bytes: u64,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.filtered
    }
}

/// Result of downloading one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Saved(u64),
    Existing,
    Failed,
    Filtered,
}

/// Minimum image dimensions and the probe that checks them
struct DimensionFilter {
    min_width: u32,
    min_height: u32,
    probe: Arc<dyn DimensionProbe>,
}

impl DimensionFilter {
    fn rejects(&self, width: u32, height: u32) -> bool {
        (self.min_width > 0 && width < self.min_width)
            || (self.min_height > 0 && height < self.min_height)
    }
}

/// Settings shared by every download task of a batch
struct DownloadTarget {
    output_dir: PathBuf,
    backend: Arc<dyn TransferBackend>,
    filter: Option<DimensionFilter>,
}

impl DownloadTarget {
    async fn download_one(&self, url: &str) -> ItemOutcome {
        let filename = extract_filename_from_url(url);
        let path = self.output_dir.join(&filename);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("File already exists, skipping: {}", filename);
            return ItemOutcome::Existing;
        }

        if let Err(e) = self.backend.fetch(url, &path).await {
            tracing::debug!("Download failed for {}: {}", url, e);
            remove_quietly(&path).await;
            return ItemOutcome::Failed;
        }

        let size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::debug!("No file written for {}: {}", url, e);
                return ItemOutcome::Failed;
            }
        };

        if size == 0 {
            tracing::debug!("{}: {}", DownloadError::EmptyFile, url);
            remove_quietly(&path).await;
            return ItemOutcome::Failed;
        }

        if let Some(filter) = &self.filter {
            match filter.probe.dimensions(&path).await {
                Ok((width, height)) if filter.rejects(width, height) => {
                    tracing::debug!("Filtered {}: {}x{} (below minimum)", filename, width, height);
                    remove_quietly(&path).await;
                    return ItemOutcome::Filtered;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Failed to get dimensions for {}: {}", filename, e);
                    remove_quietly(&path).await;
                    return ItemOutcome::Failed;
                }
            }
        }

        ItemOutcome::Saved(size)
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Bounded-concurrency image downloader
pub struct Downloader {
    target: Arc<DownloadTarget>,
    concurrency: usize,
    show_progress: bool,
}

impl Downloader {
    /// Builds a downloader from the configuration, locating external tools
    ///
    /// # Returns
    ///
    /// * `Ok(Downloader)` - Tools found
    /// * `Err(HarvestError::ToolNotFound)` - The configured transfer tool is missing
    /// * `Err(HarvestError::NoTransferTool)` - `auto` found neither curl nor wget
    /// * `Err(HarvestError::ProbeUnavailable)` - Size filters set but `identify` is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        let crawler = &config.crawler;
        let user_agent = crawler.user_agent.as_str();

        let curl = |program: PathBuf| -> Arc<dyn TransferBackend> {
            Arc::new(CurlBackend::new(program, user_agent, crawler.timeout()))
        };
        let wget = |program: PathBuf| -> Arc<dyn TransferBackend> {
            Arc::new(WgetBackend::new(program, user_agent))
        };

        let backend = match config.download.downloader {
            DownloaderKind::Curl => curl(locate_tool("curl")?),
            DownloaderKind::Wget => wget(locate_tool("wget")?),
            DownloaderKind::Auto => match (which::which("curl"), which::which("wget")) {
                (Ok(program), _) => curl(program),
                (Err(_), Ok(program)) => wget(program),
                (Err(_), Err(_)) => return Err(HarvestError::NoTransferTool),
            },
        };
        tracing::info!("Using {} for downloads", backend.name());

        let mut downloader = Self::with_backend(config.output_dir(), crawler.concurrency, backend);

        if config.download.filters_dimensions() {
            let identify = which::which("identify").map_err(|_| HarvestError::ProbeUnavailable)?;
            downloader = downloader.with_dimension_filter(
                config.download.min_width,
                config.download.min_height,
                Arc::new(IdentifyProbe::new(identify)),
            );
        }

        Ok(downloader)
    }

    /// Creates a downloader around an explicit transfer backend
    pub fn with_backend(
        output_dir: impl Into<PathBuf>,
        concurrency: usize,
        backend: Arc<dyn TransferBackend>,
    ) -> Self {
        Self {
            target: Arc::new(DownloadTarget {
                output_dir: output_dir.into(),
                backend,
                filter: None,
            }),
            concurrency: concurrency.max(1),
            show_progress: false,
        }
    }

    /// Removes downloaded images smaller than the given size
    ///
    /// A zero bound disables that axis.
    pub fn with_dimension_filter(
        self,
        min_width: u32,
        min_height: u32,
        probe: Arc<dyn DimensionProbe>,
    ) -> Self {
        let filter = (min_width > 0 || min_height > 0).then(|| DimensionFilter {
            min_width,
            min_height,
            probe,
        });

        Self {
            target: Arc::new(DownloadTarget {
                output_dir: self.target.output_dir.clone(),
                backend: Arc::clone(&self.target.backend),
                filter,
            }),
            ..self
        }
    }

    /// Enables or disables the download progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.target.output_dir
    }

    pub fn filters_dimensions(&self) -> bool {
        self.target.filter.is_some()
    }

    /// Downloads every URL into the output directory
    ///
    /// Every URL is scheduled at once; a semaphore keeps at most
    /// `concurrency` transfers running. Per-image failures are counted, never
    /// returned.
    ///
    /// # Returns
    ///
    /// * `Ok(DownloadSummary)` - Counters for the batch
    /// * `Err(HarvestError::NoImages)` - `urls` was empty
    /// * `Err(HarvestError::Io)` - The output directory could not be created
    pub async fn download_images(&self, urls: &[String]) -> Result<DownloadSummary> {
        if urls.is_empty() {
            return Err(HarvestError::NoImages);
        }

        tokio::fs::create_dir_all(&self.target.output_dir).await?;

        tracing::info!(
            "Downloading {} images to {} ({} concurrent)",
            urls.len(),
            self.target.output_dir.display(),
            self.concurrency
        );

        let progress = self.progress_bar(urls.len());
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for url in urls {
            let target = Arc::clone(&self.target);
            let semaphore = Arc::clone(&semaphore);
            let url = url.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return ItemOutcome::Failed;
                };
                target.download_one(&url).await
            });
        }

        let mut summary = DownloadSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(ItemOutcome::Saved(bytes)) => {
                    summary.succeeded += 1;
                    summary.bytes += bytes;
                }
                Ok(ItemOutcome::Existing) => summary.succeeded += 1,
                Ok(ItemOutcome::Failed) => summary.failed += 1,
                Ok(ItemOutcome::Filtered) => summary.filtered += 1,
                Err(e) => {
                    tracing::warn!("Download task ended abnormally: {}", e);
                    summary.failed += 1;
                }
            }
            progress.inc(1);
            progress.set_message(HumanBytes(summary.bytes).to_string());
        }

        progress.finish_and_clear();
        tracing::info!(
            "Download completed: {} succeeded, {} failed, {} filtered, {}",
            summary.succeeded,
            summary.failed,
            summary.filtered,
            HumanBytes(summary.bytes)
        );

        Ok(summary)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Downloading [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    }
}

fn locate_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| HarvestError::ToolNotFound(name.to_string()))
}

//! Image-Harvester: a keyword-driven image crawler and downloader
//!
//! This crate crawls public web pages under a keyword, depth, and page budget,
//! collects the image URLs it finds, and downloads them to disk through an
//! external transfer tool.

pub mod config;
pub mod crawler;
pub mod download;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Image-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no seed URLs available")]
    NoSeeds,

    #[error("no images to download")]
    NoImages,

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("status code {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("neither curl nor wget found in PATH")]
    NoTransferTool,

    #[error("minimum dimension filters require ImageMagick 'identify' command; please install ImageMagick")]
    ProbeUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Image-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlSummary, Crawler};
pub use download::{DownloadSummary, Downloader};
pub use url::{canonicalize_image_url, is_image_url, ClassifyOptions};

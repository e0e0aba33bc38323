use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default user agent sent with page, robots.txt and image requests
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; ImageCrawler/1.0; +https://example.com/bot)";

/// Main configuration structure for Image-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Keyword that every collected image URL must contain
    pub keyword: String,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Creates a configuration with defaults for everything but the keyword
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            crawler: CrawlerConfig::default(),
            download: DownloadConfig::default(),
        }
    }

    /// Directory images are written to
    ///
    /// Falls back to `./<keyword>` with the keyword made filesystem-safe.
    pub fn output_dir(&self) -> PathBuf {
        match &self.download.output_dir {
            Some(dir) => dir.clone(),
            None => {
                let name = crate::download::sanitize_filename(self.keyword.trim());
                PathBuf::from(".").join(name)
            }
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of pages to fetch in one run
    pub max_pages: usize,

    /// Maximum link depth to follow from seed pages
    pub max_depth: usize,

    /// Number of crawl workers, also the download concurrency
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Delay after each processed page (milliseconds)
    pub rate_limit_ms: u64,

    /// User agent string for every outbound request
    pub user_agent: String,

    /// Explicit seed URLs; when present the site list is ignored
    pub seeds: Vec<String>,

    /// Built-in sites to build keyword search seeds for
    pub sites: Vec<Site>,

    /// Follow links to subdomains of the page being crawled
    pub follow_subdomains: bool,

    /// Skip robots.txt checks entirely
    pub ignore_robots: bool,

    /// Reject images that look like thumbnails
    pub skip_thumbnails: bool,

    /// Capacity of the bounded task queue (defaults to max(concurrency * 4, 128))
    pub queue_capacity: Option<usize>,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| (self.concurrency * 4).max(128))
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_depth: 3,
            concurrency: 5,
            timeout_secs: 30,
            rate_limit_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            seeds: Vec::new(),
            sites: Site::ALL.to_vec(),
            follow_subdomains: false,
            ignore_robots: false,
            skip_thumbnails: false,
            queue_capacity: None,
        }
    }
}

/// Download stage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DownloadConfig {
    /// Output directory; derived from the keyword when absent
    pub output_dir: Option<PathBuf>,

    /// External transfer tool to use
    pub downloader: DownloaderKind,

    /// Minimum image width in pixels (0 disables)
    pub min_width: u32,

    /// Minimum image height in pixels (0 disables)
    pub min_height: u32,
}

impl DownloadConfig {
    /// Returns true if downloaded images must be probed for their size
    pub fn filters_dimensions(&self) -> bool {
        self.min_width > 0 || self.min_height > 0
    }
}

/// Which external transfer command downloads images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloaderKind {
    /// Prefer curl, then wget
    #[default]
    Auto,
    Curl,
    Wget,
}

/// Built-in image sites that can seed a keyword search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Wikimedia,
    Pexels,
    Pixabay,
    Freeimages,
    Unsplash,
    Flickr,
    Deviantart,
    Pinterest,
    Imgur,
    Reddit,
}

impl Site {
    pub const ALL: [Site; 10] = [
        Site::Wikimedia,
        Site::Pexels,
        Site::Pixabay,
        Site::Freeimages,
        Site::Unsplash,
        Site::Flickr,
        Site::Deviantart,
        Site::Pinterest,
        Site::Imgur,
        Site::Reddit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Site::Wikimedia => "wikimedia",
            Site::Pexels => "pexels",
            Site::Pixabay => "pixabay",
            Site::Freeimages => "freeimages",
            Site::Unsplash => "unsplash",
            Site::Flickr => "flickr",
            Site::Deviantart => "deviantart",
            Site::Pinterest => "pinterest",
            Site::Imgur => "imgur",
            Site::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

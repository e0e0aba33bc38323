//! Crawler coordinator - main crawl orchestration logic
//!
//! This module ties the crawl together:
//! - Seeding the task queue and launching the worker pool
//! - Dedup of page URLs at enqueue time and of images by canonical form
//! - Page budget accounting and the stop signal
//! - Shutdown once no task is outstanding

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchOutcome};
use crate::crawler::parser::extract_page_refs;
use crate::crawler::scheduler::{CrawlTask, PageBudget, StopSignal, TaskQueue};
use crate::crawler::seeds::initial_seeds;
use crate::robots::PolitenessGate;
use crate::url::{
    canonicalize_image_url, contains_keyword, is_image_url, is_same_domain, is_subdomain,
    normalize_url, resolve_url, ClassifyOptions,
};
use crate::{HarvestError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Aggregate counters reported when a crawl finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages whose fetch was attempted
    pub pages_crawled: usize,

    /// Distinct images recorded
    pub images_found: usize,

    /// Attempted pages that failed (404, other error statuses, transport errors)
    pub fetch_failures: usize,
}

/// Image crawler for one keyword
///
/// A `Crawler` holds only the configuration and the HTTP client. All run
/// state is created by [`Crawler::start`] and dropped when it returns, except
/// the collected image list which stays available through
/// [`Crawler::image_urls`].
pub struct Crawler {
    config: Arc<Config>,
    client: Client,
    show_progress: bool,
    images: Mutex<Vec<String>>,
}

impl Crawler {
    /// Creates a crawler for the given configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to start
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.crawler.user_agent, config.crawler.timeout())?;
        Ok(Self {
            config: Arc::new(config),
            client,
            show_progress: true,
            images: Mutex::new(Vec::new()),
        })
    }

    /// Enables or disables the page progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs the crawl to completion
    ///
    /// Seeds every start URL at depth 0, lets the worker pool drain the
    /// queue, and returns once every accepted task has completed and all
    /// workers have exited.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Counters for the run
    /// * `Err(HarvestError::NoSeeds)` - Nothing to crawl
    pub async fn start(&self) -> Result<CrawlSummary> {
        let seeds = initial_seeds(&self.config);
        if seeds.is_empty() {
            return Err(HarvestError::NoSeeds);
        }

        let crawler_config = &self.config.crawler;
        tracing::info!(
            "Starting crawl for '{}' with {} seeds ({} workers, max {} pages, depth {})",
            self.config.keyword,
            seeds.len(),
            crawler_config.concurrency,
            crawler_config.max_pages,
            crawler_config.max_depth
        );

        let start_time = Instant::now();
        let run = Arc::new(CrawlRun::new(
            &self.config,
            self.client.clone(),
            self.progress_bar(),
        ));

        let mut workers = JoinSet::new();
        for worker_id in 0..crawler_config.concurrency.max(1) {
            let run = Arc::clone(&run);
            workers.spawn(async move { run.work(worker_id).await });
        }

        for seed in &seeds {
            run.enqueue(seed, 0);
        }

        run.queue.wait_idle().await;
        run.queue.close();

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Crawl worker ended abnormally: {}", e);
            }
        }

        run.progress.finish_and_clear();

        let images = run.image_snapshot();
        let summary = CrawlSummary {
            pages_crawled: run.budget.crawled(),
            images_found: images.len(),
            fetch_failures: run.fetch_failures.load(Ordering::Acquire),
        };

        tracing::info!(
            "Crawl completed: {} pages, {} images, {} failures in {:?} ({} hosts checked for robots.txt)",
            summary.pages_crawled,
            summary.images_found,
            summary.fetch_failures,
            start_time.elapsed(),
            run.gate.hosts_checked()
        );

        *self.images.lock().unwrap_or_else(PoisonError::into_inner) = images;
        Ok(summary)
    }

    /// Returns a copy of the images collected by the last run
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(self.config.crawler.max_pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Crawling [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Images recorded so far, deduplicated by canonical form
#[derive(Debug, Default)]
struct ImageLedger {
    visited: HashSet<String>,
    urls: Vec<String>,
}

impl ImageLedger {
    /// Records an image unless its canonical form was seen before
    fn record(&mut self, url: &str) -> bool {
        if !self.visited.insert(canonicalize_image_url(url)) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }
}

/// Completes a dequeued task when dropped, whatever path processing took
struct TaskGuard<'a> {
    queue: &'a TaskQueue,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.queue.complete();
    }
}

/// State shared by the workers of one run
struct CrawlRun {
    keyword: String,
    max_depth: usize,
    follow_subdomains: bool,
    rate_limit: Duration,
    classify: ClassifyOptions,
    client: Client,
    gate: PolitenessGate,
    queue: TaskQueue,
    stop: StopSignal,
    budget: PageBudget,
    seen_pages: Mutex<HashSet<String>>,
    images: Mutex<ImageLedger>,
    fetch_failures: AtomicUsize,
    progress: ProgressBar,
}

impl CrawlRun {
    fn new(config: &Config, client: Client, progress: ProgressBar) -> Self {
        let crawler = &config.crawler;
        let stop = StopSignal::new();
        Self {
            keyword: config.keyword.trim().to_string(),
            max_depth: crawler.max_depth,
            follow_subdomains: crawler.follow_subdomains,
            rate_limit: crawler.rate_limit(),
            classify: ClassifyOptions {
                skip_thumbnails: crawler.skip_thumbnails,
            },
            gate: PolitenessGate::new(client.clone(), &crawler.user_agent, crawler.ignore_robots),
            client,
            queue: TaskQueue::new(crawler.queue_capacity(), stop.clone()),
            stop,
            budget: PageBudget::new(crawler.max_pages),
            seen_pages: Mutex::new(HashSet::new()),
            images: Mutex::new(ImageLedger::default()),
            fetch_failures: AtomicUsize::new(0),
            progress,
        }
    }

    /// Accepts a page URL for crawling
    ///
    /// The URL is marked seen here, before it is queued, so concurrent
    /// discoveries of the same page yield a single task.
    fn enqueue(&self, url: &str, depth: usize) {
        if self.stop.is_raised() {
            return;
        }

        let url = normalize_url(url);
        if url.is_empty() || depth > self.max_depth {
            return;
        }

        {
            let mut seen = self
                .seen_pages
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !seen.insert(url.clone()) {
                return;
            }
        }

        self.queue.submit(CrawlTask::new(url, depth));
    }

    async fn work(&self, worker_id: usize) {
        tracing::trace!("Worker {} started", worker_id);

        while let Some(task) = self.queue.next().await {
            let _guard = TaskGuard { queue: &self.queue };

            if self.stop.is_raised() {
                continue;
            }

            if self.process(&task).await && !self.rate_limit.is_zero() {
                tokio::time::sleep(self.rate_limit).await;
            }
        }

        tracing::trace!("Worker {} finished", worker_id);
    }

    /// Crawls one page
    ///
    /// Returns true if a fetch was attempted.
    async fn process(&self, task: &CrawlTask) -> bool {
        if self.budget.is_exhausted() {
            tracing::debug!("Page budget spent, skipping {}", task.url);
            return false;
        }

        if let Err(e) = Url::parse(&task.url) {
            tracing::debug!("Skipping invalid URL {}: {}", task.url, e);
            return false;
        }

        if !self.gate.can_crawl(&task.url).await {
            tracing::debug!("Blocked by robots.txt: {}", task.url);
            return false;
        }

        // Claimed only after the robots check so a blocked page never holds a slot
        let Some(crawled) = self.budget.try_claim() else {
            tracing::debug!("Page budget spent, skipping {}", task.url);
            return false;
        };
        self.progress.set_position(crawled as u64);
        if crawled >= self.budget.max_pages() && self.stop.raise() {
            tracing::info!("Reached max pages limit ({})", self.budget.max_pages());
        }

        tracing::debug!("Crawling [depth {}]: {}", task.depth, task.url);

        match fetch_page(&self.client, &task.url).await {
            Ok(FetchOutcome::Html { final_url, body }) => {
                if final_url != task.url {
                    tracing::debug!("{} redirected to {}", task.url, final_url);
                }
                self.harvest(task, &body);
            }
            Ok(FetchOutcome::NotHtml { content_type }) => {
                tracing::debug!("Skipping non-HTML content ({}): {}", content_type, task.url);
            }
            Ok(FetchOutcome::Refused { status_code }) => {
                tracing::debug!("Access refused ({}): {}", status_code, task.url);
            }
            Ok(FetchOutcome::NotFound) => {
                self.fetch_failures.fetch_add(1, Ordering::AcqRel);
                tracing::debug!("Page not found: {}", task.url);
            }
            Err(e) => {
                self.fetch_failures.fetch_add(1, Ordering::AcqRel);
                tracing::debug!("Error crawling {}: {}", task.url, e);
            }
        }

        true
    }

    /// Records the page's images and queues its in-scope links
    fn harvest(&self, task: &CrawlTask, body: &str) {
        let refs = extract_page_refs(body);

        for candidate in &refs.images {
            self.try_add_image(&task.url, candidate);
        }

        if task.depth < self.max_depth && !self.stop.is_raised() {
            for href in &refs.anchors {
                self.follow_link(task, href);
            }
        }
    }

    fn follow_link(&self, task: &CrawlTask, href: &str) {
        let Some(target) = resolve_url(&task.url, href) else {
            return;
        };

        if is_image_url(&target, self.classify) {
            self.try_add_image(&task.url, &target);
            return;
        }

        let Ok(parsed) = Url::parse(&target) else {
            return;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return;
        }

        let in_scope = if self.follow_subdomains {
            is_subdomain(&task.url, &target)
        } else {
            is_same_domain(&task.url, &target)
        };

        if in_scope {
            self.enqueue(&target, task.depth + 1);
        }
    }

    /// Resolves, classifies, and records one image candidate
    ///
    /// Returns true if the image was new.
    fn try_add_image(&self, base: &str, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }

        let lower = candidate.to_lowercase();
        if lower.starts_with("data:") || lower.starts_with("javascript:") {
            return false;
        }

        let Some(resolved) = resolve_url(base, candidate) else {
            return false;
        };

        if !is_image_url(&resolved, self.classify) || !contains_keyword(&resolved, &self.keyword) {
            return false;
        }

        let recorded = self
            .images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&resolved);

        if recorded {
            tracing::debug!("Found image: {}", resolved);
        }
        recorded
    }

    fn image_snapshot(&self) -> Vec<String> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .urls
            .clone()
    }
}

//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! The [`PolitenessGate`] is what the crawler consults before every page fetch.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{agent_token, ParsedRobots};

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use url::Url;

/// Derives the robots.txt endpoint for a page URL
///
/// # Returns
///
/// * `Some(String)` - `scheme://host[:port]/robots.txt`
/// * `None` - The URL could not be parsed or has no host
pub fn robots_url(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", parsed.scheme(), host, port),
        None => format!("{}://{}/robots.txt", parsed.scheme(), host),
    })
}

/// Fetches and parses robots.txt from an endpoint
///
/// Any failure (transport error, non-200 status, unreadable body) yields
/// `None`, which callers treat as "no restrictions".
pub async fn fetch_robots(client: &Client, robots_url: &str, user_agent: &str) -> CachedRobots {
    let response = match client
        .get(robots_url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!("No robots.txt at {} ({})", robots_url, response.status());
        return None;
    }

    match response.text().await {
        Ok(body) => Some(Arc::new(ParsedRobots::from_content(&body))),
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", robots_url, e);
            None
        }
    }
}

/// Per-host robots.txt enforcement with a run-long cache
#[derive(Debug)]
pub struct PolitenessGate {
    client: Client,
    user_agent: String,
    ignore_robots: bool,
    cache: RobotsCache,
}

impl PolitenessGate {
    /// Creates a gate that fetches robots.txt with `client`
    ///
    /// When `ignore_robots` is set every page is allowed and nothing is fetched.
    pub fn new(client: Client, user_agent: impl Into<String>, ignore_robots: bool) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            ignore_robots,
            cache: RobotsCache::new(),
        }
    }

    /// Decides whether a page may be fetched
    ///
    /// Pages whose URL has no host are refused. Everything else is allowed
    /// unless the host's robots.txt disallows the path for our agent.
    pub async fn can_crawl(&self, page_url: &str) -> bool {
        if self.ignore_robots {
            return true;
        }

        let Some(endpoint) = robots_url(page_url) else {
            return false;
        };

        match self.robots_for(&endpoint).await {
            Some(robots) => robots.is_allowed(page_url, &self.user_agent),
            None => true,
        }
    }

    /// Returns the cached rules for an endpoint, fetching them on first use
    async fn robots_for(&self, endpoint: &str) -> CachedRobots {
        if let Some(cached) = self.cache.get(endpoint) {
            return cached;
        }

        tracing::debug!("Fetching robots.txt: {}", endpoint);
        let robots = fetch_robots(&self.client, endpoint, &self.user_agent).await;
        self.cache.insert(endpoint, robots.clone());
        robots
    }

    /// Number of hosts whose robots.txt has been looked up
    pub fn hosts_checked(&self) -> usize {
        self.cache.len()
    }
}

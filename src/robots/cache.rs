//! Robots.txt caching implementation
//!
//! Entries are keyed by robots.txt endpoint and live for the whole run. An
//! endpoint that could not be fetched or parsed is cached as `None`, which
//! means "no restrictions".

use crate::robots::ParsedRobots;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Cached robots.txt lookup result for one endpoint
pub type CachedRobots = Option<Arc<ParsedRobots>>;

/// Read-mostly map from robots.txt endpoint to parsed rules
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: RwLock<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an endpoint
    ///
    /// # Returns
    ///
    /// * `Some(entry)` - The endpoint was fetched before (entry may be permissive)
    /// * `None` - The endpoint has not been fetched yet
    pub fn get(&self, robots_url: &str) -> Option<CachedRobots> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(robots_url).cloned()
    }

    /// Stores the result of fetching an endpoint
    pub fn insert(&self, robots_url: &str, robots: CachedRobots) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(robots_url.to_string(), robots);
    }

    /// Number of endpoints cached so far
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

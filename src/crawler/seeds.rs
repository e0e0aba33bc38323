//! Seed URL construction
//!
//! Explicit seeds from the configuration win. Otherwise every configured
//! site contributes one keyword search page.

use crate::config::{Config, Site};
use crate::url::normalize_url;
use url::form_urlencoded::byte_serialize;

/// Builds the keyword search URL for a built-in site
///
/// The keyword is query-escaped, so spaces become `+`.
///
/// # Examples
///
/// ```
/// use image_harvester::config::Site;
/// use image_harvester::crawler::search_url;
///
/// assert_eq!(search_url(Site::Pexels, "red cat"), "https://www.pexels.com/search/red+cat/");
/// ```
pub fn search_url(site: Site, keyword: &str) -> String {
    let k: String = byte_serialize(keyword.as_bytes()).collect();
    match site {
        Site::Wikimedia => format!(
            "https://commons.wikimedia.org/w/index.php?search={k}&title=Special:MediaSearch&go=Go&type=image"
        ),
        Site::Pexels => format!("https://www.pexels.com/search/{k}/"),
        Site::Pixabay => format!("https://pixabay.com/images/search/{k}/"),
        Site::Freeimages => format!("https://www.freeimages.com/search/{k}"),
        Site::Unsplash => format!("https://unsplash.com/s/photos/{k}"),
        Site::Flickr => {
            format!("https://www.flickr.com/search/?text={k}&media=photos&license=4,5,6,9,10")
        }
        Site::Deviantart => format!("https://www.deviantart.com/search?q={k}"),
        Site::Pinterest => format!("https://www.pinterest.com/search/pins/?q={k}"),
        Site::Imgur => format!("https://imgur.com/search?q={k}"),
        Site::Reddit => format!("https://www.reddit.com/search/?q={k}&type=link"),
    }
}

/// Computes the seed set for a run
///
/// Seeds are normalized and deduplicated, keeping first occurrence order.
/// An empty result means the run has nothing to crawl.
pub fn initial_seeds(config: &Config) -> Vec<String> {
    let candidates: Vec<String> = if config.crawler.seeds.is_empty() {
        let keyword = config.keyword.trim();
        config
            .crawler
            .sites
            .iter()
            .map(|site| search_url(*site, keyword))
            .collect()
    } else {
        config.crawler.seeds.clone()
    };

    let mut seeds: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let normalized = normalize_url(&candidate);
        if !normalized.is_empty() && !seeds.contains(&normalized) {
            seeds.push(normalized);
        }
    }
    seeds
}

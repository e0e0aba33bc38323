//! URL handling module for Image-Harvester
//!
//! This module provides the URL classification heuristics used by the
//! crawler: image detection, canonicalization for dedup, reference
//! resolution, keyword filtering, and same-domain checks.

mod domain;
mod matcher;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{extract_host, is_same_domain, is_subdomain};
pub use matcher::{is_ephemeral_image_url, is_image_url, is_thumbnail_image, is_webp_image};
pub use normalize::{canonicalize_image_url, normalize_url};

pub(crate) use normalize::decode_segment;

/// Options that change how candidate images are classified
///
/// Passed by value into every classification call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Reject URLs that follow common thumbnail naming conventions
    pub skip_thumbnails: bool,
}

/// Checks if a URL contains the keyword, ignoring case
///
/// # Examples
///
/// ```
/// use image_harvester::url::contains_keyword;
///
/// assert!(contains_keyword("https://example.com/Red-Cat.jpg", "cat"));
/// assert!(!contains_keyword("https://example.com/dog.jpg", "cat"));
/// ```
pub fn contains_keyword(url: &str, keyword: &str) -> bool {
    url.to_lowercase().contains(&keyword.to_lowercase())
}

/// Resolves a possibly-relative reference against a base URL
///
/// Returns `None` when the reference should be dropped:
/// - empty or whitespace-only references
/// - `javascript:`, `mailto:` and `tel:` links
/// - a base or reference that fails to parse
///
/// The fragment of the resolved URL is removed.
///
/// # Examples
///
/// ```
/// use image_harvester::url::resolve_url;
///
/// assert_eq!(
///     resolve_url("https://example.com/gallery/", "../img/cat.jpg#top"),
///     Some("https://example.com/img/cat.jpg".to_string())
/// );
/// assert_eq!(resolve_url("https://example.com/", "mailto:me@example.com"), None);
/// ```
pub fn resolve_url(base: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let lower = reference.to_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:")
    {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let mut resolved = base.join(reference).ok()?;
    resolved.set_fragment(None);

    let normalized = normalize_url(resolved.as_str());
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

use std::borrow::Cow;
use url::form_urlencoded;
use url::Url;

/// Query parameters that only select a size, format, or tracking variant of an image
const REDUNDANT_IMAGE_PARAMS: &[&str] = &[
    "w", "width", "h", "height", "fit", "crop", "auto", "format", "fm", "quality", "q", "ixlib",
    "ixid", "cs", "dpr", "usm", "compress", "token",
];

/// Normalizes a URL string for use as a dedup key
///
/// Removes the fragment (everything after `#`) and trims surrounding
/// whitespace. Returns an empty string when nothing is left.
///
/// # Examples
///
/// ```
/// use image_harvester::url::normalize_url;
///
/// assert_eq!(normalize_url(" https://example.com/page#top "), "https://example.com/page");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let without_fragment = match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    without_fragment.trim().to_string()
}

/// Produces the canonical form of an image URL
///
/// # Canonicalization Steps
///
/// 1. Normalize (strip fragment, trim)
/// 2. Parse the URL; if parsing fails the normalized string is returned as is
/// 3. Remove every query parameter in the redundant set (size, format,
///    quality, CDN and tracking ids)
/// 4. If anything was removed, re-encode the remaining parameters sorted by key,
///    dropping the query entirely when none remain
///
/// Applying the function to its own output yields the same string.
///
/// # Examples
///
/// ```
/// use image_harvester::url::canonicalize_image_url;
///
/// let canonical = canonicalize_image_url("https://cdn.example.com/cat.jpg?w=640&q=80#x");
/// assert_eq!(canonical, "https://cdn.example.com/cat.jpg");
/// ```
pub fn canonicalize_image_url(raw: &str) -> String {
    let normalized = normalize_url(raw);
    if normalized.is_empty() {
        return normalized;
    }

    let mut parsed = match Url::parse(&normalized) {
        Ok(url) => url,
        Err(_) => return normalized,
    };

    if parsed.query().map_or(true, str::is_empty) {
        return parsed.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut kept: Vec<(String, String)> = pairs
        .iter()
        .filter(|(key, _)| !REDUNDANT_IMAGE_PARAMS.contains(&key.as_str()))
        .cloned()
        .collect();

    if kept.len() == pairs.len() {
        return parsed.to_string();
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        // Stable sort keeps the value order within a repeated key
        kept.sort_by(|a, b| a.0.cmp(&b.0));
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        parsed.set_query(Some(&encoded));
    }

    parsed.to_string()
}

/// Decodes percent-escapes in a path segment, replacing invalid UTF-8
pub(crate) fn decode_segment(segment: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(segment).decode_utf8_lossy()
}

use super::ClassifyOptions;
use url::Url;

/// File extensions of image formats the downloader accepts
const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico", ".tiff", ".tif",
];

/// Checks whether a URL points at a downloadable image
///
/// # Rejection Rules (checked in order)
///
/// 1. Empty or whitespace-only strings
/// 2. `data:`, `javascript:` and `vbscript:` URIs
/// 3. WebP images (by extension, `.webp?`, `format=webp` or `fm=webp`), always
/// 4. Expiring signed links (deviantart `strp` paths and `token=` queries)
/// 5. Thumbnail naming conventions, only when `options.skip_thumbnails` is set
///
/// Otherwise the URL is accepted when its path ends with a supported
/// extension. If the string does not parse as an absolute URL the whole
/// string is tested instead.
///
/// # Examples
///
/// ```
/// use image_harvester::url::{is_image_url, ClassifyOptions};
///
/// let options = ClassifyOptions::default();
/// assert!(is_image_url("https://example.com/cat.jpg?w=200", options));
/// assert!(!is_image_url("https://example.com/cat.webp", options));
/// assert!(!is_image_url("https://example.com/gallery", options));
/// ```
pub fn is_image_url(candidate: &str, options: ClassifyOptions) -> bool {
    let normalized = candidate.trim();
    if normalized.is_empty() {
        return false;
    }

    if is_data_uri(normalized) || is_script_url(normalized) {
        return false;
    }

    if is_webp_image(normalized) {
        return false;
    }

    if is_ephemeral_image_url(normalized) {
        return false;
    }

    if options.skip_thumbnails && is_thumbnail_image(normalized) {
        return false;
    }

    match Url::parse(normalized) {
        Ok(url) if url.has_host() => has_image_extension(url.path()),
        _ => has_image_extension(normalized),
    }
}

/// Checks if the URL or filename indicates a WebP image
pub fn is_webp_image(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    lower.ends_with(".webp")
        || lower.contains(".webp?")
        || lower.contains("format=webp")
        || lower.contains("fm=webp")
}

/// Detects common thumbnail naming conventions
pub fn is_thumbnail_image(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    let filename = lower.rsplit('/').next().unwrap_or(&lower);

    if filename.contains("px_") || filename.contains("px-") {
        return true;
    }

    const PATH_MARKERS: &[&str] = &[
        "/thumb/",
        "/thumbnail/",
        "_thumb.",
        "_thumbnail.",
        "-thumb.",
        "-thumbnail.",
    ];
    if PATH_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return true;
    }

    const FILENAME_MARKERS: &[&str] = &[
        "_small.", "_tiny.", "_preview.", "-small.", "-tiny.", "-preview.",
    ];
    FILENAME_MARKERS
        .iter()
        .any(|marker| filename.contains(marker))
}

/// Detects signed image links that expire before they can be downloaded
pub fn is_ephemeral_image_url(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    if lower.contains("deviantart.com/strp/") {
        return true;
    }

    let Ok(url) = Url::parse(raw) else {
        return false;
    };

    let on_deviantart = url
        .host_str()
        .is_some_and(|host| host.to_lowercase().contains("deviantart.com"));

    on_deviantart
        && url
            .query()
            .is_some_and(|query| query.to_lowercase().contains("token="))
}

fn has_image_extension(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext) || lower.contains(&format!("{ext}?")))
}

fn is_data_uri(raw: &str) -> bool {
    raw.to_lowercase().starts_with("data:")
}

fn is_script_url(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:")
}

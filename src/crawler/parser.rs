//! HTML parser for extracting image candidates and links
//!
//! This module only collects raw attribute values. Resolution against the
//! page URL, classification, and keyword filtering happen in the crawler.

use scraper::{ElementRef, Html, Selector};

/// Lazy-load attributes checked on `<img>` elements, in priority order
const IMG_ATTRIBUTES: &[&str] = &[
    "data-src",
    "data-original",
    "data-fullsrc",
    "data-large",
    "data-lazy",
    "data-lazy-src",
    "data-thumbnail",
    "data-fallback-src",
    "data-img",
    "src",
];

const META_IMAGE_SELECTOR: &str = "meta[property='og:image'], meta[property='og:image:url'], \
     meta[property='og:image:secure_url'], meta[name='twitter:image'], meta[name='twitter:image:src']";

/// Raw references extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRefs {
    /// Image candidates from `<img>`, `<a href>`, `<picture><source>` and
    /// image meta tags, in document order
    pub images: Vec<String>,

    /// Every `<a href>` value, in document order, for link following
    pub anchors: Vec<String>,
}

/// Parses HTML content and extracts image candidates and anchors
///
/// # Image Candidate Sources
///
/// - `<img>`: lazy-load attributes, `src`, and the widest `srcset` /
///   `data-srcset` entry (deduplicated per element)
/// - `<a href>`: every link, since links often point at full-size images
/// - `<picture><source srcset>`: the widest entry
/// - Open Graph and Twitter image `<meta content>`
///
/// # Example
///
/// ```
/// use image_harvester::crawler::extract_page_refs;
///
/// let html = r#"<img src="/cat.jpg" srcset="cat-1x.jpg 1x, cat-2x.jpg 2x"><a href="/more">More</a>"#;
/// let refs = extract_page_refs(html);
/// assert_eq!(refs.images, vec!["/cat.jpg", "cat-2x.jpg", "/more"]);
/// assert_eq!(refs.anchors, vec!["/more"]);
/// ```
pub fn extract_page_refs(html: &str) -> PageRefs {
    let document = Html::parse_document(html);
    let mut refs = PageRefs::default();

    if let Ok(img_selector) = Selector::parse("img") {
        for element in document.select(&img_selector) {
            refs.images.extend(collect_image_candidates(element));
        }
    }

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                refs.images.push(href.to_string());
                refs.anchors.push(href.to_string());
            }
        }
    }

    if let Ok(source_selector) = Selector::parse("picture source[srcset]") {
        for element in document.select(&source_selector) {
            if let Some(largest) = element.value().attr("srcset").and_then(largest_from_srcset) {
                refs.images.push(largest);
            }
        }
    }

    if let Ok(meta_selector) = Selector::parse(META_IMAGE_SELECTOR) {
        for element in document.select(&meta_selector) {
            if let Some(content) = element.value().attr("content") {
                refs.images.push(content.to_string());
            }
        }
    }

    refs
}

/// Collects the distinct candidate URLs of one `<img>` element
fn collect_image_candidates(element: ElementRef<'_>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |value: String| {
        if !value.is_empty() && !candidates.contains(&value) {
            candidates.push(value);
        }
    };

    for attr in IMG_ATTRIBUTES {
        if let Some(value) = element.value().attr(attr) {
            push(value.trim().to_string());
        }
    }

    for attr in ["srcset", "data-srcset"] {
        if let Some(largest) = element.value().attr(attr).and_then(largest_from_srcset) {
            push(largest);
        }
    }

    candidates
}

/// Picks the widest candidate from a `srcset` value
///
/// Each comma-separated entry is a URL optionally followed by a `NNNw` or
/// `NNNx` descriptor. The entry with the largest number wins; when no entry
/// carries a number the first one is kept.
///
/// # Examples
///
/// ```
/// use image_harvester::crawler::largest_from_srcset;
///
/// assert_eq!(largest_from_srcset("a.jpg 320w, b.jpg 640w, c.jpg 128w"), Some("b.jpg".to_string()));
/// assert_eq!(largest_from_srcset("a.jpg, b.jpg"), Some("a.jpg".to_string()));
/// assert_eq!(largest_from_srcset(" , "), None);
/// ```
pub fn largest_from_srcset(srcset: &str) -> Option<String> {
    let mut largest_url: Option<&str> = None;
    let mut largest_width: u64 = 0;

    for part in srcset.split(',') {
        let mut fields = part.split_whitespace();
        let Some(candidate) = fields.next() else {
            continue;
        };

        let width = fields.next().map(descriptor_value).unwrap_or(0);

        if width > largest_width {
            largest_width = width;
            largest_url = Some(candidate);
        } else if largest_url.is_none() {
            largest_url = Some(candidate);
        }
    }

    largest_url.map(str::to_string)
}

/// Leading integer of a `640w` / `2x` / `1.5x` descriptor, 0 if absent
fn descriptor_value(descriptor: &str) -> u64 {
    let digits: String = descriptor
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

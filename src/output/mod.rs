//! Output module for run summaries
//!
//! This module handles:
//! - Crawl counters (pages, images, failures)
//! - Download counters (succeeded, failed, filtered, bytes)
//! - Listing collected image URLs

pub mod stats;

pub use stats::{
    format_crawl_summary, format_download_summary, print_crawl_summary, print_download_summary,
};

use std::io::{self, Write};

/// Writes image URLs one per line
///
/// # Arguments
///
/// * `writer` - Destination, usually stdout
/// * `urls` - URLs in collection order
pub fn write_image_list<W: Write>(mut writer: W, urls: &[String]) -> io::Result<()> {
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()
}

//! Run summaries
//!
//! Formats the counters returned by the crawler and the downloader for
//! display on stdout.

use crate::crawler::CrawlSummary;
use crate::download::DownloadSummary;
use indicatif::HumanBytes;
use std::fmt::Write;

/// Formats crawl counters as a text block
pub fn format_crawl_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "  Pages crawled:  {}", summary.pages_crawled);
    let _ = writeln!(out, "  Images found:   {}", summary.images_found);
    let _ = writeln!(out, "  Fetch failures: {}", summary.fetch_failures);

    let success_rate = if summary.pages_crawled > 0 {
        let ok = summary.pages_crawled.saturating_sub(summary.fetch_failures);
        (ok as f64 / summary.pages_crawled as f64) * 100.0
    } else {
        0.0
    };
    let _ = writeln!(out, "\nSuccess Rate: {:.1}%", success_rate);
    out
}

/// Formats download counters as a text block
///
/// The filtered line only appears when dimension filtering was active.
pub fn format_download_summary(summary: &DownloadSummary, filters_dimensions: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Download Summary ===\n");
    let _ = writeln!(out, "  Successful: {}", summary.succeeded);
    let _ = writeln!(out, "  Failed:     {}", summary.failed);
    if filters_dimensions {
        let _ = writeln!(out, "  Filtered:   {} (below min resolution)", summary.filtered);
    }
    let _ = writeln!(out, "  Downloaded: {}", HumanBytes(summary.bytes));
    out
}

/// Prints crawl counters to stdout
pub fn print_crawl_summary(summary: &CrawlSummary) {
    print!("{}", format_crawl_summary(summary));
}

/// Prints download counters to stdout
pub fn print_download_summary(summary: &DownloadSummary, filters_dimensions: bool) {
    print!("{}", format_download_summary(summary, filters_dimensions));
}

//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with status and content-type classification
//! - HTML parsing for image candidates and links
//! - The bounded task queue, page budget, and stop signal
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod seeds;

pub use coordinator::{CrawlSummary, Crawler};
pub use fetcher::{build_http_client, fetch_page, is_html_content, FetchOutcome};
pub use parser::{extract_page_refs, largest_from_srcset, PageRefs};
pub use scheduler::{CrawlTask, PageBudget, StopSignal, Submission, TaskQueue};
pub use seeds::{initial_seeds, search_url};

//! HTTP fetcher implementation
//!
//! This module handles page requests for the crawler, including:
//! - Building the HTTP client with the fixed browser-like header set
//! - Classifying responses by status code
//! - Content-Type validation before a body is handed to the parser

use crate::HarvestError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

const PAGE_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const PAGE_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const MAX_REDIRECTS: usize = 10;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTML page ready for extraction
    Html {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// Page fetched but not HTML; nothing to extract
    NotHtml {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Host refused the crawler (403 or 405); expected, not a failure
    Refused { status_code: u16 },

    /// Page does not exist (404); a failure that is never retried
    NotFound,
}

/// Builds the HTTP client used for pages and robots.txt
///
/// # Arguments
///
/// * `user_agent` - User agent sent with every request
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. invalid user agent)
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(PAGE_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(PAGE_ACCEPT_LANGUAGE));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and classifies the response
///
/// # Status Handling
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, HTML or missing Content-Type | `Html` |
/// | 2xx, other Content-Type | `NotHtml` |
/// | 403, 405 | `Refused` |
/// | 404 | `NotFound` |
/// | any other status | `Err(HttpStatus)` |
/// | transport error or unreadable body | `Err(Http)` |
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchOutcome, HarvestError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return match status {
            StatusCode::NOT_FOUND => Ok(FetchOutcome::NotFound),
            StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED => Ok(FetchOutcome::Refused {
                status_code: status.as_u16(),
            }),
            _ => Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content(&content_type) {
        return Ok(FetchOutcome::NotHtml { content_type });
    }

    let final_url = response.url().to_string();
    let body = response.text().await.map_err(|source| HarvestError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchOutcome::Html { final_url, body })
}

/// Checks a Content-Type header value for HTML or XHTML
///
/// A missing Content-Type is assumed to be HTML.
pub fn is_html_content(content_type: &str) -> bool {
    if content_type.is_empty() {
        return true;
    }

    let lower = content_type.to_lowercase();
    lower.starts_with("text/html") || lower.starts_with("application/xhtml+xml")
}

//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's matcher, providing a simplified
/// interface for checking if URLs are allowed. Group selection follows the
/// matcher: the group naming the agent wins, otherwise the `*` group applies.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The configured user agent string; its product token is
    ///   used for group matching
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let agent = agent_token(user_agent);
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// Browser-style agents like `Mozilla/5.0 (compatible; ImageCrawler/1.0; ...)`
/// name the crawler after `compatible;`. Otherwise the leading product name
/// is used.
pub fn agent_token(user_agent: &str) -> &str {
    let source = match user_agent.find("compatible;") {
        Some(idx) => &user_agent[idx + "compatible;".len()..],
        None => user_agent,
    };

    let source = source.trim_start();
    let end = source
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(source.len());

    if end == 0 {
        "*"
    } else {
        &source[..end]
    }
}

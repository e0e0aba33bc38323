use url::Url;

/// Extracts the lowercase host of a URL, without port
///
/// # Examples
///
/// ```
/// use image_harvester::url::extract_host;
///
/// assert_eq!(extract_host("https://WWW.Example.com:8080/page"), Some("www.example.com".to_string()));
/// assert_eq!(extract_host("not a url"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(|host| host.to_lowercase())
}

/// Host with a leading `www.` removed, used for domain comparisons
fn comparable_host(url: &str) -> Option<String> {
    let host = extract_host(url)?;
    Some(match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    })
}

/// Checks if two URLs are on the same domain
///
/// Hosts are compared case-insensitively and a `www.` prefix on either side
/// is ignored. Ports are not part of the comparison.
pub fn is_same_domain(a: &str, b: &str) -> bool {
    match (comparable_host(a), comparable_host(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Checks if `child_url` is on a subdomain of `parent_url`'s domain
///
/// The parent host itself counts as a match. A `www.` prefix on either host
/// is ignored.
pub fn is_subdomain(parent_url: &str, child_url: &str) -> bool {
    match (comparable_host(parent_url), comparable_host(child_url)) {
        (Some(parent), Some(child)) => {
            child == parent || child.ends_with(&format!(".{}", parent))
        }
        _ => false,
    }
}

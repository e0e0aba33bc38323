use crate::url::decode_segment;
use url::Url;

const MAX_FILENAME_BYTES: usize = 200;
const FALLBACK_NAME: &str = "image";

/// Makes a string safe to use as a file name
///
/// Replaces `/ \ : * ? " < > |` and spaces with `_`, collapses runs of `_`,
/// trims `_` from both ends, and caps the result at 200 bytes. An empty
/// result becomes `image`.
///
/// # Examples
///
/// ```
/// use image_harvester::download::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my cat: photo?.jpg"), "my_cat_photo_.jpg");
/// assert_eq!(sanitize_filename("///"), "image");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        let c = match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            other => other,
        };
        if c == '_' && result.ends_with('_') {
            continue;
        }
        result.push(c);
    }

    let trimmed = result.trim_matches('_');
    let capped = truncate_at_char_boundary(trimmed, MAX_FILENAME_BYTES);

    if capped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        capped.to_string()
    }
}

/// Derives the output file name for an image URL
///
/// Takes the last segment of the URL path (query dropped, percent-escapes
/// decoded) and sanitizes it. URLs without a usable segment fall back to
/// `image`.
///
/// # Examples
///
/// ```
/// use image_harvester::download::extract_filename_from_url;
///
/// assert_eq!(extract_filename_from_url("https://example.com/a/My%20Cat.jpg?w=200"), "My_Cat.jpg");
/// assert_eq!(extract_filename_from_url("https://example.com/"), "image");
/// ```
pub fn extract_filename_from_url(raw: &str) -> String {
    let without_query = raw.split('?').next().unwrap_or(raw);

    let path = match Url::parse(without_query) {
        Ok(url) if !url.path().is_empty() => decode_segment(url.path()).into_owned(),
        _ => without_query.to_string(),
    };

    let trimmed = path.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or("");
    if last.is_empty() || last == "." {
        return FALLBACK_NAME.to_string();
    }

    sanitize_filename(last)
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_filename(r#"a\b*c"d<e>f|g"#), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_filename("__cat  photo__.png"), "cat_photo_.png");
        assert_eq!(sanitize_filename(""), "image");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_filename(&long).len(), 200);

        let wide = "é".repeat(150);
        let capped = sanitize_filename(&wide);
        assert!(capped.len() <= 200);
        assert!(capped.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            extract_filename_from_url("https://cdn.example.com/photos/cat.jpg?w=640&q=80"),
            "cat.jpg"
        );
        assert_eq!(
            extract_filename_from_url("https://example.com/cats/"),
            "cats"
        );
        assert_eq!(extract_filename_from_url("https://example.com"), "image");
        assert_eq!(extract_filename_from_url("cat pics/tabby.png"), "tabby.png");
        assert_eq!(extract_filename_from_url(""), "image");
    }
}

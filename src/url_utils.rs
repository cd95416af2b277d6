//! URL utilities shared by the scoper, frontier and robots gate.

use percent_encoding::percent_decode_str;
use url::Url;

pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

pub fn convert_to_absolute_url(link: &str, base_url: &str) -> Result<String, String> {
    let base = Url::parse(base_url).map_err(|e| e.to_string())?;
    let absolute_url = base.join(link).map_err(|e| e.to_string())?;
    Ok(absolute_url.to_string())
}

pub fn robots_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let scheme = parsed.scheme();
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}/robots.txt", scheme, host, port)),
        None => Some(format!("{}://{}/robots.txt", scheme, host)),
    }
}

/// Canonical form used for identity: http(s) only, fragment and query
/// dropped, trailing slash removed (except the root path), and the path
/// percent-decoded then re-encoded so `%28`/`(` and `%c3%a9`/`%C3%A9` agree.
/// Returns `None` for anything that is not an absolute http(s) URL.
pub fn canonicalize(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }

    // Identity is scheme, host and path: `?action=edit` or `?oldid=1` name the same article.
    parsed.set_fragment(None);
    parsed.set_query(None);

    let path = parsed.path().to_string();
    if let Ok(decoded) = percent_decode_str(&path).decode_utf8() {
        // A literal '%' after decoding would be ambiguous on re-encode.
        if !decoded.contains('%') {
            let decoded = decoded.into_owned();
            parsed.set_path(&decoded);
        }
    }

    let path = parsed.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        let trimmed = if trimmed.is_empty() { "/".to_string() } else { trimmed };
        parsed.set_path(&trimmed);
    }

    Some(parsed.to_string())
}

/// Last path segment of an article URL as readable text: percent-decoded,
/// underscores turned into spaces, lowercased.
pub fn article_title(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    Some(decoded.replace('_', " ").to_lowercase())
}

/// Add https:// prefix for bare hosts (CLI and seed-file convenience).
pub fn normalize_url_for_cli(url: &str) -> String {
    let trimmed = url.trim();

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    format!("https://{}", trimmed)
}

pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.starts_with("text/html") || lower.starts_with("application/xhtml+xml")
}

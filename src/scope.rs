//! Crawl-eligibility predicate for discovered links.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::url_utils;

/// Administrative and meta namespaces that are never crawled.
pub const DEFAULT_EXCLUDED_NAMESPACES: &[&str] = &[
    "Special:",
    "Help:",
    "File:",
    "Template:",
    "Category:",
    "Wikipedia:",
    "Portal:",
    "Talk:",
    "User:",
    "User_talk:",
    "Module:",
    "Book:",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Absolute prefix every in-scope URL must start with.
    pub root: String,
    /// Entry page that is never treated as a discovery.
    pub home_page: Option<String>,
    /// Path prefixes (relative to `root`) that are rejected.
    pub excluded_namespaces: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            root: Config::DEFAULT_ROOT.to_string(),
            home_page: Some(Config::DEFAULT_HOME_PAGE.to_string()),
            excluded_namespaces: DEFAULT_EXCLUDED_NAMESPACES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Decides which URLs the frontier may admit. Scoping never errors: anything
/// malformed is simply out of scope.
#[derive(Debug, Clone)]
pub struct UrlScoper {
    root: String,
    home_page: Option<String>,
    excluded: Vec<String>,
}

impl UrlScoper {
    pub fn new(config: ScopeConfig) -> Self {
        // Compare against canonical forms so "%3A" and ":" agree.
        let root = url_utils::canonicalize(&config.root)
            .map(|r| {
                if config.root.ends_with('/') && !r.ends_with('/') {
                    format!("{}/", r)
                } else {
                    r
                }
            })
            .unwrap_or(config.root);
        let home_page = config
            .home_page
            .and_then(|h| url_utils::canonicalize(&h));
        Self {
            root,
            home_page,
            excluded: config.excluded_namespaces,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Canonical identity of a URL, or `None` if it cannot be parsed.
    pub fn normalize(&self, url: &str) -> Option<String> {
        url_utils::canonicalize(url)
    }

    pub fn is_in_scope(&self, candidate_url: &str) -> bool {
        let trimmed = candidate_url.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        match self.normalize(trimmed) {
            Some(normalized) => self.is_normalized_in_scope(&normalized),
            None => false,
        }
    }

    /// Scope test on a URL already in canonical form.
    pub fn is_normalized_in_scope(&self, normalized: &str) -> bool {
        let Some(rest) = normalized.strip_prefix(&self.root) else {
            return false;
        };
        if rest.is_empty() {
            return false;
        }
        if self.home_page.as_deref() == Some(normalized) {
            return false;
        }
        !self.excluded.iter().any(|ns| has_namespace(rest, ns))
    }
}

/// MediaWiki capitalizes the first letter of a title, so `special:Random`
/// resolves to `Special:Random`; the remainder is case-sensitive.
fn has_namespace(title: &str, namespace: &str) -> bool {
    let mut title_chars = title.chars();
    let mut ns_chars = namespace.chars();
    match (title_chars.next(), ns_chars.next()) {
        (Some(t), Some(n)) => {
            t.to_uppercase().eq(n.to_uppercase()) && title_chars.as_str().starts_with(ns_chars.as_str())
        }
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

impl Default for UrlScoper {
    fn default() -> Self {
        Self::new(ScopeConfig::default())
    }
}

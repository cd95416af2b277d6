//! robots.txt gate, resolved once per host and cached for the crawl.

use async_trait::async_trait;
use dashmap::DashMap;
use robotstxt::DefaultMatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::url_utils;

/// Answers whether a URL may be fetched.
#[async_trait]
pub trait RobotsPolicy: Send + Sync {
    async fn allowed(&self, url: &str) -> bool;
}

/// Permits everything. Used when robots.txt checking is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl RobotsPolicy for AllowAll {
    async fn allowed(&self, _url: &str) -> bool {
        true
    }
}

/// Fetches `/robots.txt` for each host on first use and matches URLs
/// against it. Any failure to obtain the file (timeout, connection error,
/// non-success status) disallows the whole host.
pub struct RobotsGate {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
    /// robots.txt URL -> body, or `None` when it could not be fetched.
    cache: DashMap<String, Option<Arc<String>>>,
}

impl RobotsGate {
    pub fn new(client: reqwest::Client, user_agent: String, timeout_secs: u64) -> Self {
        Self {
            client,
            user_agent,
            timeout: Duration::from_secs(timeout_secs),
            cache: DashMap::new(),
        }
    }

    /// Seed the cache, e.g. from a file fetched out of band.
    pub fn insert(&self, robots_url: &str, body: Option<String>) {
        self.cache.insert(robots_url.to_string(), body.map(Arc::new));
    }

    pub fn cached_hosts(&self) -> usize {
        self.cache.len()
    }

    /// Matching only; `true` when `robots_txt` lets our agent fetch `url`.
    pub fn is_allowed_by(robots_txt: &str, user_agent: &str, url: &str) -> bool {
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(robots_txt, user_agent, url)
    }

    async fn fetch_robots(&self, robots_url: &str) -> Option<String> {
        let request = self.client.get(robots_url).send();
        let response = match timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(url = robots_url, error = %e, "robots.txt fetch failed");
                return None;
            }
            Err(_) => {
                warn!(url = robots_url, "robots.txt fetch timed out");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = robots_url, status = response.status().as_u16(), "robots.txt unavailable");
            return None;
        }

        match timeout(self.timeout, response.text()).await {
            Ok(Ok(body)) => Some(body),
            Ok(Err(e)) => {
                warn!(url = robots_url, error = %e, "robots.txt body unreadable");
                None
            }
            Err(_) => {
                warn!(url = robots_url, "robots.txt body timed out");
                None
            }
        }
    }

    async fn rules_for(&self, robots_url: &str) -> Option<Arc<String>> {
        let cached = self.cache.get(robots_url).map(|entry| entry.value().clone());
        if let Some(rules) = cached {
            return rules;
        }
        // Not holding a map guard across the await; a concurrent miss may fetch twice.
        let fetched = self.fetch_robots(robots_url).await.map(Arc::new);
        debug!(url = robots_url, available = fetched.is_some(), "Cached robots.txt");
        self.cache
            .entry(robots_url.to_string())
            .or_insert(fetched)
            .value()
            .clone()
    }
}

#[async_trait]
impl RobotsPolicy for RobotsGate {
    async fn allowed(&self, url: &str) -> bool {
        let Some(robots_url) = url_utils::robots_url(url) else {
            return false;
        };
        match self.rules_for(&robots_url).await {
            Some(rules) => Self::is_allowed_by(&rules, &self.user_agent, url),
            None => false,
        }
    }
}

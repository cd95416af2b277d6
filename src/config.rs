// Global configuration constants - single source of truth

use serde::{Deserialize, Serialize};

use crate::frontier::TraversalPolicy;
use crate::url_utils::normalize_url_for_cli;

pub struct Config;

impl Config {
    // Crawl scope
    pub const DEFAULT_ROOT: &'static str = "https://en.wikipedia.org/wiki/";
    pub const DEFAULT_HOME_PAGE: &'static str = "https://en.wikipedia.org/wiki/Main_Page";

    // HTTP/Network config
    pub const FETCH_TIMEOUT_SECS: u64 = 5;
    pub const ROBOTS_TIMEOUT_SECS: u64 = 2;
    pub const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
    pub const POOL_IDLE_PER_HOST: usize = 4;
    pub const POOL_IDLE_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_USER_AGENT: &'static str = "scraper";

    // Per-document caps used by the binary
    pub const DEFAULT_LINKS_PER_PAGE: usize = 1000;
    pub const DEFAULT_KEYWORDS_PER_PAGE: usize = 30;

    // Driver
    pub const PROGRESS_INTERVAL: usize = 100;

    // On-disk layout inside the data directory
    pub const INDEX_FILE: &'static str = "index.db";
    pub const JOURNAL_FILE: &'static str = "frontier.redb";
}

/// Runtime knobs for one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub robots_timeout_secs: u64,
    pub respect_robots: bool,
    /// Stop after this many dequeued URLs.
    pub max_pages: Option<usize>,
    /// Cap on newly admitted links per fetched page.
    pub links_per_page: Option<usize>,
    /// Keep only the top-N keywords of each page.
    pub keywords_per_page: Option<usize>,
    /// Documents committed between full TF-IDF recomputation passes.
    pub recompute_interval: Option<usize>,
    /// Stop as soon as this URL has been visited.
    pub stop_at: Option<String>,
    /// Re-queue URLs whose fetch failed in an earlier run when resuming.
    pub retry_failed_on_resume: bool,
    pub policy: TraversalPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: Config::DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: Config::FETCH_TIMEOUT_SECS,
            robots_timeout_secs: Config::ROBOTS_TIMEOUT_SECS,
            respect_robots: true,
            max_pages: None,
            links_per_page: None,
            keywords_per_page: None,
            recompute_interval: None,
            stop_at: None,
            retry_failed_on_resume: false,
            policy: TraversalPolicy::Fifo,
        }
    }
}

impl CrawlerConfig {
    /// Set the traversal policy from an optional target. A target given as a
    /// URL also becomes the stop condition unless `stop_at` names one.
    pub fn with_target(mut self, target: Option<String>, stop_at: Option<String>) -> Self {
        let target_stop = target
            .as_deref()
            .filter(|t| t.contains("://"))
            .map(normalize_url_for_cli);
        self.stop_at = stop_at.map(|s| normalize_url_for_cli(&s)).or(target_stop);
        self.policy = match target {
            Some(target) => TraversalPolicy::TargetSimilarity { target },
            None => TraversalPolicy::Fifo,
        };
        self
    }
}

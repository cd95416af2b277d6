use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{Config, CrawlerConfig};
use crate::frontier::Frontier;
use crate::index::{CorpusIndex, IndexError};
use crate::models::{DocumentRecord, Site, VisitOutcome};
use crate::network::PageFetcher;
use crate::normalizer::DocumentNormalizer;
use crate::parser;
use crate::robots::RobotsPolicy;
use crate::state::StateError;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Why the crawl loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    FrontierExhausted,
    TargetFound,
    PageLimit,
    Stopped,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::FrontierExhausted => "frontier exhausted",
            StopReason::TargetFound => "target found",
            StopReason::PageLimit => "page limit reached",
            StopReason::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// URLs dequeued and marked visited.
    pub processed: usize,
    pub indexed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Links newly admitted to the frontier.
    pub discovered: usize,
    /// Documents in the index when the crawl ended.
    pub documents: u64,
    pub duration_secs: u64,
    pub stop_reason: StopReason,
}

impl std::fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed ({} indexed, {} failed, {} skipped), {} discovered, {} documents in {}s ({})",
            self.processed,
            self.indexed,
            self.failed,
            self.skipped,
            self.discovered,
            self.documents,
            self.duration_secs,
            self.stop_reason
        )
    }
}

/// Shared flag that ends the crawl after the page in progress.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<Mutex<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        *self.0.lock() = false;
    }

    pub fn is_running(&self) -> bool {
        *self.0.lock()
    }
}

/// Sequential crawl loop: one URL is fetched, normalized and committed
/// before the next is dequeued.
#[derive(Clone)]
pub struct CrawlDriver {
    config: CrawlerConfig,
    frontier: Arc<Frontier>,
    index: Arc<CorpusIndex>,
    normalizer: Arc<DocumentNormalizer>,
    fetcher: Arc<dyn PageFetcher>,
    robots: Arc<dyn RobotsPolicy>,
    running: Arc<Mutex<bool>>,
}

#[derive(Default)]
struct Counters {
    processed: usize,
    indexed: usize,
    failed: usize,
    skipped: usize,
    discovered: usize,
    since_recompute: usize,
}

impl CrawlDriver {
    /// Create the driver with the provided dependencies
    pub fn new(
        config: CrawlerConfig,
        frontier: Arc<Frontier>,
        index: Arc<CorpusIndex>,
        normalizer: Arc<DocumentNormalizer>,
        fetcher: Arc<dyn PageFetcher>,
        robots: Arc<dyn RobotsPolicy>,
    ) -> Self {
        Self {
            config,
            frontier,
            index,
            normalizer,
            fetcher,
            robots,
            running: Arc::new(Mutex::new(true)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn index(&self) -> &Arc<CorpusIndex> {
        &self.index
    }

    /// Run until the frontier is empty or a stop condition is hit.
    pub async fn crawl(&self) -> Result<CrawlSummary, CrawlError> {
        let start = Instant::now();
        let stop_at = self
            .config
            .stop_at
            .as_deref()
            .and_then(|url| self.frontier.scoper().normalize(url));

        info!(
            queued = self.frontier.queued_len(),
            policy = ?self.frontier.policy(),
            "Starting crawl"
        );

        let mut counters = Counters::default();
        let stop_reason = loop {
            if !*self.running.lock() {
                break StopReason::Stopped;
            }
            if self.config.max_pages.map_or(false, |max| counters.processed >= max) {
                break StopReason::PageLimit;
            }
            let Some(site) = self.frontier.next() else {
                break StopReason::FrontierExhausted;
            };

            let (outcome, discovered) = self.process_site(&site).await;
            self.frontier.mark_visited(&site.url, outcome);

            counters.processed += 1;
            counters.discovered += discovered;
            match outcome {
                VisitOutcome::Indexed => {
                    counters.indexed += 1;
                    counters.since_recompute += 1;
                }
                VisitOutcome::Failed => counters.failed += 1,
                VisitOutcome::Skipped => counters.skipped += 1,
            }

            if let Some(interval) = self.config.recompute_interval {
                if interval > 0 && counters.since_recompute >= interval {
                    self.recompute();
                    counters.since_recompute = 0;
                }
            }

            if counters.processed % Config::PROGRESS_INTERVAL == 0 {
                info!(
                    processed = counters.processed,
                    indexed = counters.indexed,
                    failed = counters.failed,
                    "Progress: {}",
                    self.frontier.stats()
                );
            }

            if stop_at.as_deref() == Some(site.url.as_str()) {
                info!(url = %site.url, "Reached stop target");
                break StopReason::TargetFound;
            }
        };

        if counters.since_recompute > 0 {
            self.recompute();
        }

        let summary = CrawlSummary {
            processed: counters.processed,
            indexed: counters.indexed,
            failed: counters.failed,
            skipped: counters.skipped,
            discovered: counters.discovered,
            documents: self.index.document_count()?,
            duration_secs: start.elapsed().as_secs(),
            stop_reason,
        };
        info!("Crawl finished: {}", summary);
        Ok(summary)
    }

    fn recompute(&self) {
        if let Err(e) = self.index.recompute_all_tfidf() {
            error!(error = %e, "TF-IDF recomputation failed");
        }
    }

    /// Fetch, extract, normalize and commit one page. Never fails: every
    /// problem is logged and folded into the outcome.
    async fn process_site(&self, site: &Site) -> (VisitOutcome, usize) {
        let url = site.url.as_str();

        if self.config.respect_robots && !self.robots.allowed(url).await {
            warn!(url, "Disallowed by robots.txt");
            return (VisitOutcome::Skipped, 0);
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) if e.is_skip() => {
                debug!(url, error = %e, "Skipping");
                return (VisitOutcome::Skipped, 0);
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                return (VisitOutcome::Failed, 0);
            }
        };

        let extracted = parser::extract_page(&page.html, &page.url);
        if extracted.text.is_empty() {
            debug!(url, "No indexable text extracted");
        }

        let mut keywords = self.normalizer.normalize(&extracted.text);
        if let Some(cap) = self.config.keywords_per_page {
            keywords = keywords.top(cap);
        }

        let discovered = self.frontier.discover(&extracted.links);

        let record = DocumentRecord::new(extracted, url.to_string(), keywords);
        match self.index.add_document(&record) {
            Ok(document_id) => {
                debug!(
                    url,
                    document_id,
                    keywords = record.keywords.len(),
                    discovered,
                    "Indexed"
                );
                (VisitOutcome::Indexed, discovered)
            }
            Err(e) => {
                error!(url, error = %e, "Index commit failed, document rolled back");
                (VisitOutcome::Failed, discovered)
            }
        }
    }
}

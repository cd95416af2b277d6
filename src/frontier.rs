use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::models::{Site, VisitOutcome};
use crate::scope::UrlScoper;
use crate::similarity;
use crate::state::{FrontierJournal, StateError};
use crate::url_utils;

/// Order in which queued URLs are handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraversalPolicy {
    /// Arrival order (breadth-first).
    Fifo,
    /// Highest similarity between the article title and `target` first;
    /// ties go to the lexicographically smaller URL.
    TargetSimilarity { target: String },
}

/// Lifecycle of a URL inside one frontier. There are no back-transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlState {
    Undiscovered,
    Queued,
    Visited,
}

#[derive(Debug)]
struct ScoredUrl {
    score: f64,
    url: String,
}

impl PartialEq for ScoredUrl {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredUrl {}

// Max-heap: higher score first, then the smaller URL.
impl Ord for ScoredUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.url.cmp(&self.url))
    }
}

impl PartialOrd for ScoredUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
enum WorkQueue {
    Fifo(VecDeque<String>),
    Priority(BinaryHeap<ScoredUrl>),
}

impl WorkQueue {
    fn push(&mut self, site: &Site) {
        match self {
            WorkQueue::Fifo(queue) => queue.push_back(site.url.clone()),
            WorkQueue::Priority(heap) => heap.push(ScoredUrl {
                score: site.priority.unwrap_or(0.0),
                url: site.url.clone(),
            }),
        }
    }

    fn pop(&mut self) -> Option<Site> {
        match self {
            WorkQueue::Fifo(queue) => queue.pop_front().map(|url| Site::new(url, None)),
            WorkQueue::Priority(heap) => heap.pop().map(|s| Site::new(s.url, Some(s.score))),
        }
    }

    fn len(&self) -> usize {
        match self {
            WorkQueue::Fifo(queue) => queue.len(),
            WorkQueue::Priority(heap) => heap.len(),
        }
    }
}

#[derive(Debug)]
struct FrontierInner {
    queue: WorkQueue,
    states: HashMap<String, UrlState>,
    visited: usize,
}

impl FrontierInner {
    fn state(&self, url: &str) -> UrlState {
        self.states.get(url).copied().unwrap_or(UrlState::Undiscovered)
    }
}

/// Owns the work queue and the visited set. All transitions happen under one
/// lock, so a URL is dequeued at most once even with concurrent callers.
pub struct Frontier {
    scoper: UrlScoper,
    policy: TraversalPolicy,
    /// Lowercased target title for the similarity policy.
    target: Option<String>,
    link_cap: Option<usize>,
    inner: Mutex<FrontierInner>,
    journal: Option<Arc<FrontierJournal>>,
}

impl Frontier {
    pub fn new(scoper: UrlScoper, policy: TraversalPolicy) -> Self {
        let queue = match policy {
            TraversalPolicy::Fifo => WorkQueue::Fifo(VecDeque::new()),
            TraversalPolicy::TargetSimilarity { .. } => WorkQueue::Priority(BinaryHeap::new()),
        };
        let target = match &policy {
            TraversalPolicy::Fifo => None,
            TraversalPolicy::TargetSimilarity { target } => Some(Self::target_title(target)),
        };
        Self {
            scoper,
            policy,
            target,
            link_cap: None,
            inner: Mutex::new(FrontierInner {
                queue,
                states: HashMap::new(),
                visited: 0,
            }),
            journal: None,
        }
    }

    /// Admit at most `cap` new links per `discover` call.
    pub fn with_link_cap(mut self, cap: Option<usize>) -> Self {
        self.link_cap = cap;
        self
    }

    /// Persist every admission and visit to `journal`.
    pub fn with_journal(mut self, journal: Arc<FrontierJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Rebuild a frontier from its journal. URLs admitted but never visited
    /// are queued again in admission order; visited URLs stay visited unless
    /// `retry_failed` is set and their last outcome was a failure.
    pub fn restore(
        scoper: UrlScoper,
        policy: TraversalPolicy,
        journal: Arc<FrontierJournal>,
        retry_failed: bool,
    ) -> Result<Self, StateError> {
        let snapshot = journal.load()?;
        let frontier = Self::new(scoper, policy).with_journal(Arc::clone(&journal));

        let mut requeued = 0usize;
        {
            let mut inner = frontier.inner.lock();
            for (url, outcome) in &snapshot.visited {
                if retry_failed && *outcome == VisitOutcome::Failed {
                    continue;
                }
                inner.states.insert(url.clone(), UrlState::Visited);
                inner.visited += 1;
            }
            for entry in snapshot.queued {
                if inner.state(&entry.url) != UrlState::Undiscovered {
                    continue;
                }
                // Re-score: the policy may differ from the one that wrote the log.
                let site = Site::new(entry.url.clone(), frontier.priority_for(&entry.url));
                inner.states.insert(site.url.clone(), UrlState::Queued);
                inner.queue.push(&site);
                requeued += 1;
            }
        }

        debug!(requeued, visited = frontier.visited_count(), "Frontier restored from journal");
        Ok(frontier)
    }

    pub fn policy(&self) -> &TraversalPolicy {
        &self.policy
    }

    pub fn scoper(&self) -> &UrlScoper {
        &self.scoper
    }

    fn target_title(target: &str) -> String {
        url_utils::article_title(target)
            .filter(|_| target.contains("://"))
            .unwrap_or_else(|| target.trim().replace('_', " ").to_lowercase())
    }

    fn priority_for(&self, url: &str) -> Option<f64> {
        let target = self.target.as_deref()?;
        let title = url_utils::article_title(url).unwrap_or_default();
        Some(similarity::similarity(&title, target))
    }

    /// Admit initial URLs as queued. Seeds bypass the scope predicate but must
    /// be absolute http(s) URLs. Returns how many were newly queued.
    pub fn seed<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.lock();
        let mut admitted = Vec::new();
        for url in urls {
            let Some(normalized) = self.scoper.normalize(url.as_ref()) else {
                warn!(url = url.as_ref(), "Ignoring malformed seed URL");
                continue;
            };
            self.admit(&mut inner, normalized, &mut admitted);
        }
        self.journal_admitted(&admitted);
        admitted.len()
    }

    /// Admit newly discovered links: in scope, and neither queued nor visited.
    /// Rediscovery is a no-op. Returns how many were newly queued.
    pub fn discover<S: AsRef<str>>(&self, links: &[S]) -> usize {
        let mut inner = self.inner.lock();
        let mut admitted = Vec::new();
        for link in links {
            if self.link_cap.map_or(false, |cap| admitted.len() >= cap) {
                break;
            }
            let link = link.as_ref();
            if !self.scoper.is_in_scope(link) {
                trace!(url = link, "Out of scope");
                continue;
            }
            let Some(normalized) = self.scoper.normalize(link) else {
                continue;
            };
            self.admit(&mut inner, normalized, &mut admitted);
        }
        // Still under the lock so the log order matches queue order.
        self.journal_admitted(&admitted);
        admitted.len()
    }

    fn admit(&self, inner: &mut FrontierInner, url: String, admitted: &mut Vec<Site>) {
        if inner.state(&url) != UrlState::Undiscovered {
            return;
        }
        let priority = self.priority_for(&url);
        let site = Site::new(url, priority);
        inner.states.insert(site.url.clone(), UrlState::Queued);
        inner.queue.push(&site);
        trace!(url = %site.url, priority = ?site.priority, "Queued");
        admitted.push(site);
    }

    /// One journal transaction per page's worth of admissions.
    fn journal_admitted(&self, admitted: &[Site]) {
        let Some(journal) = &self.journal else {
            return;
        };
        if let Err(e) = journal.append_queued_batch(admitted) {
            warn!(count = admitted.len(), error = %e, "Failed to journal admissions");
        }
    }

    /// Remove and return the next queued URL, or `None` when the crawl is done.
    pub fn next(&self) -> Option<Site> {
        self.inner.lock().queue.pop()
    }

    /// Mark `url` visited, whatever happened to it. Returns false if it was already visited.
    pub fn mark_visited(&self, url: &str, outcome: VisitOutcome) -> bool {
        let normalized = self
            .scoper
            .normalize(url)
            .unwrap_or_else(|| url.to_string());

        let transitioned = {
            let mut inner = self.inner.lock();
            let previous = inner.states.insert(normalized.clone(), UrlState::Visited);
            let transitioned = previous != Some(UrlState::Visited);
            if transitioned {
                inner.visited += 1;
            }
            transitioned
        };

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record_visit(&normalized, outcome) {
                warn!(url = %normalized, error = %e, "Failed to journal visit");
            }
        }
        transitioned
    }

    pub fn state(&self, url: &str) -> UrlState {
        match self.scoper.normalize(url) {
            Some(normalized) => self.inner.lock().state(&normalized),
            None => UrlState::Undiscovered,
        }
    }

    /// Number of URLs waiting to be dequeued.
    pub fn queued_len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.inner.lock().visited
    }

    pub fn is_empty(&self) -> bool {
        self.queued_len() == 0
    }

    pub fn stats(&self) -> FrontierStats {
        let inner = self.inner.lock();
        FrontierStats {
            known: inner.states.len(),
            queued: inner.queue.len(),
            visited: inner.visited,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrontierStats {
    pub known: usize,
    pub queued: usize,
    pub visited: usize,
}

impl std::fmt::Display for FrontierStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frontier: {} known URLs, {} queued, {} visited",
            self.known, self.queued, self.visited
        )
    }
}

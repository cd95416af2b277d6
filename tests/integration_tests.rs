use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use wiki_tfidf::*;

const WIKI: &str = "https://en.wikipedia.org/wiki/";

fn wiki(title: &str) -> String {
    format!("{}{}", WIKI, title)
}

/// Serves canned pages from memory and records every fetch.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn with_page(mut self, title: &str, html: &str) -> Self {
        self.pages.insert(wiki(title), html.to_string());
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetched.lock().push(url.to_string());
        match self.pages.get(url) {
            Some(html) => Ok(FetchedPage {
                url: url.to_string(),
                html: html.clone(),
                status_code: 200,
                content_type: Some("text/html".to_string()),
            }),
            None => Err(FetchError::HttpStatus(404)),
        }
    }
}

/// Disallows a fixed set of URLs.
#[derive(Default)]
struct DenyList(Vec<String>);

#[async_trait]
impl RobotsPolicy for DenyList {
    async fn allowed(&self, url: &str) -> bool {
        !self.0.iter().any(|u| u == url)
    }
}

struct Harness {
    driver: CrawlDriver,
    fetcher: Arc<StubFetcher>,
}

fn harness(
    fetcher: StubFetcher,
    robots: DenyList,
    config: CrawlerConfig,
    frontier: Frontier,
    index: Arc<CorpusIndex>,
) -> Harness {
    let fetcher = Arc::new(fetcher);
    let normalizer = Arc::new(DocumentNormalizer::new(
        Arc::new(LemmaDictionary::empty()),
        Arc::new(StopwordFilter::default()),
    ));
    let driver = CrawlDriver::new(
        config,
        Arc::new(frontier),
        index,
        normalizer,
        fetcher.clone(),
        Arc::new(robots),
    );
    Harness { driver, fetcher }
}

fn fifo_frontier() -> Frontier {
    Frontier::new(UrlScoper::default(), TraversalPolicy::Fifo)
}

#[tokio::test]
async fn test_single_page_scenario() {
    let fetcher = StubFetcher::default().with_page(
        "Biology",
        r#"<p>Evolution is change.</p>
           <a href="/wiki/Evolution">Evolution</a>
           <a href="/wiki/Special:Log">Log</a>"#,
    );
    let frontier = fifo_frontier();
    frontier.seed([wiki("Biology")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let config = CrawlerConfig {
        max_pages: Some(1),
        ..CrawlerConfig::default()
    };
    let h = harness(fetcher, DenyList::default(), config, frontier, index.clone());

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::PageLimit);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.documents, 1);

    let frontier = h.driver.frontier();
    assert_eq!(frontier.queued_len(), 1);
    assert_eq!(frontier.state(&wiki("Evolution")), UrlState::Queued);
    assert_eq!(frontier.state(&wiki("Special:Log")), UrlState::Undiscovered);
    assert_eq!(frontier.state(&wiki("Biology")), UrlState::Visited);

    assert_eq!(index.document_count().unwrap(), 1);
    assert_eq!(index.term_frequency(&wiki("Biology"), "evolution").unwrap(), Some(0.5));
    assert_eq!(index.term_frequency(&wiki("Biology"), "change").unwrap(), Some(0.5));
    assert_eq!(index.term_frequency(&wiki("Biology"), "is").unwrap(), None);
    assert_eq!(index.stats().unwrap().keywords, 2);
}

#[tokio::test]
async fn test_cyclic_graph_and_failures() {
    let fetcher = StubFetcher::default()
        .with_page("A", r#"<p>alpha page</p><a href="/wiki/B">B</a><a href="/wiki/A">self</a>"#)
        .with_page(
            "B",
            r#"<p>beta page</p><a href="/wiki/A">A</a><a href="/wiki/Missing">gone</a>"#,
        );
    let frontier = fifo_frontier();
    frontier.seed([wiki("A")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let h = harness(fetcher, DenyList::default(), CrawlerConfig::default(), frontier, index.clone());

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.indexed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.documents, 2);

    // Every URL fetched exactly once despite the cycle.
    assert_eq!(h.fetcher.fetched(), vec![wiki("A"), wiki("B"), wiki("Missing")]);
    assert_eq!(h.driver.frontier().state(&wiki("Missing")), UrlState::Visited);
    assert_eq!(index.document_id(&wiki("Missing")).unwrap(), None);

    // The final recompute pass leaves stored weights equal to live ones.
    let live = index.tfidf(&wiki("A"), "alpha").unwrap().unwrap();
    let stored = index.stored_tfidf(&wiki("A"), "alpha").unwrap().unwrap();
    assert!((live - stored).abs() < 1e-12);
}

#[tokio::test]
async fn test_robots_disallowed_page_is_skipped() {
    let fetcher = StubFetcher::default()
        .with_page("A", r#"<p>alpha</p><a href="/wiki/Secret">s</a>"#)
        .with_page("Secret", "<p>hidden</p>");
    let frontier = fifo_frontier();
    frontier.seed([wiki("A")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let h = harness(
        fetcher,
        DenyList(vec![wiki("Secret")]),
        CrawlerConfig::default(),
        frontier,
        index.clone(),
    );

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.documents, 1);
    assert_eq!(h.fetcher.fetched(), vec![wiki("A")]);
    assert_eq!(h.driver.frontier().state(&wiki("Secret")), UrlState::Visited);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let fetcher = StubFetcher::default().with_page("A", "<p>alpha</p>");
    let frontier = fifo_frontier();
    frontier.seed([wiki("A")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let config = CrawlerConfig {
        respect_robots: false,
        ..CrawlerConfig::default()
    };
    let h = harness(fetcher, DenyList(vec![wiki("A")]), config, frontier, index);

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.indexed, 1);
}

#[tokio::test]
async fn test_stop_at_target() {
    let fetcher = StubFetcher::default()
        .with_page("A", r#"<p>start</p><a href="/wiki/Charles_Darwin">d</a><a href="/wiki/Physics">p</a>"#)
        .with_page("Charles_Darwin", "<p>naturalist</p>")
        .with_page("Physics", "<p>matter</p>");
    let frontier = Frontier::new(
        UrlScoper::default(),
        TraversalPolicy::TargetSimilarity {
            target: wiki("Charles_Darwin"),
        },
    );
    frontier.seed([wiki("A")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let config = CrawlerConfig {
        stop_at: Some(wiki("Charles_Darwin")),
        ..CrawlerConfig::default()
    };
    let h = harness(fetcher, DenyList::default(), config, frontier, index);

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::TargetFound);
    assert_eq!(summary.processed, 2);
    assert_eq!(h.fetcher.fetched(), vec![wiki("A"), wiki("Charles_Darwin")]);
    assert_eq!(h.driver.frontier().state(&wiki("Physics")), UrlState::Queued);
}

#[tokio::test]
async fn test_stop_handle() {
    let fetcher = StubFetcher::default().with_page("A", "<p>alpha</p>");
    let frontier = fifo_frontier();
    frontier.seed([wiki("A")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let h = harness(fetcher, DenyList::default(), CrawlerConfig::default(), frontier, index);

    let stop = h.driver.stop_handle();
    assert!(stop.is_running());
    stop.stop();

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::Stopped);
    assert_eq!(summary.processed, 0);
    assert!(h.fetcher.fetched().is_empty());
}

#[tokio::test]
async fn test_keyword_and_link_caps() {
    let fetcher = StubFetcher::default().with_page(
        "A",
        r#"<p>zebra zebra zebra lion lion tiger</p>
           <a href="/wiki/B">b</a><a href="/wiki/C">c</a><a href="/wiki/D">d</a>"#,
    );
    let frontier = fifo_frontier().with_link_cap(Some(2));
    frontier.seed([wiki("A")]);
    let index = Arc::new(CorpusIndex::open_in_memory().unwrap());
    let config = CrawlerConfig {
        max_pages: Some(1),
        keywords_per_page: Some(2),
        ..CrawlerConfig::default()
    };
    let h = harness(fetcher, DenyList::default(), config, frontier, index.clone());

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.discovered, 2);
    assert_eq!(h.driver.frontier().state(&wiki("D")), UrlState::Undiscovered);

    assert_eq!(index.term_frequency(&wiki("A"), "zebra").unwrap(), Some(0.6));
    assert_eq!(index.term_frequency(&wiki("A"), "lion").unwrap(), Some(0.4));
    assert_eq!(index.term_frequency(&wiki("A"), "tiger").unwrap(), None);
}

#[tokio::test]
async fn test_resume_from_journal() {
    let dir = TempDir::new().unwrap();
    let index = Arc::new(CorpusIndex::open(dir.path().join("index.db")).unwrap());
    let pages = || {
        StubFetcher::default()
            .with_page("A", r#"<p>alpha</p><a href="/wiki/B">b</a>"#)
            .with_page("B", r#"<p>beta</p><a href="/wiki/A">a</a>"#)
    };

    {
        let journal = Arc::new(FrontierJournal::new(dir.path(), "frontier.redb").unwrap());
        let frontier = fifo_frontier().with_journal(journal);
        frontier.seed([wiki("A")]);
        let config = CrawlerConfig {
            max_pages: Some(1),
            ..CrawlerConfig::default()
        };
        let h = harness(pages(), DenyList::default(), config, frontier, index.clone());
        let summary = h.driver.crawl().await.unwrap();
        assert_eq!(summary.processed, 1);
    }

    let journal = Arc::new(FrontierJournal::new(dir.path(), "frontier.redb").unwrap());
    let frontier =
        Frontier::restore(UrlScoper::default(), TraversalPolicy::Fifo, journal, false).unwrap();
    // Re-seeding a visited URL is a no-op.
    assert_eq!(frontier.seed([wiki("A")]), 0);
    let h = harness(pages(), DenyList::default(), CrawlerConfig::default(), frontier, index.clone());

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(h.fetcher.fetched(), vec![wiki("B")]);
    assert_eq!(summary.documents, 2);
}

#[test]
fn test_search_through_normalizer() {
    let index = CorpusIndex::open_in_memory().unwrap();
    let normalizer = DocumentNormalizer::new(
        Arc::new(LemmaDictionary::from_pairs([("run", "running")])),
        Arc::new(StopwordFilter::default()),
    );

    for (url, text) in [
        ("https://en.wikipedia.org/wiki/Marathon", "Running a marathon means running far."),
        ("https://en.wikipedia.org/wiki/Chess", "Chess is a board game."),
    ] {
        let page = ExtractedPage {
            text: text.to_string(),
            ..ExtractedPage::default()
        };
        let keywords = normalizer.normalize(&page.text);
        index
            .add_document(&DocumentRecord::new(page, url.to_string(), keywords))
            .unwrap();
    }
    index.recompute_all_tfidf().unwrap();

    let hits = index.search(&normalizer.query_keywords("the runner is running"), 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Marathon");
}

#[tokio::test]
async fn test_index_write_failure_marks_page_failed() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("index.db");
    let index = Arc::new(CorpusIndex::open(&db_path).unwrap());

    // A second connection makes the store refuse one keyword.
    let saboteur = rusqlite::Connection::open(&db_path).unwrap();
    saboteur
        .execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON keywords WHEN NEW.keyword = 'boom'
             BEGIN SELECT RAISE(ABORT, 'storage unavailable'); END;",
        )
        .unwrap();
    drop(saboteur);

    let fetcher = StubFetcher::default()
        .with_page("A", r#"<p>boom crash</p><a href="/wiki/B">B</a>"#)
        .with_page("B", r#"<p>quiet meadow</p>"#);
    let frontier = fifo_frontier();
    frontier.seed([wiki("A")]);
    let h = harness(fetcher, DenyList::default(), CrawlerConfig::default(), frontier, index.clone());

    let summary = h.driver.crawl().await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.documents, 1);

    // A stays visited and its links were still followed.
    assert_eq!(h.driver.frontier().state(&wiki("A")), UrlState::Visited);
    assert_eq!(h.driver.frontier().state(&wiki("B")), UrlState::Visited);
    assert_eq!(h.fetcher.fetched(), vec![wiki("A"), wiki("B")]);

    // Nothing of A survived the rollback.
    assert_eq!(index.document_id(&wiki("A")).unwrap(), None);
    assert_eq!(index.keyword_id("crash").unwrap(), None);
    assert!(index.document_id(&wiki("B")).unwrap().is_some());
    assert_eq!(index.term_frequency(&wiki("B"), "meadow").unwrap(), Some(0.5));
}

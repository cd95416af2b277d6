pub mod bfs_crawler;
pub mod cli;
pub mod config;
pub mod frontier;
pub mod index;
pub mod lemma;
pub mod logging;
pub mod models;
pub mod network;
pub mod normalizer;
pub mod parser;
pub mod robots;
pub mod scope;
pub mod seeder;
pub mod similarity;
pub mod state;
pub mod stopwords;
pub mod url_utils;

// Re-export main types for library usage
pub use bfs_crawler::{CrawlDriver, CrawlError, CrawlSummary, StopHandle, StopReason};
pub use config::{Config, CrawlerConfig};
pub use frontier::{Frontier, FrontierStats, TraversalPolicy, UrlState};
pub use index::{CorpusIndex, IndexError, IndexStats, SearchHit};
pub use lemma::LemmaDictionary;
pub use models::{DocumentRecord, ExtractedPage, Site, VisitOutcome};
pub use network::{FetchError, FetchedPage, HttpClient, PageFetcher};
pub use normalizer::{DocumentNormalizer, Keyword, KeywordCounts};
pub use parser::{extract_links, extract_page};
pub use robots::{AllowAll, RobotsGate, RobotsPolicy};
pub use scope::{ScopeConfig, UrlScoper};
pub use state::{FrontierJournal, StateError};
pub use stopwords::StopwordFilter;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use wiki_tfidf::bfs_crawler::{CrawlDriver, CrawlError, StopHandle};
use wiki_tfidf::cli::{cap, Cli, Commands};
use wiki_tfidf::config::{Config, CrawlerConfig};
use wiki_tfidf::frontier::Frontier;
use wiki_tfidf::index::{CorpusIndex, IndexError};
use wiki_tfidf::lemma::LemmaDictionary;
use wiki_tfidf::logging::init_logging_in_data_dir;
use wiki_tfidf::network::{FetchError, HttpClient};
use wiki_tfidf::normalizer::DocumentNormalizer;
use wiki_tfidf::robots::{AllowAll, RobotsGate, RobotsPolicy};
use wiki_tfidf::scope::{ScopeConfig, UrlScoper};
use wiki_tfidf::seeder::read_seed_file;
use wiki_tfidf::state::{FrontierJournal, StateError};
use wiki_tfidf::stopwords::StopwordFilter;
use wiki_tfidf::url_utils::normalize_url_for_cli;

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Crawler error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("HTTP client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Logging error: {0}")]
    Logging(String),
}

struct CrawlOptions {
    seeds: Vec<String>,
    seed_file: Option<String>,
    data_dir: String,
    root: String,
    lemma_file: Option<String>,
    extra_stopwords: Vec<String>,
    target: Option<String>,
    config: CrawlerConfig,
}

fn load_normalizer(lemma_file: Option<&str>, extra_stopwords: &[String]) -> Arc<DocumentNormalizer> {
    let lemmas = match lemma_file {
        Some(path) => LemmaDictionary::load(path),
        None => LemmaDictionary::empty(),
    };
    let stopwords = StopwordFilter::default().with_extra(extra_stopwords.iter());
    Arc::new(DocumentNormalizer::new(Arc::new(lemmas), Arc::new(stopwords)))
}

/// Build crawl dependencies and wire concrete components together
fn build_driver(options: &CrawlOptions) -> Result<CrawlDriver, MainError> {
    let data_dir = Path::new(&options.data_dir);
    let config = options.config.clone();

    let scoper = UrlScoper::new(ScopeConfig {
        root: options.root.clone(),
        ..ScopeConfig::default()
    });

    let journal = Arc::new(FrontierJournal::new(data_dir, Config::JOURNAL_FILE)?);
    let frontier = Frontier::restore(
        scoper,
        config.policy.clone(),
        journal,
        config.retry_failed_on_resume,
    )?
    .with_link_cap(config.links_per_page);

    let mut seeds: Vec<String> = options.seeds.iter().map(|s| normalize_url_for_cli(s)).collect();
    if let Some(path) = &options.seed_file {
        seeds.extend(read_seed_file(path)?);
    }
    let seeded = frontier.seed(&seeds);
    info!(seeded, "{}", frontier.stats());
    if frontier.is_empty() {
        warn!("Frontier is empty: pass --seed or --seed-file, or every seed was already visited");
    }

    let index = Arc::new(CorpusIndex::open(data_dir.join(Config::INDEX_FILE))?);
    let normalizer = load_normalizer(options.lemma_file.as_deref(), &options.extra_stopwords);

    let http = HttpClient::new(config.user_agent.clone(), config.fetch_timeout_secs)?;
    let robots: Arc<dyn RobotsPolicy> = if config.respect_robots {
        Arc::new(RobotsGate::new(
            http.inner().clone(),
            config.user_agent.clone(),
            config.robots_timeout_secs,
        ))
    } else {
        Arc::new(AllowAll)
    };

    Ok(CrawlDriver::new(
        config,
        Arc::new(frontier),
        index,
        normalizer,
        Arc::new(http),
        robots,
    ))
}

/// First Ctrl+C finishes the current page and stops. Second Ctrl+C exits immediately.
fn setup_shutdown_handler(stop: StopHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nReceived Ctrl+C, stopping after the current page...");
            println!("Press Ctrl+C again to force quit");
            stop.stop();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nForce quit requested, exiting immediately...");
                std::process::exit(1);
            }
        }
    });
}

async fn run_crawl_command(options: CrawlOptions) -> Result<(), MainError> {
    if let Some(target) = &options.target {
        println!("Crawling toward '{}' from {}", target, options.root);
    } else {
        println!("Crawling {} breadth-first", options.root);
    }

    let driver = build_driver(&options)?;
    setup_shutdown_handler(driver.stop_handle());

    let summary = driver.crawl().await?;
    println!("{}", summary);
    println!("Data: {}", options.data_dir);
    Ok(())
}

fn run_recompute_command(data_dir: &str) -> Result<(), MainError> {
    let index = CorpusIndex::open(Path::new(data_dir).join(Config::INDEX_FILE))?;
    let updated = index.recompute_all_tfidf()?;
    println!("Recomputed {} keyword associations", updated);
    Ok(())
}

fn run_search_command(
    query: &[String],
    data_dir: &str,
    limit: usize,
    lemma_file: Option<&str>,
) -> Result<(), MainError> {
    let index = CorpusIndex::open(Path::new(data_dir).join(Config::INDEX_FILE))?;
    let normalizer = load_normalizer(lemma_file, &[]);
    let keywords = normalizer.query_keywords(&query.join(" "));
    if keywords.is_empty() {
        println!("No indexable words in query");
        return Ok(());
    }

    let hits = index.search(&keywords, limit)?;
    if hits.is_empty() {
        println!("No matches");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}. {:.4}  {}  {}",
            rank + 1,
            hit.score,
            hit.url,
            hit.title.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn run_stats_command(data_dir: &str) -> Result<(), MainError> {
    let data_dir = Path::new(data_dir);
    let index = CorpusIndex::open(data_dir.join(Config::INDEX_FILE))?;
    println!("{}", index.stats()?);

    let journal = FrontierJournal::new(data_dir, Config::JOURNAL_FILE)?;
    println!(
        "Journal: {} admitted, {} visited",
        journal.queued_len()?,
        journal.visited_len()?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Crawl {
            seeds,
            seed_file,
            data_dir,
            root,
            user_agent,
            timeout,
            robots_timeout,
            ignore_robots,
            max_pages,
            links_per_page,
            keywords_per_page,
            recompute_interval,
            target,
            stop_at,
            retry_failed,
            lemma_file,
            extra_stopwords,
        } => {
            let _guards = init_logging_in_data_dir(&data_dir)
                .map_err(|e| MainError::Logging(e.to_string()))?;

            let config = CrawlerConfig {
                user_agent,
                fetch_timeout_secs: timeout,
                robots_timeout_secs: robots_timeout,
                respect_robots: !ignore_robots,
                max_pages,
                links_per_page: cap(links_per_page),
                keywords_per_page: cap(keywords_per_page),
                recompute_interval,
                retry_failed_on_resume: retry_failed,
                ..CrawlerConfig::default()
            }
            .with_target(target.clone(), stop_at);

            run_crawl_command(CrawlOptions {
                seeds,
                seed_file,
                data_dir,
                root,
                lemma_file,
                extra_stopwords,
                target,
                config,
            })
            .await?;
        }
        Commands::Recompute { data_dir } => {
            let _guards = init_logging_in_data_dir(&data_dir)
                .map_err(|e| MainError::Logging(e.to_string()))?;
            run_recompute_command(&data_dir)?;
        }
        Commands::Search {
            query,
            data_dir,
            limit,
            lemma_file,
        } => {
            run_search_command(&query, &data_dir, limit, lemma_file.as_deref())?;
        }
        Commands::Stats { data_dir } => {
            run_stats_command(&data_dir)?;
        }
    }

    Ok(())
}

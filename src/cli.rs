use clap::{Parser, Subcommand};

use crate::config::Config;

/// Command line interface for crawling and querying the keyword index.
/// Exit codes: 0=success, 2=invalid arguments, 1=any runtime error
#[derive(Parser, Debug)]
#[command(name = "wiki_tfidf")]
#[command(about = "Crawl Wikipedia articles into a TF-IDF keyword index")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl from seed URLs, resuming any frontier saved in the data directory.
    Crawl {
        #[arg(short, long = "seed", help = "Seed URL (repeatable)")]
        seeds: Vec<String>,

        #[arg(long, help = "File with one seed per line, either `url` or `priority,url`")]
        seed_file: Option<String>,

        #[arg(short, long, default_value = "./data", help = "Directory for the index, journal and logs")]
        data_dir: String,

        #[arg(long, default_value = Config::DEFAULT_ROOT, help = "Only URLs under this prefix are crawled")]
        root: String,

        #[arg(short, long, default_value = Config::DEFAULT_USER_AGENT, help = "User agent string for requests")]
        user_agent: String,

        #[arg(short, long, default_value_t = Config::FETCH_TIMEOUT_SECS, help = "Page fetch timeout in seconds")]
        timeout: u64,

        #[arg(long, default_value_t = Config::ROBOTS_TIMEOUT_SECS, help = "robots.txt fetch timeout in seconds")]
        robots_timeout: u64,

        #[arg(long, help = "Disable robots.txt compliance")]
        ignore_robots: bool,

        #[arg(long, help = "Stop after this many pages")]
        max_pages: Option<usize>,

        #[arg(long, default_value_t = Config::DEFAULT_LINKS_PER_PAGE, help = "New links admitted per page (0 = unlimited)")]
        links_per_page: usize,

        #[arg(long, default_value_t = Config::DEFAULT_KEYWORDS_PER_PAGE, help = "Keywords kept per page (0 = unlimited)")]
        keywords_per_page: usize,

        #[arg(long, help = "Recompute all TF-IDF weights every N indexed pages")]
        recompute_interval: Option<usize>,

        #[arg(long, help = "Visit pages whose title is most similar to this article first")]
        target: Option<String>,

        #[arg(long, help = "Stop once this URL has been visited (defaults to --target when it is a URL)")]
        stop_at: Option<String>,

        #[arg(long, help = "Re-queue pages that failed in an earlier run")]
        retry_failed: bool,

        #[arg(long, help = "Lemma list with one `lemma,inflected` pair per line")]
        lemma_file: Option<String>,

        #[arg(long = "stopword", help = "Additional stopword (repeatable)")]
        extra_stopwords: Vec<String>,
    },

    /// Refresh every stored TF-IDF weight against the current corpus.
    Recompute {
        #[arg(short, long, default_value = "./data", help = "Directory containing the index")]
        data_dir: String,
    },

    /// Rank indexed pages for a free-text query.
    Search {
        #[arg(required = true, num_args = 1.., help = "Query words")]
        query: Vec<String>,

        #[arg(short, long, default_value = "./data", help = "Directory containing the index")]
        data_dir: String,

        #[arg(short, long, default_value_t = 10, help = "Maximum number of results")]
        limit: usize,

        #[arg(long, help = "Lemma list used when the index was built")]
        lemma_file: Option<String>,
    },

    /// Print document, keyword and frontier counts.
    Stats {
        #[arg(short, long, default_value = "./data", help = "Directory containing the index")]
        data_dir: String,
    },
}

/// `0` on the command line means "no cap".
pub fn cap(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}

impl Cli {
    /// Parse CLI arguments. On error, clap prints help and exits with code 2.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_command_minimal() {
        let cli = Cli::try_parse_from(["wiki_tfidf", "crawl", "--seed", "https://en.wikipedia.org/wiki/Biology"])
            .unwrap();
        match cli.command {
            Commands::Crawl {
                seeds,
                timeout,
                robots_timeout,
                links_per_page,
                keywords_per_page,
                user_agent,
                ignore_robots,
                target,
                ..
            } => {
                assert_eq!(seeds, vec!["https://en.wikipedia.org/wiki/Biology"]);
                assert_eq!(timeout, 5);
                assert_eq!(robots_timeout, 2);
                assert_eq!(links_per_page, 1000);
                assert_eq!(keywords_per_page, 30);
                assert_eq!(user_agent, "scraper");
                assert!(!ignore_robots);
                assert!(target.is_none());
            }
            _ => panic!("Expected Crawl command"),
        }
    }

    #[test]
    fn test_crawl_command_all_options() {
        let cli = Cli::try_parse_from([
            "wiki_tfidf",
            "crawl",
            "-s",
            "https://en.wikipedia.org/wiki/A",
            "-s",
            "https://en.wikipedia.org/wiki/B",
            "--seed-file",
            "seeds.csv",
            "--max-pages",
            "50",
            "--links-per-page",
            "0",
            "--target",
            "Charles Darwin",
            "--stop-at",
            "https://en.wikipedia.org/wiki/Charles_Darwin",
            "--stopword",
            "foo",
            "--ignore-robots",
            "--retry-failed",
        ])
        .unwrap();
        match cli.command {
            Commands::Crawl {
                seeds,
                seed_file,
                max_pages,
                links_per_page,
                target,
                stop_at,
                extra_stopwords,
                ignore_robots,
                retry_failed,
                ..
            } => {
                assert_eq!(seeds.len(), 2);
                assert_eq!(seed_file.as_deref(), Some("seeds.csv"));
                assert_eq!(max_pages, Some(50));
                assert_eq!(cap(links_per_page), None);
                assert_eq!(target.as_deref(), Some("Charles Darwin"));
                assert!(stop_at.is_some());
                assert_eq!(extra_stopwords, vec!["foo"]);
                assert!(ignore_robots);
                assert!(retry_failed);
            }
            _ => panic!("Expected Crawl command"),
        }
    }

    #[test]
    fn test_search_command() {
        let cli = Cli::try_parse_from(["wiki_tfidf", "search", "natural", "selection", "-l", "5"]).unwrap();
        match cli.command {
            Commands::Search { query, limit, data_dir, .. } => {
                assert_eq!(query, vec!["natural", "selection"]);
                assert_eq!(limit, 5);
                assert_eq!(data_dir, "./data");
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["wiki_tfidf", "search"]).is_err());
    }

    #[test]
    fn test_stats_and_recompute() {
        assert!(matches!(
            Cli::try_parse_from(["wiki_tfidf", "stats", "-d", "/tmp/x"]).unwrap().command,
            Commands::Stats { .. }
        ));
        assert!(matches!(
            Cli::try_parse_from(["wiki_tfidf", "recompute"]).unwrap().command,
            Commands::Recompute { .. }
        ));
    }

    #[test]
    fn test_cap() {
        assert_eq!(cap(0), None);
        assert_eq!(cap(30), Some(30));
    }
}

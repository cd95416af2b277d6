use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::normalizer::KeywordCounts;

/// A crawl candidate as handed out by the frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Canonical absolute URL, the site's identity.
    pub url: String,
    /// Traversal priority; `None` under arrival-order traversal.
    #[serde(default)]
    pub priority: Option<f64>,
}

impl Site {
    pub fn new(url: String, priority: Option<f64>) -> Self {
        Self { url, priority }
    }
}

/// Terminal result recorded for a visited URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitOutcome {
    /// Fetched and committed to the index (possibly with no keywords).
    Indexed,
    /// Fetch, extraction or storage failure.
    Failed,
    /// Passed over on purpose: disallowed by robots.txt or not HTML.
    Skipped,
}

impl VisitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitOutcome::Indexed => "indexed",
            VisitOutcome::Failed => "failed",
            VisitOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indexed" => Ok(VisitOutcome::Indexed),
            "failed" => Ok(VisitOutcome::Failed),
            "skipped" => Ok(VisitOutcome::Skipped),
            other => Err(format!("unknown visit outcome: {other}")),
        }
    }
}

/// The four values the pipeline consumes from a fetched HTML page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// Visible text of heading, paragraph and title elements, space-joined.
    pub text: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absolute outbound links in document order.
    pub links: Vec<String>,
}

/// Everything committed to the index for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: KeywordCounts,
}

impl DocumentRecord {
    pub fn new(page: ExtractedPage, url: String, keywords: KeywordCounts) -> Self {
        Self {
            url,
            title: page.title,
            description: page.description,
            keywords,
        }
    }
}

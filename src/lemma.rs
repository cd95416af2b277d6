//! Exact-match lemma dictionary.
//!
//! Backed by a list of `lemma,inflected` pairs (comma or tab separated). Lookup
//! is a plain hash lookup on the already-lowercased word: there is no stemming,
//! so an inflection missing from the list passes through unchanged.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct LemmaDictionary {
    lemmas: HashMap<String, String>,
}

impl LemmaDictionary {
    /// Dictionary with no entries: every word maps to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(lemma, inflected)` pairs.
    pub fn from_pairs<I, L, F>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, F)>,
        L: AsRef<str>,
        F: AsRef<str>,
    {
        let mut lemmas = HashMap::new();
        for (lemma, inflected) in pairs {
            let lemma = lemma.as_ref().trim().to_lowercase();
            let inflected = inflected.as_ref().trim().to_lowercase();
            if lemma.is_empty() || inflected.is_empty() {
                continue;
            }
            lemmas.insert(inflected, lemma);
        }
        Self { lemmas }
    }

    /// Parse the list format. Lines without a separator are skipped.
    pub fn parse(content: &str) -> Self {
        let mut skipped = 0usize;
        let pairs = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let split = line
                    .split_once('\t')
                    .or_else(|| line.split_once(','));
                if split.is_none() {
                    skipped += 1;
                }
                split
            })
            .collect::<Vec<_>>();

        let dict = Self::from_pairs(pairs);
        if skipped > 0 {
            debug!(skipped, "Skipped malformed lemma lines");
        }
        dict
    }

    /// Load once at startup. A missing or unreadable source degrades to an
    /// empty dictionary rather than failing the crawl.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let dict = Self::parse(&content);
                info!(entries = dict.len(), path = %path.display(), "Lemma list loaded");
                dict
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Lemma list unavailable, lemmatization disabled");
                Self::empty()
            }
        }
    }

    /// Map an already-lowercased word to its lemma, or `None` when unknown.
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.lemmas.get(word).map(String::as_str)
    }

    pub fn lemmatize<'a>(&'a self, word: &'a str) -> &'a str {
        self.lookup(word).unwrap_or(word)
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lemmatize_known_and_unknown() {
        let dict = LemmaDictionary::from_pairs([("run", "running"), ("be", "was")]);
        assert_eq!(dict.lemmatize("running"), "run");
        assert_eq!(dict.lemmatize("jumped"), "jumped");
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let dict = LemmaDictionary::from_pairs([("run", "running")]);
        assert_eq!(dict.lookup("runnings"), None);
        assert_eq!(dict.lookup("Running"), None);
    }

    #[test]
    fn test_parse_comma_and_tab() {
        let dict = LemmaDictionary::parse("run,running\nrun\truns\n\n# comment\ngo , went\n");
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.lemmatize("runs"), "run");
        assert_eq!(dict.lemmatize("went"), "go");
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let dict = LemmaDictionary::parse("garbage\nrun,running\n");
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let dict = LemmaDictionary::load(dir.path().join("missing.csv"));
        assert!(dict.is_empty());
        assert_eq!(dict.lemmatize("running"), "running");
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lemmas.csv");
        std::fs::write(&path, "mouse,mice\n").unwrap();
        let dict = LemmaDictionary::load(&path);
        assert_eq!(dict.lemmatize("mice"), "mouse");
    }
}

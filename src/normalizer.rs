//! Turns extracted page text into lemmatized keyword counts.
//!
//! Pipeline per whitespace token: trim surrounding punctuation, reject
//! anything that is not a single ASCII alphabetic run of length > 1, reject
//! stopwords, lowercase, substitute the dictionary lemma when one exists,
//! then count. Normalization never fails; bad tokens are dropped.
//!
//! Lemmatization is exact-match only: "Cat" and "cats" stay distinct keywords
//! unless the dictionary maps one onto the other.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::lemma::LemmaDictionary;
use crate::stopwords::StopwordFilter;

lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"^[a-zA-Z]+$").expect("Invalid word regex");
}

/// A normalized index term: lowercase, one alphabetic run, longer than one char.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keyword(String);

impl Keyword {
    /// Lowercase and trim `raw`, returning `None` if the result is not a valid keyword.
    pub fn parse(raw: &str) -> Option<Self> {
        let word = raw.trim().to_lowercase();
        if Self::is_valid(&word) {
            Some(Self(word))
        } else {
            None
        }
    }

    fn is_valid(word: &str) -> bool {
        word.len() > 1 && WORD_PATTERN.is_match(word)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Keyword {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Keyword::parse(&value).ok_or_else(|| format!("invalid keyword: {value:?}"))
    }
}

impl From<Keyword> for String {
    fn from(keyword: Keyword) -> Self {
        keyword.0
    }
}

/// Raw occurrence counts per keyword for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCounts(BTreeMap<Keyword, u32>);

impl KeywordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, keyword: Keyword) {
        *self.0.entry(keyword).or_insert(0) += 1;
    }

    pub fn get(&self, keyword: &str) -> u32 {
        Keyword::parse(keyword)
            .and_then(|k| self.0.get(&k).copied())
            .unwrap_or(0)
    }

    /// Sum of raw counts, the denominator for term frequency.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&c| c as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, u32)> + '_ {
        self.0.iter().map(|(k, &c)| (k, c))
    }

    pub fn keywords(&self) -> impl Iterator<Item = &Keyword> + '_ {
        self.0.keys()
    }

    /// Keep the `n` most frequent keywords; ties go to the lexicographically smaller keyword.
    pub fn top(self, n: usize) -> Self {
        if self.0.len() <= n {
            return self;
        }
        let mut ranked: Vec<(Keyword, u32)> = self.0.into_iter().collect();
        ranked.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
        ranked.truncate(n);
        Self(ranked.into_iter().collect())
    }
}

impl FromIterator<(Keyword, u32)> for KeywordCounts {
    fn from_iter<T: IntoIterator<Item = (Keyword, u32)>>(iter: T) -> Self {
        let mut counts = BTreeMap::new();
        for (keyword, count) in iter {
            if count > 0 {
                *counts.entry(keyword).or_insert(0) += count;
            }
        }
        Self(counts)
    }
}

/// Normalizer with injected vocabularies so tests can control both tables.
#[derive(Debug, Clone)]
pub struct DocumentNormalizer {
    lemmas: Arc<LemmaDictionary>,
    stopwords: Arc<StopwordFilter>,
}

impl DocumentNormalizer {
    pub fn new(lemmas: Arc<LemmaDictionary>, stopwords: Arc<StopwordFilter>) -> Self {
        Self { lemmas, stopwords }
    }

    pub fn normalize(&self, raw_text: &str) -> KeywordCounts {
        let mut counts = KeywordCounts::new();
        for token in raw_text.split_whitespace() {
            if let Some(keyword) = self.normalize_token(token) {
                counts.add(keyword);
            }
        }
        counts
    }

    /// Normalize a search query into the distinct keywords it contains.
    pub fn query_keywords(&self, query: &str) -> Vec<Keyword> {
        self.normalize(query).keywords().cloned().collect()
    }

    fn normalize_token(&self, token: &str) -> Option<Keyword> {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        if token.len() <= 1 || !WORD_PATTERN.is_match(token) {
            return None;
        }
        if self.stopwords.is_stopword(token) {
            return None;
        }
        let keyword = Keyword::parse(token)?;
        match self.lemmas.lookup(keyword.as_str()) {
            Some(lemma) => Keyword::parse(lemma).or(Some(keyword)),
            None => Some(keyword),
        }
    }
}

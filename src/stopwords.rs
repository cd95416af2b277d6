//! Stopword membership set used by the normalizer.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// English function words plus the Wikipedia-specific additions.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "above", "according", "across", "actually", "after", "afterwords", "again",
    "against", "all", "almost", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "any", "anything", "anyway", "are", "as", "at", "be", "became", "become", "because",
    "been", "before", "being", "below", "between", "both", "but", "by", "can", "could", "did",
    "do", "does", "doing", "down", "during", "each", "either", "else", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "he'd", "he'll", "hence", "he's", "her",
    "here", "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd",
    "i'll", "i'm", "i've", "if", "in", "into", "is", "it", "it's", "its", "itself", "just",
    "let's", "may", "maybe", "me", "might", "mine", "more", "most", "must", "my", "myself",
    "neither", "nor", "not", "of", "oh", "on", "once", "only", "ok", "or", "other", "ought",
    "our", "ours", "ourselves", "out", "over", "own", "same", "she", "she'd", "she'll", "she's",
    "should", "so", "some", "such", "than", "that", "that's", "the", "their", "theirs", "them",
    "themselves", "then", "there", "there's", "these", "they", "they'd", "they'll", "they're",
    "they've", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was",
    "we", "we'd", "we'll", "we're", "we've", "were", "what", "what's", "when", "whenever",
    "when's", "where", "whereas", "wherever", "where's", "whether", "which", "while", "who",
    "whoever", "who's", "whose", "whom", "why", "why's", "will", "with", "within", "would",
    "yes", "yet", "you", "you'd", "you'll", "you're", "you've", "your", "yours", "yourself",
    "yourselves",
    // domain additions
    "wikipedia", "use",
];

lazy_static! {
    static ref DEFAULT_SET: HashSet<String> =
        DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect();
}

/// Case-insensitive stopword set. Entries are stored lowercased.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    words: HashSet<String>,
}

impl StopwordFilter {
    /// Filter with an explicit vocabulary and nothing else.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Add more stopwords, e.g. the crawled host's brand name.
    pub fn with_extra<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                self.words.insert(word);
            }
        }
        self
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self {
            words: DEFAULT_SET.clone(),
        }
    }
}

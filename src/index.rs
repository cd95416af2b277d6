//! TF-IDF corpus index over SQLite.
//!
//! Three tables: `urls` (one row per document), `keywords` (one row per
//! distinct keyword) and `url_keywords` (one row per document/keyword pair
//! with its term frequency, idf and tf-idf). Every document commit runs in a
//! single transaction, so a failure leaves the corpus exactly as it was.

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::DocumentRecord;
use crate::normalizer::Keyword;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS urls (
    url_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT NOT NULL UNIQUE,
    num_terms   INTEGER NOT NULL DEFAULT 0,
    description TEXT,
    title       TEXT
);
CREATE TABLE IF NOT EXISTS keywords (
    keyword_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword     TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS url_keywords (
    keyword_id     INTEGER NOT NULL REFERENCES keywords(keyword_id),
    url_id         INTEGER NOT NULL REFERENCES urls(url_id),
    term_frequency REAL NOT NULL,
    idf            REAL NOT NULL DEFAULT 0,
    tfidf          REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (keyword_id, url_id)
);
CREATE INDEX IF NOT EXISTS idx_url_keywords_url ON url_keywords(url_id);
"#;

/// `ln(1 + N / df)`; an unseen keyword is treated as `df = 1`.
pub fn idf_value(documents: u64, document_frequency: u64) -> f64 {
    let df = document_frequency.max(1) as f64;
    (1.0 + documents as f64 / df).ln()
}

/// One ranked result of [`CorpusIndex::search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: u64,
    pub keywords: u64,
    pub associations: u64,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Index: {} documents, {} keywords, {} associations",
            self.documents, self.keywords, self.associations
        )
    }
}

pub struct CorpusIndex {
    conn: Mutex<Connection>,
}

impl CorpusIndex {
    /// Open (or create) the index database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, IndexError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, IndexError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Commit one document and its keyword associations atomically.
    ///
    /// Re-adding a URL that is already present returns its existing id and
    /// changes nothing.
    pub fn add_document(&self, doc: &DocumentRecord) -> Result<i64, IndexError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row("SELECT url_id FROM urls WHERE url = ?1", [&doc.url], |r| r.get(0))
            .optional()?;
        if let Some(url_id) = existing {
            debug!(url = %doc.url, url_id, "Document already indexed");
            return Ok(url_id);
        }

        let total = doc.keywords.total();
        tx.execute(
            "INSERT INTO urls (url, num_terms, description, title) VALUES (?1, ?2, ?3, ?4)",
            params![doc.url, total as i64, doc.description, doc.title],
        )?;
        let url_id = tx.last_insert_rowid();

        {
            let mut ensure_keyword = tx.prepare_cached(
                "INSERT INTO keywords (keyword) VALUES (?1) ON CONFLICT(keyword) DO NOTHING",
            )?;
            let mut get_keyword_id =
                tx.prepare_cached("SELECT keyword_id FROM keywords WHERE keyword = ?1")?;
            let mut insert_assoc = tx.prepare_cached(
                "INSERT INTO url_keywords (keyword_id, url_id, term_frequency)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(keyword_id, url_id) DO NOTHING",
            )?;
            let mut document_frequency =
                tx.prepare_cached("SELECT COUNT(*) FROM url_keywords WHERE keyword_id = ?1")?;
            let mut set_weights = tx.prepare_cached(
                "UPDATE url_keywords SET idf = ?1, tfidf = term_frequency * ?1
                 WHERE keyword_id = ?2 AND url_id = ?3",
            )?;

            let documents: i64 = tx.query_row("SELECT COUNT(*) FROM urls", [], |r| r.get(0))?;

            for (keyword, count) in doc.keywords.iter() {
                ensure_keyword.execute([keyword.as_str()])?;
                let keyword_id: i64 = get_keyword_id.query_row([keyword.as_str()], |r| r.get(0))?;
                let tf = count as f64 / total as f64;
                insert_assoc.execute(params![keyword_id, url_id, tf])?;

                let df: i64 = document_frequency.query_row([keyword_id], |r| r.get(0))?;
                let idf = idf_value(documents as u64, df as u64);
                set_weights.execute(params![idf, keyword_id, url_id])?;
            }
        }

        tx.commit()?;
        debug!(url = %doc.url, url_id, keywords = doc.keywords.len(), "Indexed document");
        Ok(url_id)
    }

    pub fn document_count(&self) -> Result<u64, IndexError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM urls", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Number of distinct documents containing `keyword`.
    pub fn document_frequency(&self, keyword: &str) -> Result<u64, IndexError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM url_keywords uk
             JOIN keywords k ON k.keyword_id = uk.keyword_id
             WHERE k.keyword = ?1",
            [keyword],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn idf(&self, keyword: &str) -> Result<f64, IndexError> {
        let documents = self.document_count()?;
        let df = self.document_frequency(keyword)?;
        Ok(idf_value(documents, df))
    }

    pub fn term_frequency(&self, url: &str, keyword: &str) -> Result<Option<f64>, IndexError> {
        self.association_column(url, keyword, "term_frequency")
    }

    /// `term_frequency × idf` against the current corpus. `None` when the
    /// document does not contain the keyword.
    pub fn tfidf(&self, url: &str, keyword: &str) -> Result<Option<f64>, IndexError> {
        let Some(tf) = self.term_frequency(url, keyword)? else {
            return Ok(None);
        };
        Ok(Some(tf * self.idf(keyword)?))
    }

    /// The tf-idf value as last persisted (at commit or by a recompute pass).
    pub fn stored_tfidf(&self, url: &str, keyword: &str) -> Result<Option<f64>, IndexError> {
        self.association_column(url, keyword, "tfidf")
    }

    fn association_column(
        &self,
        url: &str,
        keyword: &str,
        column: &'static str,
    ) -> Result<Option<f64>, IndexError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT uk.{column} FROM url_keywords uk
             JOIN urls u ON u.url_id = uk.url_id
             JOIN keywords k ON k.keyword_id = uk.keyword_id
             WHERE u.url = ?1 AND k.keyword = ?2"
        );
        let value = conn
            .query_row(&sql, params![url, keyword], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    /// Refresh idf and tf-idf of every association against the current
    /// corpus. Safe to run any number of times. Returns the number of
    /// associations updated.
    pub fn recompute_all_tfidf(&self) -> Result<usize, IndexError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut updated = 0;
        {
            let documents: i64 = tx.query_row("SELECT COUNT(*) FROM urls", [], |r| r.get(0))?;
            let mut frequencies = tx.prepare(
                "SELECT keyword_id, COUNT(*) FROM url_keywords GROUP BY keyword_id",
            )?;
            let rows = frequencies
                .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut set_weights = tx.prepare_cached(
                "UPDATE url_keywords SET idf = ?1, tfidf = term_frequency * ?1 WHERE keyword_id = ?2",
            )?;
            for (keyword_id, df) in rows {
                let idf = idf_value(documents as u64, df as u64);
                updated += set_weights.execute(params![idf, keyword_id])?;
            }
        }
        tx.commit()?;
        info!(associations = updated, "Recomputed TF-IDF");
        Ok(updated)
    }

    /// Rank documents by the summed stored tf-idf of the query keywords.
    /// Ties are broken by URL ascending.
    pub fn search(&self, keywords: &[Keyword], limit: usize) -> Result<Vec<SearchHit>, IndexError> {
        if keywords.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; keywords.len()].join(", ");
        let sql = format!(
            "SELECT u.url, u.title, SUM(uk.tfidf) AS score
             FROM url_keywords uk
             JOIN urls u ON u.url_id = uk.url_id
             JOIN keywords k ON k.keyword_id = uk.keyword_id
             WHERE k.keyword IN ({placeholders})
             GROUP BY u.url_id
             ORDER BY score DESC, u.url ASC
             LIMIT {limit}"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let hits = stmt
            .query_map(params_from_iter(keywords.iter().map(Keyword::as_str)), |r| {
                Ok(SearchHit {
                    url: r.get(0)?,
                    title: r.get(1)?,
                    score: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    pub fn document_id(&self, url: &str) -> Result<Option<i64>, IndexError> {
        let conn = self.conn.lock();
        let id = conn
            .query_row("SELECT url_id FROM urls WHERE url = ?1", [url], |r| r.get(0))
            .optional()?;
        Ok(id)
    }

    pub fn keyword_id(&self, keyword: &str) -> Result<Option<i64>, IndexError> {
        let conn = self.conn.lock();
        let id = conn
            .query_row("SELECT keyword_id FROM keywords WHERE keyword = ?1", [keyword], |r| r.get(0))
            .optional()?;
        Ok(id)
    }

    pub fn stats(&self) -> Result<IndexStats, IndexError> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<u64, rusqlite::Error> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok(n as u64)
        };
        Ok(IndexStats {
            documents: count("urls")?,
            keywords: count("keywords")?,
            associations: count("url_keywords")?,
        })
    }
}

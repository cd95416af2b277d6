use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Site, VisitOutcome};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt journal entry: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Redb(#[from] redb::Error),

    #[error("Database creation error: {0}")]
    RedbCreate(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),
}

/// Everything needed to rebuild a frontier after a restart.
#[derive(Debug, Default)]
pub struct JournalSnapshot {
    /// Admitted entries in admission order.
    pub queued: Vec<Site>,
    pub visited: HashMap<String, VisitOutcome>,
}

/// Durable form of the frontier: an append-only, sequence-numbered log of
/// admitted `(priority, url)` entries plus the outcome of every visited URL.
pub struct FrontierJournal {
    db: Arc<Database>,
}

impl FrontierJournal {
    const QUEUE_LOG: TableDefinition<'static, u64, &'static str> = TableDefinition::new("queue_log");
    const VISITED: TableDefinition<'static, &'static str, &'static str> = TableDefinition::new("visited");

    /// Open (or create) the journal file inside `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P, file_name: &str) -> Result<Self, StateError> {
        let data_path = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let db = Database::create(data_path.join(file_name))?;

        // Open each table so readers never see a missing table.
        let write_txn = db.begin_write()?;
        {
            let _log = write_txn.open_table(Self::QUEUE_LOG)?;
            let _visited = write_txn.open_table(Self::VISITED)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Append an admitted entry; returns its sequence number.
    pub fn append_queued(&self, site: &Site) -> Result<u64, StateError> {
        self.append_queued_batch(std::slice::from_ref(site))
            .map(|seqnos| seqnos.start)
    }

    /// Append entries in order under one write transaction; returns the
    /// sequence numbers assigned. An empty batch writes nothing.
    pub fn append_queued_batch(&self, sites: &[Site]) -> Result<Range<u64>, StateError> {
        if sites.is_empty() {
            return Ok(0..0);
        }
        let encoded = sites
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let write_txn = self.db.begin_write()?;
        let seqnos = {
            let mut table = write_txn.open_table(Self::QUEUE_LOG)?;
            let first = table.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);
            for (seqno, entry) in (first..).zip(encoded.iter()) {
                table.insert(seqno, entry.as_str())?;
            }
            first..first + encoded.len() as u64
        };
        write_txn.commit()?;
        Ok(seqnos)
    }

    /// Record (or overwrite) the outcome for a visited URL.
    pub fn record_visit(&self, url: &str, outcome: VisitOutcome) -> Result<(), StateError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(Self::VISITED)?;
            table.insert(url, outcome.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn visit_outcome(&self, url: &str) -> Result<Option<VisitOutcome>, StateError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::VISITED)?;
        let outcome = match table.get(url)? {
            Some(value) => Some(value.value().parse().map_err(StateError::Corrupt)?),
            None => None,
        };
        Ok(outcome)
    }

    pub fn queued_len(&self) -> Result<u64, StateError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::QUEUE_LOG)?;
        Ok(table.len()?)
    }

    pub fn visited_len(&self) -> Result<u64, StateError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::VISITED)?;
        Ok(table.len()?)
    }

    /// Read the whole journal in one read transaction.
    pub fn load(&self) -> Result<JournalSnapshot, StateError> {
        let read_txn = self.db.begin_read()?;
        let mut snapshot = JournalSnapshot::default();

        let log = read_txn.open_table(Self::QUEUE_LOG)?;
        for result in log.iter()? {
            let (_seqno, value) = result?;
            snapshot.queued.push(serde_json::from_str(value.value())?);
        }

        let visited = read_txn.open_table(Self::VISITED)?;
        for result in visited.iter()? {
            let (key, value) = result?;
            let outcome = value.value().parse().map_err(StateError::Corrupt)?;
            snapshot.visited.insert(key.value().to_string(), outcome);
        }

        Ok(snapshot)
    }
}

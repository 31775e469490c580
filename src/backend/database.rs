use std::path::Path;

use eyre::Result;
use uuid::Uuid;

use super::types::*;

/// Key of the persisted [HeadInfo] watermark.
const HEAD_INFO_KEY: &str = "HEAD_INFO";

/// The persistent entry store. Batches, transactions, and the queue-index
/// reverse lookup each live in their own sled tree, keyed by big-endian
/// index so iteration order matches index order.
#[derive(Debug, Clone)]
pub struct Database {
    /// Internal [sled] db
    db: sled::Db,
    /// Batch entries by batch index
    batches: sled::Tree,
    /// Transaction entries by global index
    transactions: sled::Tree,
    /// Reverse lookup from queue index to global transaction index,
    /// recorded for every provisional entry so the queue-resolution
    /// pipeline can later patch the placeholder fields
    queue_indexes: sled::Tree,
}

impl Default for Database {
    fn default() -> Self {
        Self::new(Self::fallback_location())
    }
}

impl Database {
    /// Creates a new database at the given location.
    ///
    /// ## Panics
    ///
    /// This function will panic if neither the given file location
    /// nor a temporary location can be used to construct a database.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let db = Self::try_construct_db(path);
        let batches = db.open_tree("batches").unwrap();
        let transactions = db.open_tree("transactions").unwrap();
        let queue_indexes = db.open_tree("queue_indexes").unwrap();

        Self {
            db,
            batches,
            transactions,
            queue_indexes,
        }
    }

    /// Gets a random location to use as a fallback
    pub fn fallback_location() -> String {
        format!("/tmp/melchior/{}", Uuid::new_v4())
    }

    /// Attempts to construct a database for a given location.
    fn try_construct_db<P: AsRef<Path>>(path: P) -> sled::Db {
        match sled::open(path) {
            Ok(db) => db,
            Err(e) => {
                tracing::error!("Failed to open database: {}", e);
                let new_loc = Self::fallback_location();
                tracing::debug!("Optimistically creating new database at {}", new_loc);
                sled::open(new_loc).unwrap()
            }
        }
    }

    /// Writes a list of batch entries.
    pub fn put_batch_entries(&self, entries: &[TransactionBatchEntry]) -> Result<()> {
        for entry in entries {
            self.batches
                .insert(&entry.index.to_be_bytes(), serde_json::to_vec(entry)?)?;
        }
        Ok(())
    }

    /// Writes a list of transaction entries.
    pub fn put_transaction_entries(&self, entries: &[TransactionEntry]) -> Result<()> {
        for entry in entries {
            self.transactions
                .insert(&entry.index.to_be_bytes(), serde_json::to_vec(entry)?)?;
        }
        Ok(())
    }

    /// Records the global transaction index assigned to a queue index.
    pub fn put_transaction_index_by_queue_index(&self, queue_index: u64, index: u64) -> Result<()> {
        self.queue_indexes
            .insert(&queue_index.to_be_bytes(), &index.to_be_bytes())?;
        Ok(())
    }

    /// Reads a batch entry by its batch index.
    pub fn batch_by_index(&self, index: u64) -> Result<Option<TransactionBatchEntry>> {
        read_json(self.batches.get(index.to_be_bytes())?)
    }

    /// Reads a transaction entry by its global index.
    pub fn transaction_by_index(&self, index: u64) -> Result<Option<TransactionEntry>> {
        read_json(self.transactions.get(index.to_be_bytes())?)
    }

    /// Reads the global transaction index assigned to a queue index.
    pub fn transaction_index_by_queue_index(&self, queue_index: u64) -> Result<Option<u64>> {
        self.queue_indexes
            .get(queue_index.to_be_bytes())?
            .map(read_index)
            .transpose()
    }

    /// Returns the index of the most recently written batch entry.
    pub fn latest_batch_index(&self) -> Result<Option<u64>> {
        self.batches
            .last()?
            .map(|(key, _)| read_index(key))
            .transpose()
    }

    /// Returns the index of the most recently written transaction entry.
    pub fn latest_transaction_index(&self) -> Result<Option<u64>> {
        self.transactions
            .last()?
            .map(|(key, _)| read_index(key))
            .transpose()
    }

    /// Persists the scanning watermark with the key `HEAD_INFO`.
    pub fn write_head(&self, head: HeadInfo) -> Result<()> {
        self.db.insert(HEAD_INFO_KEY, serde_json::to_vec(&head)?)?;
        Ok(())
    }

    /// Reads the most recent [HeadInfo], if one was persisted.
    pub fn read_head(&self) -> Result<Option<HeadInfo>> {
        read_json(self.db.get(HEAD_INFO_KEY)?)
    }

    /// Flushes the database to disk asynchronously.
    ///
    /// Internally, this function uses [`sled::Db::flush_async`] which
    /// asynchronously flushes all dirty IO buffers and calls fsync.
    /// If this succeeds, it is guaranteed that all previous writes will
    /// be recovered if the system crashes.
    /// Returns the number of bytes flushed during this call.
    pub async fn flush_async(&self) -> Result<usize> {
        self.db.flush_async().await.map_err(|e| eyre::eyre!(e))
    }

    /// Clear wipes all trees of the database.
    ///
    /// ## Warning
    ///
    /// Be careful when using this function, as it will delete all data.
    pub fn clear(&self) -> Result<()> {
        self.batches.clear()?;
        self.transactions.clear()?;
        self.queue_indexes.clear()?;
        self.db.clear()?;
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(value: Option<sled::IVec>) -> Result<Option<T>> {
    value
        .map(|bytes| serde_json::from_slice(&bytes).map_err(eyre::Report::from))
        .transpose()
}

fn read_index(bytes: sled::IVec) -> Result<u64> {
    Ok(u64::from_be_bytes(
        bytes
            .as_ref()
            .try_into()
            .map_err(|_| eyre::eyre!("malformed index key"))?,
    ))
}

//! Saved-document storage.
//!
//! The whole document list is persisted as one JSON array under a single key,
//! the same shape a browser key-value store would hold. Two backends:
//!
//! - `MemoryStore`: holds the raw JSON in memory (tests, the demo binary).
//! - `RedbStore`: persistent, ACID-backed storage using `redb`, one table with
//!   one row per store key.
//!
//! A store whose JSON cannot be parsed is treated as empty: the error is
//! logged and the next save overwrites it. Storage failures themselves are
//! returned to the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default key the document list is stored under.
pub const STORE_KEY: &str = "khmer-typewriter-docs";

/// One saved document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDocument {
    pub id: String,
    pub title: String,
    /// Persisted fragment (placeholders always collapsed)
    pub content: String,
    /// Last save, milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable list of saved documents.
pub trait DocumentStore {
    /// Every saved document, newest first as last written.
    fn load_all(&self) -> Result<Vec<SavedDocument>, StoreError>;

    /// Replace the stored list.
    fn save_all(&mut self, documents: &[SavedDocument]) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn load_all(&self) -> Result<Vec<SavedDocument>, StoreError> {
        (**self).load_all()
    }

    fn save_all(&mut self, documents: &[SavedDocument]) -> Result<(), StoreError> {
        (**self).save_all(documents)
    }
}

/// Parse a stored list, discarding it if it is malformed.
pub fn decode_documents(raw: &str) -> Vec<SavedDocument> {
    match serde_json::from_str(raw) {
        Ok(docs) => docs,
        Err(err) => {
            warn!(%err, "discarding malformed document store");
            Vec::new()
        }
    }
}

/// In-memory store holding the raw JSON.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw value (possibly malformed).
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Some(raw.into()) }
    }

    /// The stored JSON, if anything was ever written.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl DocumentStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<SavedDocument>, StoreError> {
        Ok(self.raw.as_deref().map(decode_documents).unwrap_or_default())
    }

    fn save_all(&mut self, documents: &[SavedDocument]) -> Result<(), StoreError> {
        self.raw = Some(serde_json::to_string(documents)?);
        Ok(())
    }
}

/// Persistent store backed by a redb database file.
pub struct RedbStore {
    db: redb::Database,
    key: String,
    path: PathBuf,
}

impl RedbStore {
    /// Table definition: store key -> JSON document list.
    const TABLE_DEF: redb::TableDefinition<'static, &'static str, &'static str> =
        redb::TableDefinition::new("documents");

    /// Create or open a database at `path`, using the default store key.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with_key(path, STORE_KEY)
    }

    /// Create or open a database at `path`, storing the list under `key`.
    pub fn open_with_key<P: AsRef<Path>>(path: P, key: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path.as_ref()).map_err(redb::Error::from)?;
        debug!(path = %path.as_ref().display(), key, "opened document store");
        Ok(Self {
            db,
            key: key.to_string(),
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw JSON under the store key, if present.
    pub fn read_raw(&self) -> Result<Option<String>, redb::Error> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(Self::TABLE_DEF) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(table.get(self.key.as_str())?.map(|v| v.value().to_string()))
    }

    /// Overwrite the raw JSON under the store key.
    pub fn write_raw(&self, raw: &str) -> Result<(), redb::Error> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(Self::TABLE_DEF)?;
            table.insert(self.key.as_str(), raw)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl DocumentStore for RedbStore {
    fn load_all(&self) -> Result<Vec<SavedDocument>, StoreError> {
        Ok(self.read_raw()?.as_deref().map(decode_documents).unwrap_or_default())
    }

    fn save_all(&mut self, documents: &[SavedDocument]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(documents)?;
        self.write_raw(&raw)?;
        debug!(count = documents.len(), "saved document list");
        Ok(())
    }
}

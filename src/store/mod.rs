//! Durable storage port for engine state.
//!
//! The learner only ever reads and writes one JSON document under a fixed
//! key; backends just move that document to and from somewhere durable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod file;
pub mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

/// Well-known key of the persisted learner state document.
pub const LEARNER_STATE_KEY: &str = "learner-state";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state store database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("state document could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("state store lock poisoned")]
    Lock,
}

/// Keyed document storage. Implementations perform blocking I/O.
pub trait StateStore: Send + Sync {
    /// Fetch the raw document stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the document stored under `key`.
    fn write(&self, key: &str, document: &str) -> Result<(), StoreError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, document: &str) -> Result<(), StoreError> {
        (**self).write(key, document)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, document: &str) -> Result<(), StoreError> {
        (**self).write(key, document)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let docs = self.documents.lock().map_err(|_| StoreError::Lock)?;
        Ok(docs.get(key).cloned())
    }

    fn write(&self, key: &str, document: &str) -> Result<(), StoreError> {
        let mut docs = self.documents.lock().map_err(|_| StoreError::Lock)?;
        docs.insert(key.to_string(), document.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Which backend the binary should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// One JSON file per key inside a directory
    File,
    /// Key/document table in a SQLite database file
    Sqlite,
    /// Nothing survives the process
    Memory,
}

/// Open the configured backend at `path`. For sqlite, a path without an
/// extension is treated as a directory holding `engine.db`.
pub fn open_store(backend: Backend, path: &Path) -> Result<Box<dyn StateStore>, StoreError> {
    let store: Box<dyn StateStore> = match backend {
        Backend::File => Box::new(FileStore::new(path)),
        Backend::Sqlite => {
            let db_path = if path.extension().is_some() {
                path.to_path_buf()
            } else {
                std::fs::create_dir_all(path)?;
                path.join("engine.db")
            };
            Box::new(SqliteStore::open(db_path)?)
        }
        Backend::Memory => Box::new(MemoryStore::new()),
    };
    Ok(store)
}

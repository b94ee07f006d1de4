//! Key-value blob storage contracts and implementations.
//!
//! # Responsibility
//! - Define the minimal get/set/remove contract the store persists through.
//! - Keep SQLite details behind the storage boundary.
//!
//! # Invariants
//! - Values are opaque UTF-8 blobs; storage never interprets them.
//! - A missing key is `Ok(None)`, not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBlobStorage;
pub use sqlite::SqliteBlobStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a blob storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// Database transport or schema failure.
    Db(DbError),
    /// Write rejected because it would exceed the backend quota.
    QuotaExceeded { limit_bytes: usize, required_bytes: usize },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                limit_bytes,
                required_bytes,
            } => write!(
                f,
                "storage quota exceeded: {required_bytes} bytes required, limit is {limit_bytes}"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String blob store addressed by key, modeled after browser local storage.
pub trait BlobStorage {
    /// Reads the value under `key`, `None` when absent.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    /// Inserts or replaces the value under `key`.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Removes `key`; removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

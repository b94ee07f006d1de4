//! SQLite-backed blob storage.
//!
//! # Responsibility
//! - Persist key/value blobs in the migrated `kv_store` table.
//!
//! # Invariants
//! - Construction fails fast when the connection was not migrated.
//! - `set_item` is a single upsert statement; readers never see a torn value.

use crate::db::{open_db, open_db_in_memory, require_table};
use crate::storage::{BlobStorage, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const KV_TABLE: &str = "kv_store";

/// Blob storage over one owned SQLite connection.
pub struct SqliteBlobStorage {
    conn: Connection,
}

impl SqliteBlobStorage {
    /// Wraps an already migrated connection.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        require_table(&conn, KV_TABLE)?;
        Ok(Self { conn })
    }

    /// Opens (creating if needed) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Non-durable variant, mainly for tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }
}

impl BlobStorage for SqliteBlobStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

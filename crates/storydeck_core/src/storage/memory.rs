//! In-process blob storage.
//!
//! Used where no durable backend exists (headless hosts, tests). Clones
//! share the same underlying map, so a caller can keep a handle to inspect
//! what the store wrote.

use crate::storage::{BlobStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, String>,
    quota_bytes: Option<usize>,
    writes: usize,
}

/// Shared in-memory key/value map with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes whose total stored size (keys + values) would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        let storage = Self::default();
        storage.lock().quota_bytes = Some(quota_bytes);
        storage
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still structurally valid; keep serving it.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStorage for MemoryBlobStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.lock();
        if let Some(limit_bytes) = inner.quota_bytes {
            let others = inner
                .items
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>();
            let required_bytes = others + key.len() + value.len();
            if required_bytes > limit_bytes {
                return Err(StorageError::QuotaExceeded {
                    limit_bytes,
                    required_bytes,
                });
            }
        }
        inner.items.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.lock().items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryBlobStorage;
    use crate::storage::{BlobStorage, StorageError};

    #[test]
    fn clones_share_items_and_write_count() {
        let storage = MemoryBlobStorage::new();
        let observer = storage.clone();
        storage.set_item("a", "1").unwrap();
        assert_eq!(observer.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(observer.write_count(), 1);
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_previous_value() {
        let storage = MemoryBlobStorage::with_quota(8);
        storage.set_item("k", "small").unwrap();
        let err = storage.set_item("k", "much too large").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit_bytes: 8, .. }));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("small"));
        assert_eq!(storage.write_count(), 1);
    }
}

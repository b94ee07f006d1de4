//! Snapshot load/save over blob storage.
//!
//! # Responsibility
//! - Encode/decode `AppState` as one JSON blob under a fixed key.
//! - Classify failures so the store can log them and fall back.
//!
//! # Invariants
//! - A decoded snapshot is only returned after `AppState::validate()` passes.
//! - The blob is written whole; there are no partial or incremental writes.

use crate::model::state::{AppState, StateValidationError};
use crate::storage::{BlobStorage, StorageError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key the snapshot is stored under.
pub const STORAGE_KEY: &str = "behavioral-interview-prep";

/// Why a snapshot could not be loaded or saved.
#[derive(Debug)]
pub enum SnapshotError {
    Storage(StorageError),
    Decode(serde_json::Error),
    Encode(serde_json::Error),
    Invalid(StateValidationError),
}

impl SnapshotError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(StorageError::QuotaExceeded { .. }) => "quota_exceeded",
            Self::Storage(_) => "storage_failed",
            Self::Decode(_) => "decode_failed",
            Self::Encode(_) => "encode_failed",
            Self::Invalid(_) => "invalid_snapshot",
        }
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "snapshot is not valid JSON state: {err}"),
            Self::Encode(err) => write!(f, "snapshot could not be encoded: {err}"),
            Self::Invalid(err) => write!(f, "snapshot violates invariants: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<StorageError> for SnapshotError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<StateValidationError> for SnapshotError {
    fn from(value: StateValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Reads and decodes the snapshot under `key`.
///
/// Returns `Ok(None)` when nothing has been stored yet.
pub fn load_snapshot<S: BlobStorage + ?Sized>(
    storage: &S,
    key: &str,
) -> Result<Option<AppState>, SnapshotError> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };
    let state = decode_snapshot(&raw)?;
    Ok(Some(state))
}

/// Encodes `state` and writes it under `key`.
pub fn save_snapshot<S: BlobStorage + ?Sized>(
    storage: &S,
    key: &str,
    state: &AppState,
) -> Result<usize, SnapshotError> {
    let raw = encode_snapshot(state)?;
    storage.set_item(key, &raw)?;
    Ok(raw.len())
}

/// Decodes and validates one serialized snapshot.
pub fn decode_snapshot(raw: &str) -> Result<AppState, SnapshotError> {
    let state: AppState = serde_json::from_str(raw).map_err(SnapshotError::Decode)?;
    state.validate()?;
    Ok(state)
}

/// Serializes a snapshot to its wire JSON.
pub fn encode_snapshot(state: &AppState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(SnapshotError::Encode)
}

#[cfg(test)]
mod tests {
    use super::{decode_snapshot, encode_snapshot, load_snapshot, save_snapshot, SnapshotError};
    use crate::model::state::AppState;
    use crate::storage::MemoryBlobStorage;

    #[test]
    fn load_returns_none_for_missing_key() {
        let storage = MemoryBlobStorage::new();
        assert!(load_snapshot(&storage, "missing").unwrap().is_none());
    }

    #[test]
    fn save_then_load_returns_equal_state() {
        let storage = MemoryBlobStorage::new();
        let state = AppState::default();
        save_snapshot(&storage, "k", &state).unwrap();
        assert_eq!(load_snapshot(&storage, "k").unwrap(), Some(state));
    }

    #[test]
    fn decode_rejects_non_json_and_wrong_shape() {
        let err = decode_snapshot("not json").unwrap_err();
        assert_eq!(err.code(), "decode_failed");

        let err = decode_snapshot(r#"{"competencies": 3}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let mut state = AppState::default();
        let first = state.competencies[0].clone();
        state.competencies.push(first);
        let raw = encode_snapshot(&state).unwrap();
        let err = decode_snapshot(&raw).unwrap_err();
        assert_eq!(err.code(), "invalid_snapshot");
    }
}

//! Core state and persistence for storydeck, a behavioral interview story
//! organizer. This crate is the single source of truth for competencies,
//! cards and settings.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::card::{Card, CardContent, CardFormat, CardId, StoryField};
pub use model::competency::{default_competencies, Competency, CompetencyId};
pub use model::state::{AppState, Settings, StateValidationError};
pub use service::persistence::{SnapshotError, STORAGE_KEY};
pub use service::store::{Clock, Store, StoreOptions, SubscriptionId, SystemClock};
pub use storage::{
    BlobStorage, MemoryBlobStorage, SqliteBlobStorage, StorageError, StorageResult,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

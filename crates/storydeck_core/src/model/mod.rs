//! Domain model for competencies, cards and settings.
//!
//! # Responsibility
//! - Define the serializable snapshot shape shared by store and storage.
//! - Keep wire names stable (`createdAt`, `autoSave`, `STAR`/`CURL`).
//!
//! # Invariants
//! - `AppState` is the single persisted unit; nothing else is written.

pub mod card;
pub mod competency;
pub mod state;

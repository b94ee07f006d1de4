//! Core use-case services.
//!
//! # Responsibility
//! - Own the application state store and its mutation operations.
//! - Define the snapshot persistence contract over blob storage.
//! - Keep host/UI layers decoupled from storage details.

pub mod persistence;
pub mod store;

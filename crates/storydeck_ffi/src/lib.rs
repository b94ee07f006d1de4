//! Host UI bindings for storydeck core.

pub mod api;

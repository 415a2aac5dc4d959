//! Chanting tracker — per-day chant counts and free-form notes.

pub mod api;
pub mod store;
pub mod types;

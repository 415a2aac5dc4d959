//! Spiritual journal — dated entries with reflections, and daily mood log.

pub mod api;
pub mod store;
pub mod types;

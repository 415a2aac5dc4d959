//! Mantra catalog.
//!
//! Immutable reference data, seeded at startup when the collection is empty
//! and listed in creation order.

pub mod api;
pub mod store;

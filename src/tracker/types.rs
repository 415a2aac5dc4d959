//! Chanting record and note entity shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chanting record per (user, mantra, calendar day).
///
/// `chant_count` is the absolute count for that day, not a delta. Upserts
/// preserve `created_at` from the original insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChantingRecord {
    pub id: String,
    pub user_id: String,
    pub mantra_id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub chant_date: String,
    pub chant_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A free-form annotation tied to (user, mantra, day).
///
/// Not 1:1 with `ChantingRecord` — any number of notes may exist per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChantingNote {
    pub id: String,
    pub user_id: String,
    pub mantra_id: String,
    pub chant_date: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! Chanting record and note stores.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::types::{ChantingNote, ChantingRecord};
use crate::persist;

const RECORDS_COLLECTION: &str = "chanting_records";
const NOTES_COLLECTION: &str = "chanting_notes";

fn record_key(user_id: &str, mantra_id: &str, chant_date: &str) -> String {
    format!("{user_id}|{mantra_id}|{chant_date}")
}

// ── Chanting Records ─────────────────────────────────────────────────────────

/// Store for chanting records, keyed by the (user, mantra, day) natural key.
#[derive(Clone)]
pub struct ChantingRecordStore {
    by_key: Arc<DashMap<String, ChantingRecord>>,
    data_dir: Option<PathBuf>,
}

impl ChantingRecordStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_key: Arc<DashMap<String, ChantingRecord>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (key, record) in persist::load_collection::<ChantingRecord>(dir, RECORDS_COLLECTION)
            {
                by_key.insert(key, record);
            }
        }
        Self { by_key, data_dir }
    }

    /// Insert or update the record for (user, mantra, day).
    ///
    /// `created_at` is preserved from the original insert; `updated_at`
    /// always tracks the latest write.
    pub fn upsert(
        &self,
        user_id: &str,
        mantra_id: &str,
        chant_date: &str,
        chant_count: u64,
        now: DateTime<Utc>,
    ) -> ChantingRecord {
        let key = record_key(user_id, mantra_id, chant_date);
        let mut entry = self.by_key.entry(key).or_insert_with(|| ChantingRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            mantra_id: mantra_id.to_string(),
            chant_date: chant_date.to_string(),
            chant_count,
            created_at: now,
            updated_at: now,
        });
        entry.chant_count = chant_count;
        entry.updated_at = now;
        let record = entry.clone();
        drop(entry);

        self.persist();
        record
    }

    /// Records for one user, optionally restricted to an exact day or a
    /// from-day lower bound.
    pub fn list(
        &self,
        user_id: &str,
        chant_date: Option<&str>,
        from_date: Option<&str>,
    ) -> Vec<ChantingRecord> {
        self.by_key
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| chant_date.map_or(true, |d| e.chant_date == d))
            .filter(|e| from_date.map_or(true, |d| e.chant_date.as_str() >= d))
            .map(|e| e.value().clone())
            .collect()
    }

    /// Records for one user within an inclusive day range.
    pub fn in_range(&self, user_id: &str, from: &str, to: &str) -> Vec<ChantingRecord> {
        self.by_key
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.chant_date.as_str() >= from
                    && e.chant_date.as_str() <= to
            })
            .map(|e| e.value().clone())
            .collect()
    }

    /// Summed chant count per day for one user, across all mantras.
    pub fn daily_totals(&self, user_id: &str) -> HashMap<String, u64> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for entry in self.by_key.iter().filter(|e| e.user_id == user_id) {
            *totals.entry(entry.chant_date.clone()).or_default() += entry.chant_count;
        }
        totals
    }

    /// Whether the user has any record with a nonzero count on the given day.
    pub fn has_activity_on(&self, user_id: &str, chant_date: &str) -> bool {
        self.by_key
            .iter()
            .any(|e| e.user_id == user_id && e.chant_date == chant_date && e.chant_count > 0)
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_key
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, RECORDS_COLLECTION, &entries);
        }
    }
}

// ── Chanting Notes ───────────────────────────────────────────────────────────

/// Store for chanting notes, keyed by note id.
#[derive(Clone)]
pub struct ChantingNoteStore {
    by_id: Arc<DashMap<String, ChantingNote>>,
    data_dir: Option<PathBuf>,
}

impl ChantingNoteStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_id: Arc<DashMap<String, ChantingNote>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (id, note) in persist::load_collection::<ChantingNote>(dir, NOTES_COLLECTION) {
                by_id.insert(id, note);
            }
        }
        Self { by_id, data_dir }
    }

    pub fn create(
        &self,
        user_id: &str,
        mantra_id: &str,
        chant_date: &str,
        note: &str,
        now: DateTime<Utc>,
    ) -> ChantingNote {
        let note = ChantingNote {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            mantra_id: mantra_id.to_string(),
            chant_date: chant_date.to_string(),
            note: note.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.by_id.insert(note.id.clone(), note.clone());
        self.persist();
        note
    }

    /// Notes for one user, newest first, with optional mantra/day filters.
    pub fn list(
        &self,
        user_id: &str,
        mantra_id: Option<&str>,
        chant_date: Option<&str>,
    ) -> Vec<ChantingNote> {
        let mut notes: Vec<ChantingNote> = self
            .by_id
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| mantra_id.map_or(true, |m| e.mantra_id == m))
            .filter(|e| chant_date.map_or(true, |d| e.chant_date == d))
            .map(|e| e.value().clone())
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_id
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, NOTES_COLLECTION, &entries);
        }
    }
}

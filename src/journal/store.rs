//! Journal and mood stores.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::types::{JournalEntry, Mood, MoodEntry, ReflectionPrompt};
use crate::error::ApiError;
use crate::persist;

const JOURNAL_COLLECTION: &str = "journal_entries";
const MOOD_COLLECTION: &str = "mood_entries";

/// Partial update applied to an existing journal entry.
#[derive(Debug, Default)]
pub struct JournalPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub reflection_prompts: Option<Vec<ReflectionPrompt>>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

// ── Journal Entries ──────────────────────────────────────────────────────────

/// Store for journal entries, keyed by entry id.
#[derive(Clone)]
pub struct JournalStore {
    by_id: Arc<DashMap<String, JournalEntry>>,
    data_dir: Option<PathBuf>,
}

impl JournalStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_id: Arc<DashMap<String, JournalEntry>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (id, entry) in persist::load_collection::<JournalEntry>(dir, JOURNAL_COLLECTION) {
                by_id.insert(id, entry);
            }
        }
        Self { by_id, data_dir }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        user_id: &str,
        date: &str,
        title: &str,
        content: &str,
        reflection_prompts: Vec<ReflectionPrompt>,
        tags: Vec<String>,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> JournalEntry {
        let entry = JournalEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            date: date.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            reflection_prompts,
            tags,
            is_private,
            created_at: now,
            updated_at: now,
        };
        self.by_id.insert(entry.id.clone(), entry.clone());
        self.persist();
        entry
    }

    /// Apply a partial update. Unknown ids are an error, never an upsert.
    pub fn update(
        &self,
        id: &str,
        patch: JournalPatch,
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, ApiError> {
        let mut entry = self
            .by_id
            .get_mut(id)
            .ok_or(ApiError::NotFound("Journal entry"))?;

        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(content) = patch.content {
            entry.content = content;
        }
        if let Some(prompts) = patch.reflection_prompts {
            entry.reflection_prompts = prompts;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        if let Some(is_private) = patch.is_private {
            entry.is_private = is_private;
        }
        entry.updated_at = now;
        let updated = entry.clone();
        drop(entry);

        self.persist();
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        match self.by_id.remove(id) {
            Some(_) => {
                self.persist();
                Ok(())
            }
            None => Err(ApiError::NotFound("Journal entry")),
        }
    }

    /// Entries for one user, newest first, with optional day filters.
    pub fn list(
        &self,
        user_id: &str,
        date: Option<&str>,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Vec<JournalEntry> {
        let mut entries: Vec<JournalEntry> = self
            .by_id
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| date.map_or(true, |d| e.date == d))
            .filter(|e| from_date.map_or(true, |d| e.date.as_str() >= d))
            .filter(|e| to_date.map_or(true, |d| e.date.as_str() <= d))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| (b.date.as_str(), b.created_at).cmp(&(a.date.as_str(), a.created_at)));
        entries
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_id
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, JOURNAL_COLLECTION, &entries);
        }
    }
}

// ── Mood Entries ─────────────────────────────────────────────────────────────

fn mood_key(user_id: &str, date: &str) -> String {
    format!("{user_id}|{date}")
}

/// Store for mood entries, keyed by the (user, day) natural key.
#[derive(Clone)]
pub struct MoodStore {
    by_key: Arc<DashMap<String, MoodEntry>>,
    data_dir: Option<PathBuf>,
}

impl MoodStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_key: Arc<DashMap<String, MoodEntry>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (key, entry) in persist::load_collection::<MoodEntry>(dir, MOOD_COLLECTION) {
                by_key.insert(key, entry);
            }
        }
        Self { by_key, data_dir }
    }

    /// Insert or update the mood for (user, day), preserving `created_at`.
    pub fn upsert(
        &self,
        user_id: &str,
        date: &str,
        mood: Mood,
        intensity: u8,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> MoodEntry {
        let key = mood_key(user_id, date);
        let mut entry = self.by_key.entry(key).or_insert_with(|| MoodEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            date: date.to_string(),
            mood,
            intensity,
            note: None,
            created_at: now,
            updated_at: now,
        });
        entry.mood = mood;
        entry.intensity = intensity;
        entry.note = note;
        entry.updated_at = now;
        let result = entry.clone();
        drop(entry);

        self.persist();
        result
    }

    /// Entries for one user, newest first, with optional day filters.
    pub fn list(
        &self,
        user_id: &str,
        date: Option<&str>,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Vec<MoodEntry> {
        let mut entries: Vec<MoodEntry> = self
            .by_key
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| date.map_or(true, |d| e.date == d))
            .filter(|e| from_date.map_or(true, |d| e.date.as_str() >= d))
            .filter(|e| to_date.map_or(true, |d| e.date.as_str() <= d))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| (b.date.as_str(), b.created_at).cmp(&(a.date.as_str(), a.created_at)));
        entries
    }

    pub fn delete_by_id(&self, id: &str) -> Result<(), ApiError> {
        let key = self
            .by_key
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.key().clone());
        match key {
            Some(k) => {
                self.by_key.remove(&k);
                self.persist();
                Ok(())
            }
            None => Err(ApiError::NotFound("Mood entry")),
        }
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_key
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, MOOD_COLLECTION, &entries);
        }
    }
}

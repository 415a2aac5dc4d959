//! Journal and mood entity shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A (question, answer) reflection pair attached to a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionPrompt {
    pub question: String,
    pub answer: String,
}

/// A user-owned journal entry, addressed by its opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub title: String,
    pub content: String,
    pub reflection_prompts: Vec<ReflectionPrompt>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The closed set of moods a day can be logged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Peaceful,
    Joyful,
    Contemplative,
    Challenged,
    Inspired,
    Tired,
    Grateful,
    Other,
}

/// One mood entry per (user, day), upserted like a chanting record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub mood: Mood,
    /// Scale of 1 to 5.
    pub intensity: u8,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! Journal and mood API handlers.
//!
//! - `GET/POST/PUT/DELETE /api/journal-entries` — id-addressed CRUD
//! - `GET/POST/DELETE /api/mood-entries`        — (user, day) upsert

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::store::JournalPatch;
use super::types::{JournalEntry, Mood, MoodEntry, ReflectionPrompt};
use crate::dates;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EntryListQuery {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJournalRequest {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub reflection_prompts: Option<Vec<ReflectionPrompt>>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJournalRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub reflection_prompts: Option<Vec<ReflectionPrompt>>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertMoodRequest {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub mood: Option<Mood>,
    pub intensity: Option<u8>,
    pub note: Option<String>,
}

fn day_filters(
    query: &EntryListQuery,
) -> ApiResult<(Option<String>, Option<String>, Option<String>)> {
    Ok((
        query.date.as_deref().map(dates::normalize_day).transpose()?,
        query
            .from_date
            .as_deref()
            .map(dates::normalize_day)
            .transpose()?,
        query
            .to_date
            .as_deref()
            .map(dates::normalize_day)
            .transpose()?,
    ))
}

// ── Journal Entries ──────────────────────────────────────────────────────────

/// GET /api/journal-entries
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntryListQuery>,
) -> ApiResult<Json<Vec<JournalEntry>>> {
    let user_id = query
        .user_id
        .clone()
        .ok_or_else(|| ApiError::missing("user_id is"))?;
    let (date, from_date, to_date) = day_filters(&query)?;

    Ok(Json(state.journal.list(
        &user_id,
        date.as_deref(),
        from_date.as_deref(),
        to_date.as_deref(),
    )))
}

/// POST /api/journal-entries
pub async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateJournalRequest>,
) -> ApiResult<Json<JournalEntry>> {
    let (user_id, date, title, content) = match (
        request.user_id,
        request.date,
        request.title,
        request.content,
    ) {
        (Some(u), Some(d), Some(t), Some(c))
            if !u.is_empty() && !t.is_empty() && !c.is_empty() =>
        {
            (u, d, t, c)
        }
        _ => {
            return Err(ApiError::missing(
                "user_id, date, title, and content are",
            ));
        }
    };

    let date = dates::normalize_day(&date)?;
    let entry = state.journal.create(
        &user_id,
        &date,
        &title,
        &content,
        request.reflection_prompts.unwrap_or_default(),
        request.tags.unwrap_or_default(),
        request.is_private.unwrap_or(true),
        Utc::now(),
    );
    Ok(Json(entry))
}

/// PUT /api/journal-entries?id=
pub async fn update_entry(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Json(request): Json<UpdateJournalRequest>,
) -> ApiResult<Json<JournalEntry>> {
    let id = query.id.ok_or_else(|| ApiError::missing("id is"))?;

    let patch = JournalPatch {
        title: request.title,
        content: request.content,
        reflection_prompts: request.reflection_prompts,
        tags: request.tags,
        is_private: request.is_private,
    };
    let entry = state.journal.update(&id, patch, Utc::now())?;
    Ok(Json(entry))
}

/// DELETE /api/journal-entries?id=
pub async fn delete_entry(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = query.id.ok_or_else(|| ApiError::missing("id is"))?;
    state.journal.delete(&id)?;
    Ok(Json(json!({ "success": true })))
}

// ── Mood Entries ─────────────────────────────────────────────────────────────

/// GET /api/mood-entries
pub async fn list_moods(
    State(state): State<AppState>,
    Query(query): Query<EntryListQuery>,
) -> ApiResult<Json<Vec<MoodEntry>>> {
    let user_id = query
        .user_id
        .clone()
        .ok_or_else(|| ApiError::missing("user_id is"))?;
    let (date, from_date, to_date) = day_filters(&query)?;

    Ok(Json(state.moods.list(
        &user_id,
        date.as_deref(),
        from_date.as_deref(),
        to_date.as_deref(),
    )))
}

/// POST /api/mood-entries
///
/// Upsert by (user, day). Intensity must sit in [1, 5].
pub async fn upsert_mood(
    State(state): State<AppState>,
    Json(request): Json<UpsertMoodRequest>,
) -> ApiResult<Json<MoodEntry>> {
    let (user_id, date, mood, intensity) = match (
        request.user_id,
        request.date,
        request.mood,
        request.intensity,
    ) {
        (Some(u), Some(d), Some(m), Some(i)) if !u.is_empty() => (u, d, m, i),
        _ => {
            return Err(ApiError::missing(
                "user_id, date, mood, and intensity are",
            ));
        }
    };

    if !(1..=5).contains(&intensity) {
        return Err(ApiError::Validation(
            "intensity must be between 1 and 5".to_string(),
        ));
    }

    let date = dates::normalize_day(&date)?;
    let entry = state
        .moods
        .upsert(&user_id, &date, mood, intensity, request.note, Utc::now());
    Ok(Json(entry))
}

/// DELETE /api/mood-entries?id=
pub async fn delete_mood(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = query.id.ok_or_else(|| ApiError::missing("id is"))?;
    state.moods.delete_by_id(&id)?;
    Ok(Json(json!({ "success": true })))
}

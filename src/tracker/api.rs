//! Chanting tracker API handlers.
//!
//! - `GET/POST /api/chanting-records` — list / upsert per-day counts
//! - `GET/POST /api/chanting-notes`   — list / create annotations

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::types::{ChantingNote, ChantingRecord};
use crate::dates;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordListQuery {
    pub user_id: Option<String>,
    pub chant_date: Option<String>,
    pub from_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertRecordRequest {
    pub user_id: Option<String>,
    pub mantra_id: Option<String>,
    pub chant_date: Option<String>,
    #[serde(default)]
    pub chant_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct NoteListQuery {
    pub user_id: Option<String>,
    pub mantra_id: Option<String>,
    pub chant_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub user_id: Option<String>,
    pub mantra_id: Option<String>,
    pub chant_date: Option<String>,
    pub note: Option<String>,
}

/// GET /api/chanting-records
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordListQuery>,
) -> ApiResult<Json<Vec<ChantingRecord>>> {
    let user_id = query.user_id.ok_or_else(|| ApiError::missing("user_id is"))?;
    let chant_date = query
        .chant_date
        .as_deref()
        .map(dates::normalize_day)
        .transpose()?;
    let from_date = query
        .from_date
        .as_deref()
        .map(dates::normalize_day)
        .transpose()?;

    Ok(Json(state.records.list(
        &user_id,
        chant_date.as_deref(),
        from_date.as_deref(),
    )))
}

/// POST /api/chanting-records
///
/// Upsert by (user, mantra, day). The stored count is the absolute count
/// for that day; a missing count writes zero.
pub async fn upsert_record(
    State(state): State<AppState>,
    Json(request): Json<UpsertRecordRequest>,
) -> ApiResult<Json<ChantingRecord>> {
    let (user_id, mantra_id, chant_date) =
        match (request.user_id, request.mantra_id, request.chant_date) {
            (Some(u), Some(m), Some(d)) if !u.is_empty() && !m.is_empty() => (u, m, d),
            _ => {
                return Err(ApiError::missing("mantra_id, user_id, and chant_date are"));
            }
        };

    let chant_date = dates::normalize_day(&chant_date)?;
    let record = state.records.upsert(
        &user_id,
        &mantra_id,
        &chant_date,
        request.chant_count.unwrap_or(0),
        Utc::now(),
    );
    Ok(Json(record))
}

/// GET /api/chanting-notes
pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteListQuery>,
) -> ApiResult<Json<Vec<ChantingNote>>> {
    let user_id = query.user_id.ok_or_else(|| ApiError::missing("user_id is"))?;
    let chant_date = query
        .chant_date
        .as_deref()
        .map(dates::normalize_day)
        .transpose()?;

    Ok(Json(state.notes.list(
        &user_id,
        query.mantra_id.as_deref(),
        chant_date.as_deref(),
    )))
}

/// POST /api/chanting-notes
pub async fn create_note(
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> ApiResult<Json<ChantingNote>> {
    let (user_id, mantra_id, chant_date, note) = match (
        request.user_id,
        request.mantra_id,
        request.chant_date,
        request.note,
    ) {
        (Some(u), Some(m), Some(d), Some(n))
            if !u.is_empty() && !m.is_empty() && !n.is_empty() =>
        {
            (u, m, d, n)
        }
        _ => {
            return Err(ApiError::missing(
                "mantra_id, user_id, chant_date, and note are",
            ));
        }
    };

    let chant_date = dates::normalize_day(&chant_date)?;
    let note = state
        .notes
        .create(&user_id, &mantra_id, &chant_date, &note, Utc::now());
    Ok(Json(note))
}

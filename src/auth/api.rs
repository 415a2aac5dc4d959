//! Authentication API handlers.
//!
//! - `POST /api/auth/register` — create account, start session
//! - `POST /api/auth/login`    — credential check, start session
//! - `POST /api/auth/logout`   — end session
//! - `GET  /api/auth/me`       — resolve the session cookie to a user

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::types::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn user_json(user: &AuthUser) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (email, password, name) = match (request.email, request.password, request.name) {
        (Some(e), Some(p), Some(n)) if !e.is_empty() && !p.is_empty() && !n.is_empty() => (e, p, n),
        _ => {
            return Err(ApiError::missing("Email, password, and name are"));
        }
    };

    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    let now = Utc::now();
    let password_hash = super::hash_password(&password);
    let user = state.users.create(&email, &name, &password_hash, now)?;
    let session = state
        .sessions
        .create(&user.id, state.config.session_ttl_days, now);

    let auth_user = AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
    };

    Ok((
        [(
            header::SET_COOKIE,
            super::session_cookie(&session.session_id, state.config.session_ttl_days),
        )],
        Json(json!({
            "user": user_json(&auth_user),
            "message": "Registration successful",
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (email, password) = match (request.email, request.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(ApiError::missing("Email and password are")),
    };

    let user = state
        .users
        .find_by_email(&email)
        .filter(|u| super::verify_password(&password, &u.password_hash))
        .ok_or(ApiError::Unauthorized)?;

    let now = Utc::now();
    let session = state
        .sessions
        .create(&user.id, state.config.session_ttl_days, now);
    tracing::info!(user_id = %user.id, "User logged in");

    let auth_user = AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
    };

    Ok((
        [(
            header::SET_COOKIE,
            super::session_cookie(&session.session_id, state.config.session_ttl_days),
        )],
        Json(json!({
            "user": user_json(&auth_user),
            "message": "Login successful",
        })),
    ))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(session_id) = super::session_id_from_headers(&headers) {
        state.sessions.delete(&session_id);
    }

    (
        [(header::SET_COOKIE, super::clear_session_cookie())],
        Json(json!({ "message": "Logout successful" })),
    )
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::current_user(&state, &headers).ok_or(ApiError::Unauthorized)?;
    Ok(Json(json!({ "user": user_json(&user) })))
}

//! Notification API handlers.
//!
//! - `GET/POST /api/notifications/settings`  — per-user schedule settings
//! - `POST/DELETE /api/notifications/subscribe` — push token registration
//! - `POST /api/notifications/test`          — send a test push to the caller
//! - `GET  /api/notifications/schedule`      — upcoming trigger instants
//! - `POST /api/notifications/send`          — dispatch for one target time
//!
//! Settings and subscription routes are session-gated; schedule and send
//! require the shared cron bearer secret instead, since they are driven by
//! an external trigger rather than a browser.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::json;

use super::push::{PushMessage, SendOutcome};
use super::scheduler;
use super::types::{DailyReminders, DeviceInfo, NotificationSettings, StreakProtection, WeeklySummary};
use crate::auth::{self, types::AuthUser};
use crate::dates;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const TEST_TITLE: &str = "🕉️ Test Notification";
const TEST_BODY: &str = "Great! Your push notifications are working perfectly! 🙏";

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub enabled: Option<bool>,
    #[serde(rename = "dailyReminders")]
    pub daily_reminders: Option<DailyReminders>,
    #[serde(rename = "streakProtection")]
    pub streak_protection: Option<StreakProtection>,
    #[serde(rename = "weeklySummary")]
    pub weekly_summary: Option<WeeklySummary>,
    #[serde(rename = "customMessage")]
    pub custom_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub fcm_token: Option<String>,
    pub device_info: Option<DeviceInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SendQuery {
    pub time: Option<String>,
}

fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    auth::current_user(state, headers).ok_or(ApiError::Unauthorized)
}

fn require_cron_secret(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let expected = state
        .config
        .cron_secret
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Settings as the clients expect them: no user id, no timestamps.
fn settings_body(settings: &NotificationSettings) -> serde_json::Value {
    let mut body = json!({
        "enabled": settings.enabled,
        "dailyReminders": settings.daily_reminders,
        "streakProtection": settings.streak_protection,
        "weeklySummary": settings.weekly_summary,
    });
    if let Some(ref message) = settings.custom_message {
        body["customMessage"] = json!(message);
    }
    body
}

/// GET /api/notifications/settings
pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers)?;
    let settings = state
        .notification_settings
        .get(&user.id)
        .unwrap_or_else(|| NotificationSettings::defaults(&user.id, Utc::now()));
    Ok(Json(settings_body(&settings)))
}

/// POST /api/notifications/settings
pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers)?;
    let now = Utc::now();

    let mut settings = state
        .notification_settings
        .get(&user.id)
        .unwrap_or_else(|| NotificationSettings::defaults(&user.id, now));

    if let Some(enabled) = request.enabled {
        settings.enabled = enabled;
    }
    if let Some(mut daily) = request.daily_reminders {
        for time in &mut daily.times {
            *time = dates::normalize_clock(time)?;
        }
        settings.daily_reminders = daily;
    }
    if let Some(mut streak) = request.streak_protection {
        streak.alert_time = dates::normalize_clock(&streak.alert_time)?;
        settings.streak_protection = streak;
    }
    if let Some(mut weekly) = request.weekly_summary {
        if weekly.day > 6 {
            return Err(ApiError::Validation(
                "day must be between 0 and 6".to_string(),
            ));
        }
        weekly.time = dates::normalize_clock(&weekly.time)?;
        settings.weekly_summary = weekly;
    }
    if let Some(message) = request.custom_message {
        settings.custom_message = if message.is_empty() {
            None
        } else {
            Some(message)
        };
    }

    let body = settings_body(&settings);
    state.notification_settings.upsert(settings, now);

    Ok(Json(json!({ "success": true, "settings": body })))
}

/// POST /api/notifications/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers)?;
    let token = request
        .fcm_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::missing("fcm_token is"))?;

    state.subscriptions.register(
        &user.id,
        &token,
        request.device_info.unwrap_or_default(),
        Utc::now(),
    );

    Ok(Json(json!({
        "success": true,
        "message": "Push subscription saved",
    })))
}

/// DELETE /api/notifications/subscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers)?;
    state.subscriptions.unregister(&user.id);
    Ok(Json(json!({ "success": true })))
}

/// POST /api/notifications/test
pub async fn send_test(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers)?;
    let push = state.push.as_ref().ok_or(ApiError::PushNotConfigured)?;

    let token = state.subscriptions.token_for(&user.id).ok_or_else(|| {
        ApiError::Validation("No FCM token registered for this user".to_string())
    })?;

    let message = PushMessage {
        title: TEST_TITLE.to_string(),
        body: TEST_BODY.to_string(),
    };

    match push.send(&token, &message).await {
        Ok(SendOutcome::Delivered) => Ok(Json(json!({
            "success": true,
            "message": "Test notification sent",
        }))),
        Ok(SendOutcome::InvalidToken) => {
            state.subscriptions.unregister(&user.id);
            Err(ApiError::Validation(
                "Invalid FCM token. Please re-enable notifications.".to_string(),
            ))
        }
        Ok(SendOutcome::Failed(reason)) => Err(ApiError::Delivery(reason)),
        Err(e) => Err(ApiError::Delivery(e.to_string())),
    }
}

/// GET /api/notifications/schedule
pub async fn get_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_cron_secret(&state, &headers)?;

    let now = Local::now().naive_local();
    let instants =
        scheduler::schedule_times(&state.notification_settings.enabled_settings(), now);

    let scheduled: Vec<serde_json::Value> = instants
        .iter()
        .map(|instant| {
            json!({
                "time": instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "minutesFromNow": (*instant - now).num_minutes(),
            })
        })
        .collect();

    Ok(Json(json!({
        "scheduledTimes": scheduled,
        "count": scheduled.len(),
    })))
}

/// POST /api/notifications/send
pub async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SendQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    require_cron_secret(&state, &headers)?;
    let push = state.push.as_ref().ok_or(ApiError::PushNotConfigured)?;

    let now = Local::now().naive_local();
    let time = match query.time {
        Some(t) => dates::normalize_clock(&t)?,
        None => now.format("%H:%M").to_string(),
    };

    let counters = scheduler::dispatch_for_time(
        &state.notification_settings,
        &state.subscriptions,
        &state.records,
        push.as_ref(),
        &time,
        now,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "time": time,
        "successCount": counters.success_count,
        "totalAttempted": counters.total_attempted,
        "invalidTokensRemoved": counters.invalid_tokens_removed,
    })))
}

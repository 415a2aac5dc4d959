//! Sadhana Server
//!
//! A spiritual practice tracker backend:
//!
//! 1. **Chanting tracker**: Per-day, per-mantra chant counts with free-form
//!    practice notes and a seeded mantra catalog.
//!
//! 2. **Journal and mood log**: Reflective journal entries with guided
//!    prompts, plus one mood entry per user per day.
//!
//! 3. **Practice statistics**: Today/week/month totals, streaks, and
//!    zero-filled analytics series for charting.
//!
//! 4. **Reminder notifications**: Per-user notification schedules (daily
//!    reminders, streak protection, weekly summaries) dispatched over FCM
//!    push by an externally triggered scheduler.

mod auth;
mod dates;
mod error;
mod journal;
mod mantra;
mod notify;
mod persist;
mod state;
mod stats;
mod tracker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use notify::push::{FcmClient, PushDelivery, DEFAULT_FCM_ENDPOINT};
use state::{AppConfig, AppState};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sadhana-server", version, about = "Spiritual practice tracker server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "SADHANA_PORT")]
    port: u16,

    /// Directory for persisted JSON collections. Omit for in-memory only.
    #[arg(long, env = "SADHANA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Shared secret required by the scheduled-dispatch endpoints
    #[arg(long, env = "CRON_SECRET")]
    cron_secret: Option<String>,

    /// FCM server key for push delivery. Omit to disable push.
    #[arg(long, env = "FCM_SERVER_KEY")]
    fcm_server_key: Option<String>,

    /// FCM HTTP endpoint
    #[arg(long, default_value = DEFAULT_FCM_ENDPOINT, env = "FCM_ENDPOINT")]
    fcm_endpoint: String,

    /// Session TTL in days
    #[arg(long, default_value_t = 7, env = "SESSION_TTL_DAYS")]
    session_ttl_days: i64,

    /// Expired-session sweep interval in seconds
    #[arg(long, default_value_t = 3600, env = "CLEANUP_INTERVAL_SECS")]
    cleanup_interval_secs: u64,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sadhana_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = AppConfig {
        port: args.port,
        data_dir: args.data_dir,
        cron_secret: args.cron_secret,
        session_ttl_days: args.session_ttl_days,
    };

    let push: Option<Arc<dyn PushDelivery>> = match args.fcm_server_key {
        Some(key) if !key.is_empty() => {
            tracing::info!("FCM push delivery enabled");
            Some(Arc::new(FcmClient::new(key, args.fcm_endpoint)))
        }
        _ => {
            tracing::info!("FCM push delivery disabled (no server key configured)");
            None
        }
    };

    if config.cron_secret.is_none() {
        tracing::warn!("No cron secret configured; dispatch endpoints are disabled");
    }

    let state = AppState::new(config, push);

    let seeded = state.mantras.seed_if_empty(Utc::now());
    if seeded > 0 {
        tracing::info!(count = seeded, "Seeded mantra catalog");
    }

    // Spawn periodic session cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = args.cleanup_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));
        loop {
            interval.tick().await;
            let removed = cleanup_state.sessions.cleanup_expired(Utc::now());
            if removed > 0 {
                tracing::debug!(removed, "Swept expired sessions");
            }
        }
    });

    // Build router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/register", post(auth::api::register))
        .route("/api/auth/login", post(auth::api::login))
        .route("/api/auth/logout", post(auth::api::logout))
        .route("/api/auth/me", get(auth::api::me))
        .route("/api/mantras", get(mantra::api::list_mantras))
        .route(
            "/api/chanting-records",
            get(tracker::api::list_records).post(tracker::api::upsert_record),
        )
        .route(
            "/api/chanting-notes",
            get(tracker::api::list_notes).post(tracker::api::create_note),
        )
        .route(
            "/api/journal-entries",
            get(journal::api::list_entries)
                .post(journal::api::create_entry)
                .put(journal::api::update_entry)
                .delete(journal::api::delete_entry),
        )
        .route(
            "/api/mood-entries",
            get(journal::api::list_moods)
                .post(journal::api::upsert_mood)
                .delete(journal::api::delete_mood),
        )
        .route("/api/stats", get(stats::api::get_stats))
        .route("/api/analytics", get(stats::api::get_analytics))
        .route(
            "/api/notifications/settings",
            get(notify::api::get_settings).post(notify::api::update_settings),
        )
        .route(
            "/api/notifications/subscribe",
            post(notify::api::subscribe).delete(notify::api::unsubscribe),
        )
        .route("/api/notifications/test", post(notify::api::send_test))
        .route("/api/notifications/schedule", get(notify::api::get_schedule))
        .route("/api/notifications/send", post(notify::api::dispatch))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Sadhana server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

// ── Route Handlers ────────────────────────────────────────────────────────────

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "sadhana-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_json_structure() {
        let json_val = json!({
            "status": "ok",
            "service": "sadhana-server",
            "version": env!("CARGO_PKG_VERSION"),
        });
        assert_eq!(json_val["status"], "ok");
        assert_eq!(json_val["service"], "sadhana-server");
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.data_dir.is_none());
        assert!(config.cron_secret.is_none());
        assert_eq!(config.session_ttl_days, 7);
    }

    #[tokio::test]
    async fn test_state_creation_seeds_nothing_twice() {
        let state = AppState::for_tests();
        let first = state.mantras.seed_if_empty(Utc::now());
        let second = state.mantras.seed_if_empty(Utc::now());
        assert_eq!(first, 5);
        assert_eq!(second, 0);
    }
}

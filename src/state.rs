//! Shared server state.
//!
//! All per-domain stores are concurrent (DashMap) for lock-free access and
//! are cheap to clone; `AppState` is handed to axum via `Router::with_state`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::store::{SessionStore, UserStore};
use crate::journal::store::{JournalStore, MoodStore};
use crate::mantra::store::MantraStore;
use crate::notify::push::PushDelivery;
use crate::notify::store::{SettingsStore, SubscriptionStore};
use crate::tracker::store::{ChantingNoteStore, ChantingRecordStore};

/// Default session lifetime (matches the session cookie's Max-Age).
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Where stores persist their JSON collections. None keeps everything
    /// in memory only.
    pub data_dir: Option<PathBuf>,
    /// Shared secret the scheduled-dispatch endpoint requires as a bearer
    /// token. None disables dispatch entirely.
    pub cron_secret: Option<String>,
    pub session_ttl_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: None,
            cron_secret: None,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
        }
    }
}

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub sessions: SessionStore,
    pub mantras: MantraStore,
    pub records: ChantingRecordStore,
    pub notes: ChantingNoteStore,
    pub journal: JournalStore,
    pub moods: MoodStore,
    pub notification_settings: SettingsStore,
    pub subscriptions: SubscriptionStore,

    /// Push delivery backend. None when no server key is configured; the
    /// notification endpoints that need it answer with an explicit error.
    pub push: Option<Arc<dyn PushDelivery>>,

    pub config: AppConfig,
}

impl AppState {
    /// Build state with every store loading from (and persisting to) the
    /// configured data directory.
    pub fn new(config: AppConfig, push: Option<Arc<dyn PushDelivery>>) -> Self {
        let dir = config.data_dir.clone();
        Self {
            users: UserStore::new(dir.clone()),
            sessions: SessionStore::new(dir.clone()),
            mantras: MantraStore::new(dir.clone()),
            records: ChantingRecordStore::new(dir.clone()),
            notes: ChantingNoteStore::new(dir.clone()),
            journal: JournalStore::new(dir.clone()),
            moods: MoodStore::new(dir.clone()),
            notification_settings: SettingsStore::new(dir.clone()),
            subscriptions: SubscriptionStore::new(dir),
            push,
            config,
        }
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new(AppConfig::default(), None)
    }
}

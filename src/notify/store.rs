//! Notification settings and push subscription stores.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::types::{DeviceInfo, NotificationSettings, PushSubscription};
use crate::persist;

const SETTINGS_COLLECTION: &str = "notification_settings";
const SUBSCRIPTIONS_COLLECTION: &str = "push_subscriptions";

// ── Settings ─────────────────────────────────────────────────────────────────

/// Store for notification settings, one document per user.
#[derive(Clone)]
pub struct SettingsStore {
    by_user: Arc<DashMap<String, NotificationSettings>>,
    data_dir: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_user: Arc<DashMap<String, NotificationSettings>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (user_id, settings) in
                persist::load_collection::<NotificationSettings>(dir, SETTINGS_COLLECTION)
            {
                by_user.insert(user_id, settings);
            }
        }
        Self { by_user, data_dir }
    }

    pub fn get(&self, user_id: &str) -> Option<NotificationSettings> {
        self.by_user.get(user_id).map(|s| s.clone())
    }

    /// Replace a user's settings, preserving `created_at` from the original
    /// insert.
    pub fn upsert(&self, mut settings: NotificationSettings, now: DateTime<Utc>) {
        if let Some(existing) = self.by_user.get(&settings.user_id) {
            settings.created_at = existing.created_at;
        }
        settings.updated_at = now;
        self.by_user.insert(settings.user_id.clone(), settings);
        self.persist();
    }

    /// Every settings document with the master switch on.
    pub fn enabled_settings(&self) -> Vec<NotificationSettings> {
        self.by_user
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.value().clone())
            .collect()
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_user
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, SETTINGS_COLLECTION, &entries);
        }
    }
}

// ── Push Subscriptions ───────────────────────────────────────────────────────

/// Store for push subscriptions, at most one live token per user.
#[derive(Clone)]
pub struct SubscriptionStore {
    by_user: Arc<DashMap<String, PushSubscription>>,
    data_dir: Option<PathBuf>,
}

impl SubscriptionStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_user: Arc<DashMap<String, PushSubscription>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (user_id, subscription) in
                persist::load_collection::<PushSubscription>(dir, SUBSCRIPTIONS_COLLECTION)
            {
                by_user.insert(user_id, subscription);
            }
        }
        Self { by_user, data_dir }
    }

    /// Register a token for a user, discarding any prior token first.
    pub fn register(
        &self,
        user_id: &str,
        fcm_token: &str,
        device_info: DeviceInfo,
        now: DateTime<Utc>,
    ) -> PushSubscription {
        self.by_user.remove(user_id);
        let subscription = PushSubscription {
            user_id: user_id.to_string(),
            fcm_token: fcm_token.to_string(),
            device_info,
            created_at: now,
            updated_at: now,
        };
        self.by_user
            .insert(user_id.to_string(), subscription.clone());
        self.persist();
        tracing::info!(user_id, "Push token registered");
        subscription
    }

    /// Remove a user's subscription. Returns whether one existed.
    pub fn unregister(&self, user_id: &str) -> bool {
        let removed = self.by_user.remove(user_id).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// The user's current push token, if any.
    pub fn token_for(&self, user_id: &str) -> Option<String> {
        self.by_user.get(user_id).map(|s| s.fcm_token.clone())
    }

    /// Bulk-remove every subscription whose token is in the given set.
    /// Returns the number removed.
    pub fn remove_tokens(&self, tokens: &HashSet<String>) -> usize {
        if tokens.is_empty() {
            return 0;
        }
        let before = self.by_user.len();
        self.by_user.retain(|_, sub| !tokens.contains(&sub.fcm_token));
        let removed = before - self.by_user.len();
        if removed > 0 {
            tracing::info!(removed, "Purged invalid push tokens");
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_user
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, SUBSCRIPTIONS_COLLECTION, &entries);
        }
    }
}

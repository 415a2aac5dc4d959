//! User and session stores.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::types::{Session, User};
use crate::error::ApiError;
use crate::persist;

const USERS_COLLECTION: &str = "users";
const SESSIONS_COLLECTION: &str = "sessions";

// ── Users ────────────────────────────────────────────────────────────────────

/// Store for user records, with a unique-email index.
#[derive(Clone)]
pub struct UserStore {
    by_id: Arc<DashMap<String, User>>,
    /// Lowercase email → user id.
    email_index: Arc<DashMap<String, String>>,
    data_dir: Option<PathBuf>,
}

impl UserStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_id: Arc<DashMap<String, User>> = Arc::new(DashMap::new());
        let email_index: Arc<DashMap<String, String>> = Arc::new(DashMap::new());

        if let Some(ref dir) = data_dir {
            for (id, user) in persist::load_collection::<User>(dir, USERS_COLLECTION) {
                email_index.insert(user.email.to_lowercase(), id.clone());
                by_id.insert(id, user);
            }
        }

        Self {
            by_id,
            email_index,
            data_dir,
        }
    }

    /// Create a user. Fails with a conflict when the email is taken.
    pub fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<User, ApiError> {
        let email_key = email.to_lowercase();
        if self.email_index.contains_key(&email_key) {
            return Err(ApiError::Conflict("User with this email already exists"));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.email_index.insert(email_key, user.id.clone());
        self.by_id.insert(user.id.clone(), user.clone());
        self.persist();
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.by_id.get(id).map(|u| u.clone())
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let id = self.email_index.get(&email.to_lowercase())?.clone();
        self.get(&id)
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_id
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, USERS_COLLECTION, &entries);
        }
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

/// Store for login sessions with lazy expiry.
#[derive(Clone)]
pub struct SessionStore {
    by_id: Arc<DashMap<String, Session>>,
    data_dir: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_id: Arc<DashMap<String, Session>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (id, session) in persist::load_collection::<Session>(dir, SESSIONS_COLLECTION) {
                by_id.insert(id, session);
            }
        }
        Self { by_id, data_dir }
    }

    /// Mint a new session for a user.
    pub fn create(&self, user_id: &str, ttl_days: i64, now: DateTime<Utc>) -> Session {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            expires_at: now + Duration::days(ttl_days),
            created_at: now,
        };
        self.by_id.insert(session.session_id.clone(), session.clone());
        self.persist();
        session
    }

    /// Look up a session, removing it when expired.
    pub fn get_valid(&self, session_id: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.by_id.get(session_id)?.clone();
        if session.expires_at > now {
            Some(session)
        } else {
            drop(self.by_id.remove(session_id));
            self.persist();
            None
        }
    }

    pub fn delete(&self, session_id: &str) {
        if self.by_id.remove(session_id).is_some() {
            self.persist();
        }
    }

    /// Remove every expired session. Returns the number removed.
    pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.by_id.len();
        self.by_id.retain(|_, session| session.expires_at > now);
        let removed = before - self.by_id.len();
        if removed > 0 {
            tracing::info!(removed, "Cleaned up expired sessions");
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_id
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, SESSIONS_COLLECTION, &entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_rejected() {
        let store = UserStore::new(None);
        let now = Utc::now();
        store.create("devotee@example.com", "Devotee", "s$h", now).unwrap();

        let err = store
            .create("Devotee@Example.com", "Other", "s$h", now)
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_find_by_email_is_case_insensitive() {
        let store = UserStore::new(None);
        let user = store
            .create("devotee@example.com", "Devotee", "s$h", Utc::now())
            .unwrap();
        let found = store.find_by_email("DEVOTEE@example.com").unwrap();
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn test_session_expiry_is_lazy() {
        let store = SessionStore::new(None);
        let now = Utc::now();
        let session = store.create("user-1", 7, now);

        assert!(store.get_valid(&session.session_id, now).is_some());

        let later = now + Duration::days(8);
        assert!(store.get_valid(&session.session_id, later).is_none());
        // The expired session was removed on lookup.
        assert!(store.get_valid(&session.session_id, now).is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = SessionStore::new(None);
        let now = Utc::now();
        store.create("user-1", 7, now - Duration::days(10));
        store.create("user-2", 7, now);

        assert_eq!(store.cleanup_expired(now), 1);
        assert_eq!(store.cleanup_expired(now), 0);
    }
}

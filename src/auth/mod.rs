//! Authentication and session management.
//!
//! Credentials are checked against salted SHA-256 digests; a successful
//! login mints an opaque UUID session id stored in an HttpOnly cookie.
//! Session lookups filter out expired sessions lazily, and a periodic task
//! sweeps the rest.

pub mod api;
pub mod store;
pub mod types;

use axum::http::{header, HeaderMap};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::state::AppState;
use types::AuthUser;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sadhana_session";

// ── Password Hashing ─────────────────────────────────────────────────────────

/// Hash a password with a fresh random salt. Stored as `salt$digest` (hex).
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    format!("{salt_hex}${}", digest_password(&salt_hex, password))
}

/// Verify a password against a stored `salt$digest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => digest_password(salt, password) == digest,
        None => false,
    }
}

fn digest_password(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// ── Session Cookies ──────────────────────────────────────────────────────────

/// Build the `Set-Cookie` value that establishes a session.
pub fn session_cookie(session_id: &str, ttl_days: i64) -> String {
    let max_age = ttl_days * 24 * 3600;
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// Build the `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extract the session id from a request's `Cookie` header, if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolve the request's session cookie to the authenticated user.
///
/// Returns `None` for a missing cookie, an expired session, or a session
/// whose user no longer exists.
pub fn current_user(state: &AppState, headers: &HeaderMap) -> Option<AuthUser> {
    let session_id = session_id_from_headers(headers)?;
    let session = state.sessions.get_valid(&session_id, chrono::Utc::now())?;
    let user = state.users.get(&session.user_id)?;
    Some(AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("govinda108");
        assert!(verify_password("govinda108", &stored));
        assert!(!verify_password("govinda109", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_verify_rejects_malformed_stored_value() {
        assert!(!verify_password("anything", "no-separator"));
    }

    #[test]
    fn test_session_id_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("other=1; {SESSION_COOKIE}=abc-123; theme=dark")
                .parse()
                .unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc-123"));

        let empty = HeaderMap::new();
        assert_eq!(session_id_from_headers(&empty), None);
    }

    #[test]
    fn test_cookie_values() {
        let set = session_cookie("abc", 7);
        assert!(set.contains("sadhana_session=abc"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=604800"));

        let clear = clear_session_cookie();
        assert!(clear.contains("Max-Age=0"));
    }
}

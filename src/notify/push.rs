//! Push delivery collaborator.
//!
//! The scheduler talks to an abstract [`PushDelivery`] so tests can record
//! sends without a network. The production implementation posts to the FCM
//! HTTP endpoint with a server-key Authorization header; tokens the service
//! reports as unregistered are surfaced as [`SendOutcome::InvalidToken`] so
//! the caller can purge them.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// FCM error codes that mean the token is dead and should be purged.
const INVALID_TOKEN_ERRORS: &[&str] = &["NotRegistered", "InvalidRegistration", "MismatchSenderId"];

/// A notification payload: title and body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

/// Per-token result of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The token is dead; the subscription should be removed.
    InvalidToken,
    /// Delivery failed for a reason unrelated to token validity.
    Failed(String),
}

/// Transport-level failure reaching the delivery service.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Transport(String),
    #[error("unexpected push response: {0}")]
    Response(String),
}

/// The external delivery collaborator.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// Deliver to a single token.
    async fn send(&self, token: &str, message: &PushMessage) -> Result<SendOutcome, PushError>;

    /// Deliver the same message to many tokens in one call. The returned
    /// outcomes align with the input token order.
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<Vec<SendOutcome>, PushError>;
}

// ── FCM Client ───────────────────────────────────────────────────────────────

/// Default FCM legacy HTTP endpoint.
pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// FCM HTTP client.
pub struct FcmClient {
    http: reqwest::Client,
    endpoint: String,
    server_key: String,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    error: Option<String>,
}

impl FcmClient {
    pub fn new(server_key: String, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            server_key,
        }
    }

    async fn post(&self, payload: serde_json::Value) -> Result<FcmResponse, PushError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Transport(format!(
                "delivery service returned {status}"
            )));
        }

        response
            .json::<FcmResponse>()
            .await
            .map_err(|e| PushError::Response(e.to_string()))
    }
}

fn outcome_from_result(result: &FcmResult) -> SendOutcome {
    match result.error {
        None => SendOutcome::Delivered,
        Some(ref code) if INVALID_TOKEN_ERRORS.contains(&code.as_str()) => {
            SendOutcome::InvalidToken
        }
        Some(ref code) => SendOutcome::Failed(code.clone()),
    }
}

#[async_trait]
impl PushDelivery for FcmClient {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<SendOutcome, PushError> {
        let response = self
            .post(json!({
                "to": token,
                "notification": { "title": message.title, "body": message.body },
            }))
            .await?;

        let result = response
            .results
            .first()
            .ok_or_else(|| PushError::Response("empty results array".to_string()))?;
        Ok(outcome_from_result(result))
    }

    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<Vec<SendOutcome>, PushError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .post(json!({
                "registration_ids": tokens,
                "notification": { "title": message.title, "body": message.body },
            }))
            .await?;

        if response.results.len() != tokens.len() {
            return Err(PushError::Response(format!(
                "expected {} results, got {}",
                tokens.len(),
                response.results.len()
            )));
        }

        Ok(response.results.iter().map(outcome_from_result).collect())
    }
}

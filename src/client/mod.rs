//! Remote data client
//!
//! Talks to the session backend. Every call is a JSON `POST`; there are no
//! retries, a failed call is terminal for that invocation.

mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use error::ClientError;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::models::{
    ActivateSessionRequest, SessionAccessRequest, SessionIdRequest, SessionLookup,
};

/// Backend endpoint paths
pub mod paths {
    pub const GET_SESSION: &str = "/api/session/getSessionByID";
    pub const ACTIVATE_SESSION: &str = "/api/session/activateSessionByID";
    pub const KILL_SESSION: &str = "/api/session/killSessionByID";
    pub const ALLOW_USER: &str = "/api/session/allowUsertoSession";
    pub const DENY_USER: &str = "/api/session/denyUsertoSession";
}

/// Session backend operations
///
/// Command acknowledgements are backend-defined and returned as raw JSON
/// (`Value::Null` for an empty body).
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Fetch a session snapshot
    async fn get_session(&self, id: &str) -> Result<SessionLookup, ClientError>;

    /// Activate a session on behalf of `requester`
    async fn activate_session(&self, id: &str, requester: &str) -> Result<Value, ClientError>;

    /// Stop a session
    async fn kill_session(&self, id: &str) -> Result<Value, ClientError>;

    /// Add `email` to the allow-list
    async fn allow_user(&self, id: &str, creator: &str, email: &str) -> Result<Value, ClientError>;

    /// Remove `email` from the allow-list
    async fn deny_user(&self, id: &str, creator: &str, email: &str) -> Result<Value, ClientError>;
}

/// `SessionApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionClient {
    /// Build a client for the configured backend
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sessionctl/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Request to {} failed: {}", path, e);
                ClientError::network(path, e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::network(path, e))?;

        if !status.is_success() {
            let message = extract_error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            tracing::warn!("{} returned {}: {}", path, status, message);
            return Err(ClientError::Api {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ClientError::decode(path, e))
    }
}

#[async_trait]
impl SessionApi for HttpSessionClient {
    async fn get_session(&self, id: &str) -> Result<SessionLookup, ClientError> {
        let body = SessionIdRequest { id: id.to_string() };
        let value = self.post(paths::GET_SESSION, &body).await?;
        SessionLookup::from_value(value).map_err(|e| ClientError::decode(paths::GET_SESSION, e))
    }

    async fn activate_session(&self, id: &str, requester: &str) -> Result<Value, ClientError> {
        let body = ActivateSessionRequest {
            creator: requester.to_string(),
            id: id.to_string(),
        };
        self.post(paths::ACTIVATE_SESSION, &body).await
    }

    async fn kill_session(&self, id: &str) -> Result<Value, ClientError> {
        let body = SessionIdRequest { id: id.to_string() };
        self.post(paths::KILL_SESSION, &body).await
    }

    async fn allow_user(&self, id: &str, creator: &str, email: &str) -> Result<Value, ClientError> {
        let body = access_request(id, creator, email);
        self.post(paths::ALLOW_USER, &body).await
    }

    async fn deny_user(&self, id: &str, creator: &str, email: &str) -> Result<Value, ClientError> {
        let body = access_request(id, creator, email);
        self.post(paths::DENY_USER, &body).await
    }
}

fn access_request(id: &str, creator: &str, email: &str) -> SessionAccessRequest {
    SessionAccessRequest {
        creator: creator.to_string(),
        id: id.to_string(),
        email: email.to_string(),
    }
}

/// Pull a human-readable message out of an error body
///
/// Accepts `{"message": ..}`, `{"error": ..}` and `{"error": {"message": ..}}`;
/// anything else non-empty is returned as plain text.
fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let found = value
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| value.get("error").and_then(Value::as_str))
            .or_else(|| value.pointer("/error/message").and_then(Value::as_str));
        if let Some(message) = found {
            return Some(message.to_string());
        }
    }

    Some(trimmed.to_string())
}

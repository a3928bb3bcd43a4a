//! In-process session backend
//!
//! Implements `SessionApi` over a map of sessions with the backend's
//! semantics. Used by the test suites and the mock HTTP backend; it also
//! records every call and can be told to fail specific endpoints.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{paths, ClientError, SessionApi};
use crate::models::{AllowedUser, Session, SessionLookup};

/// One call received by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: &'static str,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct InMemorySessionApi {
    sessions: RwLock<HashMap<String, Session>>,
    calls: RwLock<Vec<RecordedCall>>,
    failures: RwLock<HashMap<&'static str, (u16, String)>>,
    latency: RwLock<Option<Duration>>,
}

impl InMemorySessionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        let map = sessions.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            sessions: RwLock::new(map),
            ..Self::default()
        }
    }

    pub async fn session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Make every call to `endpoint` fail with `status` until cleared
    pub async fn fail_endpoint(&self, endpoint: &'static str, status: u16, message: &str) {
        self.failures
            .write()
            .await
            .insert(endpoint, (status, message.to_string()));
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Delay every call by `latency`
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    async fn enter(&self, endpoint: &'static str, body: Value) -> Result<(), ClientError> {
        self.calls.write().await.push(RecordedCall { endpoint, body });

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some((status, message)) = self.failures.read().await.get(endpoint) {
            return Err(ClientError::Api {
                endpoint: endpoint.to_string(),
                status: *status,
                message: message.clone(),
            });
        }
        Ok(())
    }

    async fn update<F>(&self, endpoint: &'static str, id: &str, f: F) -> Result<Value, ClientError>
    where
        F: FnOnce(&mut Session) -> Result<(), ClientError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or_else(|| ClientError::Api {
            endpoint: endpoint.to_string(),
            status: 404,
            message: format!("Session not found: {}", id),
        })?;
        f(session)?;
        Ok(json!({ "ok": true, "_id": id }))
    }
}

fn check_creator(endpoint: &'static str, session: &Session, creator: &str) -> Result<(), ClientError> {
    if session.creator != creator {
        return Err(ClientError::Api {
            endpoint: endpoint.to_string(),
            status: 403,
            message: "Only the session creator can manage access".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl SessionApi for InMemorySessionApi {
    async fn get_session(&self, id: &str) -> Result<SessionLookup, ClientError> {
        self.enter(paths::GET_SESSION, json!({ "_id": id })).await?;
        Ok(match self.sessions.read().await.get(id) {
            Some(session) => SessionLookup::Found(session.clone()),
            None => SessionLookup::Missing,
        })
    }

    async fn activate_session(&self, id: &str, requester: &str) -> Result<Value, ClientError> {
        self.enter(paths::ACTIVATE_SESSION, json!({ "creator": requester, "_id": id }))
            .await?;
        self.update(paths::ACTIVATE_SESSION, id, |s| {
            s.is_active = true;
            Ok(())
        })
        .await
    }

    async fn kill_session(&self, id: &str) -> Result<Value, ClientError> {
        self.enter(paths::KILL_SESSION, json!({ "_id": id })).await?;
        self.update(paths::KILL_SESSION, id, |s| {
            s.is_active = false;
            Ok(())
        })
        .await
    }

    async fn allow_user(&self, id: &str, creator: &str, email: &str) -> Result<Value, ClientError> {
        self.enter(paths::ALLOW_USER, json!({ "creator": creator, "_id": id, "email": email }))
            .await?;
        self.update(paths::ALLOW_USER, id, |s| {
            check_creator(paths::ALLOW_USER, s, creator)?;
            if !s.has_user(email) {
                s.users.push(AllowedUser::new(email));
            }
            Ok(())
        })
        .await
    }

    async fn deny_user(&self, id: &str, creator: &str, email: &str) -> Result<Value, ClientError> {
        self.enter(paths::DENY_USER, json!({ "creator": creator, "_id": id, "email": email }))
            .await?;
        self.update(paths::DENY_USER, id, |s| {
            check_creator(paths::DENY_USER, s, creator)?;
            if let Some(pos) = s.users.iter().position(|u| u.email == email) {
                s.users.remove(pos);
            }
            Ok(())
        })
        .await
    }
}

//! Session model
//!
//! Sessions are owned by the backend; the client only ever holds snapshots
//! fetched from `getSessionByID`.

use serde::{Deserialize, Serialize};

/// Shared session with an active flag and an access allow-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    /// Email of the session owner
    pub creator: String,
    /// Allow-list, in backend order
    #[serde(default)]
    pub users: Vec<AllowedUser>,
}

impl Session {
    /// Check whether an email is on the allow-list
    pub fn has_user(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.email == email)
    }

    /// Allow-list emails in order
    pub fn user_emails(&self) -> Vec<&str> {
        self.users.iter().map(|u| u.email.as_str()).collect()
    }
}

/// Allow-list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedUser {
    pub email: String,
    /// Backend-assigned priority. Higher-priority users may preempt control
    /// of lower-priority ones; the backend decides, the client only displays it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl AllowedUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            priority: None,
        }
    }
}

/// Result of a `getSessionByID` lookup
///
/// The backend answers a miss with an empty array (or nothing at all), so a
/// lookup is either a full session or `Missing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionLookup {
    Found(Session),
    Missing,
}

impl SessionLookup {
    /// Interpret a `getSessionByID` response body
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::Missing),
            serde_json::Value::Array(items) if items.is_empty() => Ok(Self::Missing),
            other => serde_json::from_value(other).map(Self::Found),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Found(session) => Some(session),
            Self::Missing => None,
        }
    }
}

/// Body of `getSessionByID` and `killSessionByID`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdRequest {
    #[serde(rename = "_id")]
    pub id: String,
}

/// Body of `activateSessionByID`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateSessionRequest {
    /// Requester identity (the signed-in user's email)
    pub creator: String,
    #[serde(rename = "_id")]
    pub id: String,
}

/// Body of `allowUsertoSession` and `denyUsertoSession`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAccessRequest {
    pub creator: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
}

//! Remote data client error types

use thiserror::Error;

/// Failure of a single backend call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Connection, timeout or body read failure
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// Non-2xx response; `message` comes from the backend when it sent one
    #[error("API error from {endpoint} ({status}): {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// 2xx response whose body is not the expected JSON
    #[error("Invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ClientError {
    pub fn network(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    /// Endpoint path the failed call targeted
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Network { endpoint, .. }
            | Self::Api { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

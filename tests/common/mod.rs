//! Shared test infrastructure for sessionctl integration tests.
//!
//! Serves an `InMemorySessionApi` over HTTP on a loopback port so the real
//! `HttpSessionClient` can be exercised end to end.
//!
//! ```ignore
//! mod common;
//! let backend = common::MockBackend::start(sessions).await;
//! ```

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use sessionctl::client::memory::InMemorySessionApi;
use sessionctl::client::{paths, ClientError, HttpSessionClient, SessionApi};
use sessionctl::config::ServerConfig;
use sessionctl::models::{
    ActivateSessionRequest, AllowedUser, Session, SessionAccessRequest, SessionIdRequest, SessionLookup,
};

#[derive(Clone)]
struct BackendState {
    api: Arc<InMemorySessionApi>,
    content_types: Arc<Mutex<Vec<String>>>,
}

/// Running mock backend
pub struct MockBackend {
    pub base_url: String,
    pub api: Arc<InMemorySessionApi>,
    content_types: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub async fn start(sessions: Vec<Session>) -> Self {
        let api = Arc::new(InMemorySessionApi::with_sessions(sessions));
        let content_types = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            api: api.clone(),
            content_types: content_types.clone(),
        };

        let app = Router::new()
            .route(paths::GET_SESSION, post(get_session))
            .route(paths::ACTIVATE_SESSION, post(activate_session))
            .route(paths::KILL_SESSION, post(kill_session))
            .route(paths::ALLOW_USER, post(allow_user))
            .route(paths::DENY_USER, post(deny_user))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            api,
            content_types,
        }
    }

    pub fn client(&self) -> HttpSessionClient {
        HttpSessionClient::new(&ServerConfig {
            base_url: self.base_url.clone(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    /// Content-Type header of every request received, in order
    pub fn content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }
}

pub fn session(id: &str, active: bool, users: &[&str]) -> Session {
    Session {
        id: id.to_string(),
        name: "Lab".to_string(),
        description: "Robot arm".to_string(),
        is_active: active,
        creator: "owner@x.com".to_string(),
        users: users.iter().map(|u| AllowedUser::new(*u)).collect(),
    }
}

fn record(state: &BackendState, headers: &HeaderMap) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.content_types.lock().unwrap().push(content_type);
}

fn respond(result: Result<Value, ClientError>) -> Response {
    match result {
        Ok(ack) => Json(ack).into_response(),
        Err(ClientError::Api { status, message, .. }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "message": message }))).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn get_session(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdRequest>,
) -> Response {
    record(&state, &headers);
    // The backend answers a miss with an empty array.
    let result = state.api.get_session(&body.id).await.map(|lookup| match lookup {
        SessionLookup::Found(session) => serde_json::to_value(session).unwrap(),
        SessionLookup::Missing => json!([]),
    });
    respond(result)
}

async fn activate_session(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<ActivateSessionRequest>,
) -> Response {
    record(&state, &headers);
    respond(state.api.activate_session(&body.id, &body.creator).await)
}

async fn kill_session(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdRequest>,
) -> Response {
    record(&state, &headers);
    respond(state.api.kill_session(&body.id).await)
}

async fn allow_user(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<SessionAccessRequest>,
) -> Response {
    record(&state, &headers);
    respond(state.api.allow_user(&body.id, &body.creator, &body.email).await)
}

async fn deny_user(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<SessionAccessRequest>,
) -> Response {
    record(&state, &headers);
    respond(state.api.deny_user(&body.id, &body.creator, &body.email).await)
}

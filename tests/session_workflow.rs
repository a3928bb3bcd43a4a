//! End-to-end session detail workflows over HTTP.
//!
//! Each test starts a mock backend on a loopback port and drives the
//! detail view-model through the real HTTP client and cache.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{session, MockBackend};
use sessionctl::cache::{create_cache, SessionCache};
use sessionctl::client::{paths, ClientError};
use sessionctl::config::CacheConfig;
use sessionctl::models::SessionLookup;
use sessionctl::services::{
    AllowUserForm, CommandError, CommandKind, InFlightRegistry, NotificationLevel, SessionDetail, EMAIL_REQUIRED,
};
use sessionctl::theme::render_session_detail;

fn cache_for(backend: &MockBackend) -> Arc<SessionCache> {
    create_cache(Arc::new(backend.client()), &CacheConfig::default())
}

fn detail(cache: Arc<SessionCache>, registry: Arc<InFlightRegistry>) -> SessionDetail {
    SessionDetail::new("s1", Some("me@x.com".to_string()), cache, registry)
}

#[tokio::test]
async fn activate_inactive_session() {
    let backend = MockBackend::start(vec![session("s1", false, &[])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));

    let loaded = view.load().await;
    assert!(!loaded.session().unwrap().is_active);

    let outcome = view.activate().await.unwrap();
    assert_eq!(outcome.command, CommandKind::Activate);
    assert!(outcome.revalidated);
    assert!(outcome.snapshot.session().unwrap().is_active);
    assert!(view.snapshot().await.session().unwrap().is_active);

    let calls = backend.api.calls().await;
    let endpoints: Vec<_> = calls.iter().map(|c| c.endpoint).collect();
    assert_eq!(endpoints, vec![paths::GET_SESSION, paths::ACTIVATE_SESSION, paths::GET_SESSION]);
    assert_eq!(calls[1].body["creator"], "me@x.com");
    assert_eq!(calls[1].body["_id"], "s1");
    assert!(!view.is_handling());

    let html = render_session_detail(&view.view().await).unwrap();
    assert!(html.contains(r#"data-action="kill""#));
}

#[tokio::test]
async fn deny_last_user_empties_allow_list() {
    let backend = MockBackend::start(vec![session("s1", true, &["a@x.com"])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));
    view.load().await;

    let outcome = view.deny_user("a@x.com").await.unwrap();
    assert!(outcome.snapshot.session().unwrap().users.is_empty());

    let deny = backend
        .api
        .calls()
        .await
        .into_iter()
        .find(|c| c.endpoint == paths::DENY_USER)
        .unwrap();
    assert_eq!(deny.body["creator"], "owner@x.com");
    assert_eq!(deny.body["email"], "a@x.com");

    let html = render_session_detail(&view.view().await).unwrap();
    assert!(html.contains("No Users Available"));
}

#[tokio::test]
async fn deny_removes_exactly_one_duplicate() {
    let backend = MockBackend::start(vec![session("s1", true, &["a@x.com", "b@x.com", "a@x.com"])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));
    view.load().await;

    let outcome = view.deny_user("a@x.com").await.unwrap();
    assert_eq!(outcome.snapshot.session().unwrap().user_emails(), vec!["b@x.com", "a@x.com"]);
}

#[tokio::test]
async fn allow_user_closes_dialog_and_is_idempotent() {
    let backend = MockBackend::start(vec![session("s1", false, &[])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));
    view.load().await;

    view.open_allow_dialog();
    view.allow_user(AllowUserForm::new("  b@x.com ")).await.unwrap();
    assert!(!view.dialog_open());

    view.open_allow_dialog();
    let outcome = view.allow_user(AllowUserForm::new("b@x.com")).await.unwrap();

    let users = &outcome.snapshot.session().unwrap().users;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "b@x.com");
    assert_eq!(backend.api.call_count(paths::ALLOW_USER).await, 2);
}

#[tokio::test]
async fn empty_email_sends_nothing() {
    let backend = MockBackend::start(vec![session("s1", false, &[])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));
    view.load().await;
    view.open_allow_dialog();

    let err = view.allow_user(AllowUserForm::new("   ")).await.unwrap_err();
    match err {
        CommandError::Validation(e) => assert_eq!(e.message, EMAIL_REQUIRED),
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(backend.api.call_count(paths::ALLOW_USER).await, 0);
    assert!(view.dialog_open());
    let html = render_session_detail(&view.view().await).unwrap();
    assert!(html.contains(EMAIL_REQUIRED));
}

#[tokio::test]
async fn backend_error_message_reaches_the_user() {
    let backend = MockBackend::start(vec![session("s1", true, &[])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));
    view.load().await;
    view.take_notifications();

    backend.api.fail_endpoint(paths::KILL_SESSION, 500, "engine offline").await;
    let err = view.kill().await.unwrap_err();

    match err {
        CommandError::Client(ClientError::Api { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "engine offline");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // No revalidation after a failed command; the snapshot is untouched.
    assert_eq!(backend.api.call_count(paths::GET_SESSION).await, 1);
    assert!(view.snapshot().await.session().unwrap().is_active);
    assert!(!view.is_handling());

    let notes = view.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert!(notes[0].message.contains("engine offline"));
}

#[tokio::test]
async fn missing_session_is_not_found() {
    let backend = MockBackend::start(vec![]).await;
    let client = backend.client();

    let lookup = sessionctl::client::SessionApi::get_session(&client, "nope").await.unwrap();
    assert_eq!(lookup, SessionLookup::Missing);

    let view = SessionDetail::new(
        "nope",
        Some("me@x.com".to_string()),
        cache_for(&backend),
        Arc::new(InFlightRegistry::new()),
    );
    let snapshot = view.load().await;
    assert!(!snapshot.is_error());
    assert!(snapshot.session().is_none());

    let rendered = view.view().await;
    assert!(rendered.not_found);
    assert!(render_session_detail(&rendered).unwrap().contains("Session not found"));
}

#[tokio::test]
async fn commands_without_loaded_session_are_rejected() {
    let backend = MockBackend::start(vec![session("s1", false, &["a@x.com"])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));

    let err = view.deny_user("a@x.com").await.unwrap_err();
    assert!(matches!(err, CommandError::NotLoaded { .. }));
    assert!(backend.api.calls().await.is_empty());
}

#[tokio::test]
async fn overlapping_commands_on_one_session_are_refused() {
    let backend = MockBackend::start(vec![session("s1", false, &[])]).await;
    let cache = cache_for(&backend);
    let registry = Arc::new(InFlightRegistry::new());
    let first = detail(cache.clone(), registry.clone());
    let second = detail(cache, registry);
    first.load().await;

    backend.api.set_latency(Duration::from_millis(100)).await;
    let (a, b) = tokio::join!(first.kill(), second.kill());

    assert!(a.is_ok());
    assert!(matches!(b, Err(CommandError::Busy { .. })));
    assert_eq!(backend.api.call_count(paths::KILL_SESSION).await, 1);
    assert!(!first.is_handling());
    assert!(!second.is_handling());
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    let backend = MockBackend::start(vec![session("s1", false, &[])]).await;
    backend.api.set_latency(Duration::from_millis(50)).await;
    let cache = cache_for(&backend);
    let registry = Arc::new(InFlightRegistry::new());
    let first = detail(cache.clone(), registry.clone());
    let second = detail(cache, registry);

    let (a, b) = tokio::join!(first.load(), second.load());

    assert_eq!(a.data, b.data);
    assert_eq!(backend.api.call_count(paths::GET_SESSION).await, 1);
}

#[tokio::test]
async fn every_request_is_json() {
    let backend = MockBackend::start(vec![session("s1", false, &[])]).await;
    let view = detail(cache_for(&backend), Arc::new(InFlightRegistry::new()));
    view.load().await;
    view.activate().await.unwrap();
    view.kill().await.unwrap();

    let content_types = backend.content_types();
    assert_eq!(content_types.len(), 5);
    assert!(content_types.iter().all(|c| c.starts_with("application/json")));
}

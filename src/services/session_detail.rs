//! Session detail view-model
//!
//! Holds the UI state of one session's detail view and drives its commands:
//! activate, kill, allow user and deny user. Every command follows the same
//! sequence:
//!
//! 1. claim the session's in-flight slot (fail fast with `Busy`)
//! 2. issue the backend command
//! 3. revalidate the cached snapshot
//! 4. release the slot
//!
//! The client never edits the snapshot itself; state changes are only
//! observed through revalidation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::cache::{CacheKey, SessionCache, Snapshot};
use crate::client::ClientError;
use crate::models::Session;
use crate::services::form::{AllowUserForm, ValidationError};
use crate::services::in_flight::InFlightRegistry;

/// Command issued from the detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Activate,
    Kill,
    Allow,
    Deny,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Activate => write!(f, "activate"),
            Self::Kill => write!(f, "kill"),
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

/// Session detail command errors
#[derive(Debug, Error)]
pub enum CommandError {
    /// Form input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Backend or transport failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Another command for the session is still running
    #[error("A command for session {session_id} is already in progress")]
    Busy { session_id: String },

    /// Allow/deny need the creator from a loaded snapshot
    #[error("Session {session_id} is not loaded")]
    NotLoaded { session_id: String },

    /// Activation needs the signed-in user's identity
    #[error("No signed-in user to activate session {session_id}")]
    Unauthenticated { session_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Result of a completed command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub command: CommandKind,
    /// Backend acknowledgement, as sent
    pub ack: Value,
    /// Snapshot after the command; stale when `revalidated` is false
    pub snapshot: Snapshot,
    pub revalidated: bool,
}

/// Everything the detail view renders
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetailView {
    pub session_id: String,
    pub session: Option<Session>,
    pub not_found: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_handling: bool,
    pub dialog_open: bool,
    pub form: AllowUserForm,
    pub form_error: Option<ValidationError>,
}

#[derive(Debug, Default)]
struct UiState {
    dialog_open: bool,
    form: AllowUserForm,
    form_error: Option<ValidationError>,
    notifications: VecDeque<Notification>,
}

enum Command<'a> {
    Activate { requester: &'a str },
    Kill,
    Allow { creator: &'a str, email: &'a str },
    Deny { creator: &'a str, email: &'a str },
}

impl Command<'_> {
    fn kind(&self) -> CommandKind {
        match self {
            Self::Activate { .. } => CommandKind::Activate,
            Self::Kill => CommandKind::Kill,
            Self::Allow { .. } => CommandKind::Allow,
            Self::Deny { .. } => CommandKind::Deny,
        }
    }
}

/// Pending notifications kept per view; the oldest are dropped beyond this
pub const MAX_NOTIFICATIONS: usize = 32;

/// View-model of one session's detail page
pub struct SessionDetail {
    key: CacheKey,
    current_user: Option<String>,
    cache: Arc<SessionCache>,
    in_flight: Arc<InFlightRegistry>,
    ui: Mutex<UiState>,
}

impl SessionDetail {
    /// Create the view-model for `session_id`
    ///
    /// `in_flight` is shared between every view of the same backend so two
    /// views of one session cannot issue overlapping commands.
    pub fn new(
        session_id: impl Into<String>,
        current_user: Option<String>,
        cache: Arc<SessionCache>,
        in_flight: Arc<InFlightRegistry>,
    ) -> Self {
        Self {
            key: CacheKey::session(session_id),
            current_user,
            cache,
            in_flight,
            ui: Mutex::new(UiState::default()),
        }
    }

    pub fn session_id(&self) -> &str {
        self.key.session_id()
    }

    fn ui(&self) -> MutexGuard<'_, UiState> {
        self.ui.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read the session through the cache, fetching if needed
    pub async fn load(&self) -> Snapshot {
        self.cache.read(&self.key).await
    }

    /// Current snapshot without fetching
    pub async fn snapshot(&self) -> Snapshot {
        self.cache.peek(&self.key).await
    }

    /// True while a command for this session is in flight
    pub fn is_handling(&self) -> bool {
        self.in_flight.is_in_flight(self.session_id())
    }

    pub fn dialog_open(&self) -> bool {
        self.ui().dialog_open
    }

    pub fn open_allow_dialog(&self) {
        let mut ui = self.ui();
        ui.dialog_open = true;
        ui.form_error = None;
    }

    pub fn close_dialog(&self) {
        let mut ui = self.ui();
        ui.dialog_open = false;
        ui.form = AllowUserForm::default();
        ui.form_error = None;
    }

    /// Drain pending notifications, oldest first
    ///
    /// At most `MAX_NOTIFICATIONS` are held between drains.
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.ui().notifications.drain(..).collect()
    }

    /// State for rendering
    pub async fn view(&self) -> SessionDetailView {
        let snapshot = self.snapshot().await;
        let ui = self.ui();
        SessionDetailView {
            session_id: self.session_id().to_string(),
            session: snapshot.session().cloned(),
            not_found: snapshot.data.is_some() && snapshot.session().is_none(),
            is_loading: snapshot.is_loading,
            error: snapshot.error.clone(),
            is_handling: self.in_flight.is_in_flight(self.session_id()),
            dialog_open: ui.dialog_open,
            form: ui.form.clone(),
            form_error: ui.form_error.clone(),
        }
    }

    /// Activate the session as the signed-in user
    pub async fn activate(&self) -> Result<CommandOutcome, CommandError> {
        let requester = self.current_user.as_deref().ok_or_else(|| {
            let err = CommandError::Unauthenticated {
                session_id: self.session_id().to_string(),
            };
            self.notify(NotificationLevel::Error, err.to_string());
            err
        })?;
        self.run(Command::Activate { requester }).await
    }

    /// Stop the session
    pub async fn kill(&self) -> Result<CommandOutcome, CommandError> {
        self.run(Command::Kill).await
    }

    /// Submit the "Allow User" dialog
    ///
    /// An empty email is rejected inline without any request and the dialog
    /// stays open. The dialog closes once the command succeeds.
    pub async fn allow_user(&self, form: AllowUserForm) -> Result<CommandOutcome, CommandError> {
        let email = match form.submit_email().map(str::to_string) {
            Ok(email) => email,
            Err(e) => {
                let mut ui = self.ui();
                ui.form = form;
                ui.form_error = Some(e.clone());
                return Err(e.into());
            }
        };
        let creator = self.loaded_creator().await?;

        let outcome = self
            .run(Command::Allow {
                creator: &creator,
                email: &email,
            })
            .await?;
        self.close_dialog();
        Ok(outcome)
    }

    /// Remove `email` from the allow-list
    pub async fn deny_user(&self, email: &str) -> Result<CommandOutcome, CommandError> {
        let creator = self.loaded_creator().await?;

        let outcome = self
            .run(Command::Deny {
                creator: &creator,
                email,
            })
            .await?;
        self.close_dialog();
        Ok(outcome)
    }

    async fn loaded_creator(&self) -> Result<String, CommandError> {
        match self.snapshot().await.session() {
            Some(session) => Ok(session.creator.clone()),
            None => {
                let err = CommandError::NotLoaded {
                    session_id: self.session_id().to_string(),
                };
                self.notify(NotificationLevel::Error, err.to_string());
                Err(err)
            }
        }
    }

    async fn run(&self, command: Command<'_>) -> Result<CommandOutcome, CommandError> {
        let kind = command.kind();
        let session_id = self.session_id();

        let _slot = self.in_flight.try_acquire(session_id).ok_or_else(|| {
            tracing::debug!("Rejected {} for session {}: busy", kind, session_id);
            let err = CommandError::Busy {
                session_id: session_id.to_string(),
            };
            self.notify(NotificationLevel::Warning, err.to_string());
            err
        })?;

        tracing::info!("Sending {} for session {}", kind, session_id);
        let api = self.cache.api();
        let result = match command {
            Command::Activate { requester } => api.activate_session(session_id, requester).await,
            Command::Kill => api.kill_session(session_id).await,
            Command::Allow { creator, email } => api.allow_user(session_id, creator, email).await,
            Command::Deny { creator, email } => api.deny_user(session_id, creator, email).await,
        };

        let ack = match result {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!("{} for session {} failed: {}", kind, session_id, e);
                self.notify(NotificationLevel::Error, format!("Failed to {} session: {}", kind, e));
                return Err(e.into());
            }
        };

        let (snapshot, revalidated) = match self.cache.revalidate(&self.key).await {
            Ok(snapshot) => (snapshot, true),
            Err(e) => {
                self.notify(
                    NotificationLevel::Warning,
                    format!("{} succeeded but refreshing the session failed: {}", kind, e),
                );
                (self.cache.peek(&self.key).await, false)
            }
        };

        self.notify(NotificationLevel::Info, format!("{} completed for session {}", kind, session_id));
        Ok(CommandOutcome {
            command: kind,
            ack,
            snapshot,
            revalidated,
        })
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let mut ui = self.ui();
        if ui.notifications.len() == MAX_NOTIFICATIONS {
            ui.notifications.pop_front();
        }
        ui.notifications.push_back(Notification::new(level, message));
    }
}

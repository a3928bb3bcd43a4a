//! Services layer - workflow logic
//!
//! This module contains the client-side workflows of sessionctl:
//! - Allow-user form validation
//! - The per-session in-flight gate
//! - The session detail view-model that orchestrates backend commands

pub mod form;
pub mod in_flight;
pub mod session_detail;

pub use form::{AllowUserForm, ValidationError, EMAIL_REQUIRED};
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use session_detail::{
    CommandError, CommandKind, CommandOutcome, Notification, NotificationLevel, SessionDetail,
    SessionDetailView,
};

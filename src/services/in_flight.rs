//! Per-session in-flight gate
//!
//! Guarantees at most one outstanding command per session. The gate is taken
//! synchronously at the command entry point and released when the returned
//! guard is dropped, on every exit path.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InFlightRegistry {
    sessions: Mutex<HashSet<String>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim `session_id`, or `None` if a command for it is already running
    pub fn try_acquire(self: &Arc<Self>, session_id: &str) -> Option<InFlightGuard> {
        if !self.lock().insert(session_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            session_id: session_id.to_string(),
        })
    }

    pub fn is_in_flight(&self, session_id: &str) -> bool {
        self.lock().contains(session_id)
    }
}

/// Releases the session's slot when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    session_id: String,
}

impl InFlightGuard {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let registry = Arc::new(InFlightRegistry::new());

        let guard = registry.try_acquire("s1").unwrap();
        assert!(registry.is_in_flight("s1"));
        assert!(registry.try_acquire("s1").is_none());

        drop(guard);
        assert!(!registry.is_in_flight("s1"));
        assert!(registry.try_acquire("s1").is_some());
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = Arc::new(InFlightRegistry::new());

        let _a = registry.try_acquire("s1").unwrap();
        let b = registry.try_acquire("s2").unwrap();
        assert_eq!(b.session_id(), "s2");
    }
}

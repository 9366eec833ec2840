//! Injectable session store shared across pages.
//!
//! Kept behind a trait so the orchestration never touches a module-level
//! singleton; the concrete store (and how securely it persists tokens) is the
//! embedding application's concern.

use crate::auth::types::TokenPair;
use std::sync::Mutex;

/// Minimal profile surface the orchestration needs after login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub identifier: String,
}

pub trait SessionStore: Send + Sync {
    /// Called once on boot before any flow runs.
    fn initialize(&self);
    /// Accept a fresh token pair after successful login/registration.
    fn authenticate(&self, identifier: &str, tokens: TokenPair);
    fn current_profile(&self) -> Option<Profile>;
    /// Cleared on logout.
    fn clear(&self);
}

/// In-memory session store for tests and the CLI.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<(Profile, TokenPair)>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn initialize(&self) {}

    fn authenticate(&self, identifier: &str, tokens: TokenPair) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some((
                Profile {
                    identifier: identifier.to_string(),
                },
                tokens,
            ));
        }
    }

    fn current_profile(&self) -> Option<Profile> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.as_ref().map(|(profile, _)| profile.clone()))
    }

    fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = None;
        }
    }
}

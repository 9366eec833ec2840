//! Remembered-identifier storage.
//!
//! Written only when the user opts in at a successful login, keyed
//! independently of session tokens. Only the raw trimmed identifier is ever
//! stored, never the password.

use std::sync::Mutex;

pub trait IdentifierStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, identifier: &str);
    fn remove(&self);
}

/// In-memory store for tests and single-process targets.
#[derive(Debug, Default)]
pub struct MemoryIdentifierStore {
    inner: Mutex<Option<String>>,
}

impl MemoryIdentifierStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentifierStore for MemoryIdentifierStore {
    fn load(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|inner| inner.clone())
    }

    fn save(&self, identifier: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some(identifier.trim().to_string());
        }
    }

    fn remove(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = None;
        }
    }
}

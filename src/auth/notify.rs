//! Notification surface for flow outcomes.

use super::types::FeedbackTone;
use tracing::{error, info, warn};

/// Sink for user-visible notifications. The UI shell implements this; the
/// default logs instead of rendering, which is enough for local dev and
/// tests.
pub trait Notifier: Send + Sync {
    fn notify(&self, tone: FeedbackTone, message: &str);
}

/// Dev notifier that logs the notification and drops it.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, tone: FeedbackTone, message: &str) {
        match tone {
            FeedbackTone::Success | FeedbackTone::Info => info!(%message, "notification"),
            FeedbackTone::Error => error!(%message, "notification"),
        }
    }
}

/// Test notifier that records everything it is handed.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: std::sync::Mutex<Vec<(FeedbackTone, String)>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recorded(&self) -> Vec<(FeedbackTone, String)> {
        match self.notifications.lock() {
            Ok(notifications) => notifications.clone(),
            Err(poisoned) => {
                warn!("notification log poisoned");
                poisoned.into_inner().clone()
            }
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, tone: FeedbackTone, message: &str) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push((tone, message.to_string()));
        }
    }
}

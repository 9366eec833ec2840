//! Mount-scoped confirmation of an emailed verification token.
//!
//! The token is discovered once from the page's addressable state (a query
//! parameter). If present, the confirm endpoint is called exactly once per
//! mount, fire-and-forget relative to the rest of the UI but cancellable:
//! teardown aborts the task so a late result cannot mutate any state.

use super::api::AuthApi;
use super::error::ApiError;
use super::login::LoginController;
use super::notify::Notifier;
use super::types::FeedbackTone;
use crate::signal::{next_context_id, CompletionChannel};
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct TokenConfirmation {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TokenConfirmation {
    /// Start confirming `token`, if one was discovered. No token is a no-op.
    ///
    /// On success the local completion effect fires first, then the
    /// cross-tab signal is written, so the confirming tab settles before its
    /// siblings are woken.
    #[must_use]
    pub fn mount(
        api: Arc<dyn AuthApi>,
        controller: Weak<LoginController>,
        channel: Arc<dyn CompletionChannel>,
        notifier: Arc<dyn Notifier>,
        token: Option<String>,
    ) -> Self {
        let token = token.map(|token| token.trim().to_string()).filter(|token| !token.is_empty());
        let Some(token) = token else {
            return Self {
                task: Mutex::new(None),
            };
        };

        let handle = tokio::spawn(async move {
            match api.confirm_email_verification(&token).await {
                Ok(()) => {
                    debug!("verification token confirmed");
                    // The write carries this tab's context id so its own
                    // listener skips it; the effect already ran here.
                    let writer = match controller.upgrade() {
                        Some(controller) => {
                            controller.on_verification_completed().await;
                            controller.context_id()
                        }
                        None => next_context_id(),
                    };
                    channel.write(writer);
                }
                Err(ApiError::RateLimited {
                    retry_after_seconds, ..
                }) => {
                    let mut message = "Too many attempts".to_string();
                    if let Some(seconds) = retry_after_seconds {
                        message.push_str(&format!(", retry in {seconds}s"));
                    }
                    notifier.notify(FeedbackTone::Error, &message);
                }
                Err(err) => {
                    warn!(%err, "verification token rejected");
                    notifier.notify(FeedbackTone::Error, &err.user_message());
                }
            }
        });

        Self {
            task: Mutex::new(Some(handle)),
        }
    }

    /// Teardown: discard the in-flight confirmation, result and all.
    pub fn shutdown(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }

    /// Await settlement; used by flows that want the result before moving on.
    pub async fn settled(&self) {
        let handle = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for TokenConfirmation {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

/// Pull a verification token out of the current page URL, e.g.
/// `https://app.promptdeck.dev/login?verify_token=abc`.
#[must_use]
pub fn token_from_url(page_url: &str) -> Option<String> {
    let url = url::Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "verify_token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::super::notify::RecordingNotifier;
    use super::super::test_support::MockApi;
    use super::super::verification::VerificationHandshake;
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::signal::MemoryChannel;
    use crate::store::MemoryIdentifierStore;
    use tokio::time::Duration;

    fn controller(
        api: &Arc<MockApi>,
        channel: &Arc<MemoryChannel>,
        notifier: &Arc<RecordingNotifier>,
    ) -> Arc<LoginController> {
        LoginController::new(
            api.clone(),
            Arc::new(MemorySessionStore::new()),
            channel.clone(),
            notifier.clone(),
            Arc::new(MemoryIdentifierStore::new()),
            Arc::new(VerificationHandshake::new(api.clone())),
        )
    }

    #[tokio::test]
    async fn no_token_is_a_noop() {
        let api = Arc::new(MockApi::new());
        let channel = Arc::new(MemoryChannel::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller(&api, &channel, &notifier);

        let confirmation = TokenConfirmation::mount(
            api.clone(),
            Arc::downgrade(&controller),
            channel.clone(),
            notifier,
            None,
        );
        confirmation.settled().await;
        assert_eq!(api.confirm_calls(), 0);
        assert!(!channel.take());
    }

    #[tokio::test]
    async fn success_runs_local_effect_then_broadcasts() {
        let api = Arc::new(MockApi::new());
        let channel = Arc::new(MemoryChannel::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller(&api, &channel, &notifier);

        let confirmation = TokenConfirmation::mount(
            api.clone(),
            Arc::downgrade(&controller),
            channel.clone(),
            notifier.clone(),
            Some("tok-1".to_string()),
        );
        confirmation.settled().await;

        assert_eq!(api.confirm_calls(), 1);
        assert!(channel.take());
        assert!(notifier
            .recorded()
            .iter()
            .any(|(tone, _)| *tone == FeedbackTone::Success));
    }

    #[tokio::test]
    async fn failure_surfaces_notification_without_retry() {
        let api = Arc::new(MockApi::new());
        api.queue_confirm(Err(ApiError::Unknown("expired link".to_string())));
        let channel = Arc::new(MemoryChannel::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller(&api, &channel, &notifier);

        let confirmation = TokenConfirmation::mount(
            api.clone(),
            Arc::downgrade(&controller),
            channel.clone(),
            notifier.clone(),
            Some("tok-1".to_string()),
        );
        confirmation.settled().await;

        assert_eq!(api.confirm_calls(), 1);
        assert!(!channel.take());
        assert!(notifier
            .recorded()
            .iter()
            .any(|(tone, _)| *tone == FeedbackTone::Error));
    }

    #[tokio::test]
    async fn confirming_tab_does_not_reprocess_its_own_broadcast() {
        let api = Arc::new(MockApi::new());
        let channel = Arc::new(MemoryChannel::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller(&api, &channel, &notifier);
        controller.start().await;

        let confirmation = TokenConfirmation::mount(
            api.clone(),
            Arc::downgrade(&controller),
            channel.clone(),
            notifier.clone(),
            Some("tok-1".to_string()),
        );
        confirmation.settled().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // One completion effect total: the local one. The listener skipped
        // the broadcast this tab wrote itself.
        let successes = notifier
            .recorded()
            .iter()
            .filter(|(tone, _)| *tone == FeedbackTone::Success)
            .count();
        assert_eq!(successes, 1);
        // The slot is still armed for a context that was not the writer.
        assert!(channel.take());
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_before_settlement_discards_the_result() {
        let api = Arc::new(MockApi::new());
        api.delay_confirm(Duration::from_millis(500));
        let channel = Arc::new(MemoryChannel::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller(&api, &channel, &notifier);

        let confirmation = TokenConfirmation::mount(
            api.clone(),
            Arc::downgrade(&controller),
            channel.clone(),
            notifier.clone(),
            Some("tok-1".to_string()),
        );
        // Let the task start its network call, then tear down mid-flight.
        tokio::task::yield_now().await;
        confirmation.shutdown();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!channel.take());
        assert!(notifier.recorded().is_empty());
    }

    #[test]
    fn token_discovery_from_page_url() {
        assert_eq!(
            token_from_url("https://app.promptdeck.dev/login?verify_token=abc"),
            Some("abc".to_string())
        );
        assert_eq!(
            token_from_url("https://app.promptdeck.dev/login?verify_token="),
            None
        );
        assert_eq!(token_from_url("https://app.promptdeck.dev/login"), None);
        assert_eq!(token_from_url("not a url"), None);
    }
}

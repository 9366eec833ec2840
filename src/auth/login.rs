//! Credential submission and the shared verification-completion effect.

use super::api::AuthApi;
use super::error::ApiError;
use super::notify::Notifier;
use super::types::{Credentials, FeedbackTone, FieldErrors};
use super::validate::validate_login;
use super::verification::VerificationHandshake;
use crate::session::SessionStore;
use crate::signal::{next_context_id, CompletionChannel, ContextId};
use crate::store::IdentifierStore;
use secrecy::ExposeSecret;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a submit attempt, after client-side mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    LoggedIn,
    /// Client-side validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// The account's email is unverified. Not a generic error: the caller
    /// switches to the verification UI mode instead of showing a banner.
    VerificationRequired,
    Failed(String),
    /// A submission is already in flight; this attempt was a no-op.
    AlreadyPending,
}

#[derive(Debug)]
struct LoginState {
    submitting: bool,
    needs_verification: bool,
    should_retry_login: bool,
    pending_replay: Option<(Credentials, bool)>,
    form_error: Option<String>,
}

impl LoginState {
    fn new() -> Self {
        Self {
            submitting: false,
            needs_verification: false,
            should_retry_login: false,
            pending_replay: None,
            form_error: None,
        }
    }
}

/// Orchestrates login submission, the unverified-email handoff, and the
/// cross-tab completion broadcast. All collaborators are injected.
pub struct LoginController {
    api: Arc<dyn AuthApi>,
    session: Arc<dyn SessionStore>,
    channel: Arc<dyn CompletionChannel>,
    notifier: Arc<dyn Notifier>,
    remembered: Arc<dyn IdentifierStore>,
    handshake: Arc<VerificationHandshake>,
    context: ContextId,
    state: Mutex<LoginState>,
    listener: Mutex<Option<JoinHandle<()>>>,
    weak: Weak<Self>,
}

impl LoginController {
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        session: Arc<dyn SessionStore>,
        channel: Arc<dyn CompletionChannel>,
        notifier: Arc<dyn Notifier>,
        remembered: Arc<dyn IdentifierStore>,
        handshake: Arc<VerificationHandshake>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            api,
            session,
            channel,
            notifier,
            remembered,
            handshake,
            context: next_context_id(),
            state: Mutex::new(LoginState::new()),
            listener: Mutex::new(None),
            weak: weak.clone(),
        })
    }

    /// Consume a completion left behind before this context existed, then
    /// listen for live completions from sibling contexts.
    pub async fn start(&self) {
        if self.channel.take() {
            debug!("consumed completion signal found at mount");
            self.on_verification_completed().await;
        }

        let mut receiver = self.channel.subscribe();
        let weak = self.weak.clone();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(writer) => {
                        let Some(controller) = weak.upgrade() else {
                            break;
                        };
                        // This context's own writes already ran the effect
                        // locally; the slot stays for contexts that did not.
                        if writer == controller.context {
                            debug!(writer, "ignoring own completion broadcast");
                            continue;
                        }
                        // The notification itself is the completion event;
                        // draining the slot keeps the mount path of other
                        // contexts from double-firing.
                        controller.channel.take();
                        controller.on_verification_completed().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "completion notifications lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(previous) = listener.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Submit credentials. At most one submission is in flight; a second
    /// call while one is pending is a no-op, not an error and not a queue.
    pub async fn submit(&self, credentials: &Credentials, remember: bool) -> SubmitOutcome {
        let errors = validate_login(
            &credentials.identifier,
            credentials.password.expose_secret(),
        );
        if !errors.is_empty() {
            return SubmitOutcome::Invalid(errors);
        }

        {
            let Ok(mut state) = self.state.lock() else {
                return SubmitOutcome::Failed("Internal state unavailable".to_string());
            };
            if state.submitting {
                debug!("submit suppressed, one already in flight");
                return SubmitOutcome::AlreadyPending;
            }
            state.submitting = true;
            state.form_error = None;
        }

        let identifier = credentials.identifier.trim().to_string();
        let result = self
            .api
            .login(&identifier, credentials.password.expose_secret())
            .await;

        match result {
            Ok(tokens) => {
                if let Ok(mut state) = self.state.lock() {
                    state.submitting = false;
                    state.needs_verification = false;
                    state.should_retry_login = false;
                    state.pending_replay = None;
                    state.form_error = None;
                }
                self.handshake.clear_feedback();
                self.session.authenticate(&identifier, tokens);
                if remember {
                    self.remembered.save(&identifier);
                } else {
                    self.remembered.remove();
                }
                info!(%identifier, "login succeeded");
                SubmitOutcome::LoggedIn
            }
            Err(ApiError::EmailNotVerified) => {
                if let Ok(mut state) = self.state.lock() {
                    state.submitting = false;
                    state.needs_verification = true;
                    state.should_retry_login = true;
                    state.pending_replay = Some((credentials.clone(), remember));
                }
                info!(%identifier, "login blocked on unverified email");
                SubmitOutcome::VerificationRequired
            }
            Err(err) => {
                let message = err.user_message();
                if let Ok(mut state) = self.state.lock() {
                    state.submitting = false;
                    state.form_error = Some(message.clone());
                }
                if matches!(err, ApiError::Unknown(_)) {
                    self.notifier.notify(FeedbackTone::Error, &message);
                }
                warn!(%err, "login failed");
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Shared completion effect, idempotent, invoked from the same-tab
    /// confirmation path and from cross-tab notifications alike.
    ///
    /// Clears the verification mode and feedback, surfaces a success
    /// notification, and replays the blocked login exactly once when a retry
    /// intent is set and no submission is currently pending.
    pub async fn on_verification_completed(&self) {
        let replay = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.needs_verification = false;
            let had_intent = state.should_retry_login;
            state.should_retry_login = false;
            if had_intent && !state.submitting {
                state.pending_replay.take()
            } else {
                // A pending submission skips the replay; the intent is
                // dropped either way.
                state.pending_replay = None;
                None
            }
        };
        self.handshake.clear_feedback();
        self.notifier
            .notify(FeedbackTone::Success, "Email verified, you are all set");

        if let Some((credentials, remember)) = replay {
            debug!("replaying login blocked on verification");
            let outcome = self.submit(&credentials, remember).await;
            debug!(?outcome, "login replay settled");
        }
    }

    /// Teardown: stop listening for cross-tab completions.
    pub fn shutdown(&self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }

    /// Identity of this controller in the completion channel; writes tagged
    /// with it are skipped by this controller's listener.
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context
    }

    #[must_use]
    pub fn needs_verification(&self) -> bool {
        self.state
            .lock()
            .map_or(false, |state| state.needs_verification)
    }

    #[must_use]
    pub fn should_retry_login(&self) -> bool {
        self.state
            .lock()
            .map_or(false, |state| state.should_retry_login)
    }

    #[must_use]
    pub fn form_error(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.form_error.clone())
    }

    #[must_use]
    pub fn submitting(&self) -> bool {
        self.state.lock().map_or(false, |state| state.submitting)
    }
}

impl Drop for LoginController {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

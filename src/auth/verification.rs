//! Email-verification handshake: issue and re-issue verification requests.

use super::api::AuthApi;
use super::error::ApiError;
use super::types::{VerificationFeedback, VerificationOutcome};
use super::validate::valid_email;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Drives the resend-verification request and holds the latest feedback.
/// Every outcome replaces the whole feedback value; nothing accumulates.
pub struct VerificationHandshake {
    api: Arc<dyn AuthApi>,
    feedback: Mutex<Option<VerificationFeedback>>,
}

impl VerificationHandshake {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self {
            api,
            feedback: Mutex::new(None),
        }
    }

    /// Request a (re-)issuance for `identifier`.
    ///
    /// The resend-from-login flow requires an email specifically, so anything
    /// without `@` fails fast with a validation message and never touches the
    /// network. Rate-limit hints are surfaced verbatim; nothing is scheduled
    /// automatically on the user's behalf.
    pub async fn request(&self, identifier: &str) -> VerificationFeedback {
        let email = identifier.trim();
        if email.is_empty() || !email.contains('@') || !valid_email(email) {
            let feedback =
                VerificationFeedback::error("Enter the email address of the account first");
            self.replace(feedback.clone());
            return feedback;
        }

        let feedback = match self.api.request_email_verification(email).await {
            Ok(outcome) => Self::feedback_for(&outcome),
            Err(ApiError::RateLimited {
                retry_after_seconds,
                remaining_attempts,
            }) => {
                warn!(?retry_after_seconds, ?remaining_attempts, "verification rate limited");
                let mut message = "Too many verification requests".to_string();
                if let Some(seconds) = retry_after_seconds {
                    message.push_str(&format!(", retry in {seconds}s"));
                }
                VerificationFeedback::error(message)
                    .with_retry_after_seconds(retry_after_seconds)
                    .with_remaining_attempts(remaining_attempts)
            }
            Err(ApiError::Validation(message)) => VerificationFeedback::error(message),
            Err(err) => {
                warn!(%err, "verification request failed");
                VerificationFeedback::error(err.user_message())
            }
        };

        self.replace(feedback.clone());
        feedback
    }

    fn feedback_for(outcome: &VerificationOutcome) -> VerificationFeedback {
        if outcome.issued {
            debug!(token_echoed = outcome.token.is_some(), "verification issued");
            let feedback = match &outcome.token {
                // Dev/testing echo of the issued token; changes the message only.
                Some(token) if !token.is_empty() => VerificationFeedback::success(format!(
                    "Verification email sent (dev token: {token})"
                )),
                _ => VerificationFeedback::success("Verification email sent, check your inbox"),
            };
            feedback.with_remaining_attempts(outcome.remaining_attempts)
        } else {
            VerificationFeedback::info("A verification email is already on its way")
                .with_remaining_attempts(outcome.remaining_attempts)
        }
    }

    fn replace(&self, feedback: VerificationFeedback) {
        if let Ok(mut slot) = self.feedback.lock() {
            *slot = Some(feedback);
        }
    }

    #[must_use]
    pub fn feedback(&self) -> Option<VerificationFeedback> {
        self.feedback.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn clear_feedback(&self) {
        if let Ok(mut slot) = self.feedback.lock() {
            *slot = None;
        }
    }
}

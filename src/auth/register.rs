//! Registration submission with captcha ownership and field-scoped conflicts.

use super::api::AuthApi;
use super::captcha::CaptchaService;
use super::error::ApiError;
use super::notify::Notifier;
use super::types::{FeedbackTone, FieldErrors, RegistrationForm};
use super::validate::validate_registration;
use crate::session::SessionStore;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Registration form input minus the captcha fields, which the controller
/// pulls from its captcha service at submit time so a stale challenge id is
/// never sent after a refresh.
#[derive(Clone, Debug)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    Invalid(FieldErrors),
    Failed(String),
    AlreadyPending,
}

#[derive(Debug, Default)]
struct RegisterState {
    submitting: bool,
    field_errors: FieldErrors,
    form_error: Option<String>,
}

pub struct RegisterController {
    api: Arc<dyn AuthApi>,
    session: Arc<dyn SessionStore>,
    captcha: Arc<CaptchaService>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<RegisterState>,
}

impl RegisterController {
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        session: Arc<dyn SessionStore>,
        captcha: Arc<CaptchaService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            session,
            captcha,
            notifier,
            state: Mutex::new(RegisterState::default()),
        }
    }

    #[must_use]
    pub fn captcha(&self) -> &Arc<CaptchaService> {
        &self.captcha
    }

    /// Submit the registration. Same single-flight discipline as login:
    /// a second call while one is pending is a no-op.
    pub async fn submit(&self, input: &RegistrationInput) -> RegisterOutcome {
        let form = RegistrationForm {
            username: input.username.clone(),
            email: input.email.clone(),
            password: input.password.clone(),
            captcha_id: self
                .captcha
                .challenge()
                .map(|challenge| challenge.id)
                .unwrap_or_default(),
            captcha_code: self.captcha.code(),
            avatar_url: input.avatar_url.clone(),
        };

        let mut errors = validate_registration(&form);
        if form.captcha_id.is_empty() {
            errors.set("captcha_code", "Captcha is still loading, try again");
        }
        if !errors.is_empty() {
            self.store_errors(errors.clone(), None);
            return RegisterOutcome::Invalid(errors);
        }

        {
            let Ok(mut state) = self.state.lock() else {
                return RegisterOutcome::Failed("Internal state unavailable".to_string());
            };
            if state.submitting {
                return RegisterOutcome::AlreadyPending;
            }
            state.submitting = true;
            state.form_error = None;
            state.field_errors = FieldErrors::new();
        }

        let result = self.api.register(&form).await;
        if let Ok(mut state) = self.state.lock() {
            state.submitting = false;
        }

        match result {
            Ok(tokens) => {
                self.session.authenticate(form.email.trim(), tokens);
                info!(email = %form.email.trim(), "registration succeeded");
                // The submitted challenge is spent server-side.
                self.captcha.invalidate();
                RegisterOutcome::Registered
            }
            Err(err @ (ApiError::CaptchaInvalid | ApiError::CaptchaExpired)) => {
                let message = err.user_message();
                self.captcha.set_code_error(&message);
                let mut errors = FieldErrors::new();
                errors.set("captcha_code", message);
                self.store_errors(errors.clone(), None);
                // The rejected challenge is dead; put a usable one in front
                // of the user before they retype anything.
                self.captcha.reload_after_rejection().await;
                RegisterOutcome::Invalid(errors)
            }
            Err(ApiError::Conflict { fields }) => {
                let mut errors = FieldErrors::new();
                for field in &fields {
                    match field.as_str() {
                        "email" => errors.set("email", "This email is already registered"),
                        "username" => errors.set("username", "This username is taken"),
                        other => warn!(field = other, "conflict on unexpected field"),
                    }
                }
                if errors.is_empty() {
                    let message = "Already in use".to_string();
                    self.store_errors(FieldErrors::new(), Some(message.clone()));
                    return RegisterOutcome::Failed(message);
                }
                self.store_errors(errors.clone(), None);
                RegisterOutcome::Invalid(errors)
            }
            Err(ApiError::Validation(message)) => {
                self.store_errors(FieldErrors::new(), Some(message.clone()));
                RegisterOutcome::Failed(message)
            }
            Err(err) => {
                let message = err.user_message();
                self.store_errors(FieldErrors::new(), Some(message.clone()));
                if matches!(err, ApiError::Unknown(_)) {
                    self.notifier.notify(FeedbackTone::Error, &message);
                }
                warn!(%err, "registration failed");
                RegisterOutcome::Failed(message)
            }
        }
    }

    fn store_errors(&self, field_errors: FieldErrors, form_error: Option<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.field_errors = field_errors;
            state.form_error = form_error;
        }
    }

    #[must_use]
    pub fn field_errors(&self) -> FieldErrors {
        self.state
            .lock()
            .map_or_else(|_| FieldErrors::new(), |state| state.field_errors.clone())
    }

    #[must_use]
    pub fn form_error(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.form_error.clone())
    }
}

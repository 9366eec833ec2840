//! Scriptable in-memory transport for controller tests.

use super::api::AuthApi;
use super::error::ApiError;
use super::types::{CaptchaChallenge, RegistrationForm, TokenPair, VerificationOutcome};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::time::Duration;

/// Mock [`AuthApi`] with per-endpoint scripted results and call counters.
/// An empty script yields a plain success for that endpoint.
#[derive(Default)]
pub struct MockApi {
    login_script: Mutex<VecDeque<Result<TokenPair, ApiError>>>,
    register_script: Mutex<VecDeque<Result<TokenPair, ApiError>>>,
    captcha_script: Mutex<VecDeque<Result<CaptchaChallenge, ApiError>>>,
    verification_script: Mutex<VecDeque<Result<VerificationOutcome, ApiError>>>,
    confirm_script: Mutex<VecDeque<Result<(), ApiError>>>,
    login_calls: AtomicU32,
    register_calls: AtomicU32,
    captcha_calls: AtomicU32,
    verification_calls: AtomicU32,
    confirm_calls: AtomicU32,
    login_delay: Mutex<Option<Duration>>,
    register_delay: Mutex<Option<Duration>>,
    confirm_delay: Mutex<Option<Duration>>,
}

fn tokens() -> TokenPair {
    TokenPair {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
    }
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_login(&self, result: Result<TokenPair, ApiError>) {
        if let Ok(mut script) = self.login_script.lock() {
            script.push_back(result);
        }
    }

    pub fn queue_register(&self, result: Result<TokenPair, ApiError>) {
        if let Ok(mut script) = self.register_script.lock() {
            script.push_back(result);
        }
    }

    pub fn queue_captcha(&self, result: Result<CaptchaChallenge, ApiError>) {
        if let Ok(mut script) = self.captcha_script.lock() {
            script.push_back(result);
        }
    }

    pub fn queue_verification(&self, result: Result<VerificationOutcome, ApiError>) {
        if let Ok(mut script) = self.verification_script.lock() {
            script.push_back(result);
        }
    }

    pub fn queue_confirm(&self, result: Result<(), ApiError>) {
        if let Ok(mut script) = self.confirm_script.lock() {
            script.push_back(result);
        }
    }

    /// Make login calls suspend for the given duration before resolving,
    /// to exercise in-flight suppression.
    pub fn delay_login(&self, delay: Duration) {
        if let Ok(mut slot) = self.login_delay.lock() {
            *slot = Some(delay);
        }
    }

    /// Same as [`MockApi::delay_login`] for registration calls.
    pub fn delay_register(&self, delay: Duration) {
        if let Ok(mut slot) = self.register_delay.lock() {
            *slot = Some(delay);
        }
    }

    /// Same as [`MockApi::delay_login`] for confirmation calls.
    pub fn delay_confirm(&self, delay: Duration) {
        if let Ok(mut slot) = self.confirm_delay.lock() {
            *slot = Some(delay);
        }
    }

    pub fn login_calls(&self) -> u32 {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> u32 {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn captcha_calls(&self) -> u32 {
        self.captcha_calls.load(Ordering::SeqCst)
    }

    pub fn verification_calls(&self) -> u32 {
        self.verification_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> u32 {
        self.confirm_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockApi {
    async fn login(&self, _identifier: &str, _password: &str) -> Result<TokenPair, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.login_delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .login_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| Ok(tokens()))
    }

    async fn register(&self, _form: &RegistrationForm) -> Result<TokenPair, ApiError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.register_delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .register_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| Ok(tokens()))
    }

    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, ApiError> {
        let call = self.captcha_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .captcha_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| {
            Ok(CaptchaChallenge {
                id: format!("cap-{call}"),
                image_data: "iVBORw0KGgo=".to_string(),
            })
        })
    }

    async fn request_email_verification(
        &self,
        _email: &str,
    ) -> Result<VerificationOutcome, ApiError> {
        self.verification_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .verification_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| {
            Ok(VerificationOutcome {
                issued: true,
                token: None,
                remaining_attempts: None,
            })
        })
    }

    async fn confirm_email_verification(&self, _token: &str) -> Result<(), ApiError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.confirm_delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .confirm_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| Ok(()))
    }
}

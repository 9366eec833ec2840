//! Captcha acquisition with bounded automatic retry.
//!
//! `idle → loading → {idle-with-challenge, retrying(attempt, total), failed}`.
//! Transient fetch failures retry automatically up to a fixed ceiling with a
//! fixed delay; after that the state is terminal until the user retries
//! manually. The scheduled retry is a per-instance task that teardown and
//! manual reloads cancel deterministically.

use super::api::AuthApi;
use super::types::CaptchaChallenge;
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

const MAX_AUTO_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptchaPhase {
    Idle,
    Loading,
    Retrying { attempt: u32, total: u32 },
    Failed,
}

#[derive(Debug)]
struct CaptchaState {
    phase: CaptchaPhase,
    challenge: Option<CaptchaChallenge>,
    code: String,
    code_error: Option<String>,
    attempts: u32,
}

impl CaptchaState {
    fn new() -> Self {
        Self {
            phase: CaptchaPhase::Idle,
            challenge: None,
            code: String::new(),
            code_error: None,
            attempts: 0,
        }
    }
}

pub struct CaptchaService {
    api: Arc<dyn AuthApi>,
    state: Mutex<CaptchaState>,
    retry_timer: Mutex<Option<JoinHandle<()>>>,
    weak: Weak<Self>,
}

impl CaptchaService {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            api,
            state: Mutex::new(CaptchaState::new()),
            retry_timer: Mutex::new(None),
            weak: weak.clone(),
        })
    }

    /// Fetch a fresh challenge.
    ///
    /// `manual` marks an explicit user refresh: it cancels any scheduled
    /// automatic retry and resets the attempt counter and status before the
    /// fetch. Automatic retries keep the counter so the ceiling holds.
    pub async fn load(&self, manual: bool) {
        if manual {
            self.cancel_scheduled_retry();
        }
        if let Ok(mut state) = self.state.lock() {
            if manual {
                state.attempts = 0;
                state.code_error = None;
            }
            state.phase = CaptchaPhase::Loading;
        }

        match self.api.fetch_captcha().await {
            Ok(challenge) => {
                debug!(challenge_id = %challenge.id, "captcha challenge acquired");
                if let Ok(mut state) = self.state.lock() {
                    state.challenge = Some(challenge);
                    // A new challenge id makes the old transcription meaningless.
                    state.code.clear();
                    state.code_error = None;
                    state.attempts = 0;
                    state.phase = CaptchaPhase::Idle;
                }
            }
            Err(err) => {
                let schedule = {
                    let Ok(mut state) = self.state.lock() else {
                        return;
                    };
                    if state.attempts < MAX_AUTO_RETRIES {
                        state.attempts += 1;
                        state.phase = CaptchaPhase::Retrying {
                            attempt: state.attempts,
                            total: MAX_AUTO_RETRIES,
                        };
                        true
                    } else {
                        state.phase = CaptchaPhase::Failed;
                        false
                    }
                };
                if schedule {
                    warn!(%err, "captcha fetch failed, retrying");
                    self.schedule_retry();
                } else {
                    warn!(%err, "captcha fetch failed, giving up until manual retry");
                }
            }
        }
    }

    /// The registration controller calls this after the server rejects the
    /// submitted code, so the user always faces a usable challenge.
    pub async fn reload_after_rejection(&self) {
        self.load(false).await;
    }

    fn schedule_retry(&self) {
        let weak = self.weak.clone();
        let handle = tokio::spawn(async move {
            sleep(RETRY_DELAY).await;
            // Owner gone means the retry dies with it.
            let Some(service) = weak.upgrade() else {
                return;
            };
            // The slot still holds this task's own handle. Clear it now so
            // that if the reload fails and schedules the next retry, the
            // replace below never aborts the task that is running it.
            if let Ok(mut timer) = service.retry_timer.lock() {
                timer.take();
            }
            service.load(false).await;
        });
        if let Ok(mut timer) = self.retry_timer.lock() {
            if let Some(previous) = timer.replace(handle) {
                previous.abort();
            }
        }
    }

    fn cancel_scheduled_retry(&self) {
        if let Ok(mut timer) = self.retry_timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }

    /// Drop the live challenge without fetching a new one; used when a
    /// submission consumed it server-side.
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.challenge = None;
            state.code.clear();
            state.code_error = None;
        }
    }

    /// Teardown: cancel the pending automatic retry, if any.
    pub fn shutdown(&self) {
        self.cancel_scheduled_retry();
    }

    #[must_use]
    pub fn phase(&self) -> CaptchaPhase {
        self.state
            .lock()
            .map_or(CaptchaPhase::Failed, |state| state.phase)
    }

    #[must_use]
    pub fn challenge(&self) -> Option<CaptchaChallenge> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.challenge.clone())
    }

    #[must_use]
    pub fn code(&self) -> String {
        self.state
            .lock()
            .map_or_else(|_| String::new(), |state| state.code.clone())
    }

    pub fn set_code(&self, code: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.code = code.to_string();
        }
    }

    #[must_use]
    pub fn code_error(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.code_error.clone())
    }

    pub fn set_code_error(&self, message: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.code_error = Some(message.to_string());
        }
    }
}

impl Drop for CaptchaService {
    fn drop(&mut self) {
        self.cancel_scheduled_retry();
    }
}

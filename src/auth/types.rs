//! Request/response types shared across the auth flows.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Login form input. Ephemeral; the password never leaves transient state
/// except at the serialization boundary of the transport.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub identifier: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Access/refresh token pair returned by a successful login or registration.
/// Handed to the session store; never persisted by this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// A server-issued captcha challenge. Any new fetch replaces the previous
/// challenge; a stale id is never knowingly submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    pub id: String,
    pub image_data: String,
}

/// Outcome of a verification-request call.
///
/// `issued: false` means the server intentionally suppressed re-issuance
/// (a prior token is still valid); that is not an error. The optional token
/// is a development echo and only changes the displayed message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub issued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackTone {
    Success,
    Info,
    Error,
}

/// User-facing feedback produced by the verification handshake. Every outcome
/// replaces the whole value; feedback never accumulates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationFeedback {
    pub tone: FeedbackTone,
    pub message: String,
    pub remaining_attempts: Option<u32>,
    pub retry_after_seconds: Option<u64>,
}

impl VerificationFeedback {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            tone: FeedbackTone::Success,
            message: message.into(),
            remaining_attempts: None,
            retry_after_seconds: None,
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            tone: FeedbackTone::Info,
            message: message.into(),
            remaining_attempts: None,
            retry_after_seconds: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            tone: FeedbackTone::Error,
            message: message.into(),
            remaining_attempts: None,
            retry_after_seconds: None,
        }
    }

    #[must_use]
    pub fn with_remaining_attempts(mut self, remaining: Option<u32>) -> Self {
        self.remaining_attempts = remaining;
        self
    }

    #[must_use]
    pub fn with_retry_after_seconds(mut self, seconds: Option<u64>) -> Self {
        self.retry_after_seconds = seconds;
        self
    }
}

/// Field name → inline validation message. Recomputed on every validation
/// pass; an absent key means the field is valid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn clear(&mut self, field: &'static str) {
        self.0.remove(field);
    }

    #[must_use]
    pub fn get(&self, field: &'static str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Registration form input.
#[derive(Clone, Debug)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub captcha_id: String,
    pub captcha_code: String,
    pub avatar_url: Option<String>,
}

//! Authentication orchestration: credential submission, captcha acquisition,
//! the email-verification handshake, token confirmation, and the cross-tab
//! completion effect.

pub mod api;
pub mod captcha;
pub mod confirm;
pub mod error;
pub mod login;
pub mod notify;
pub mod register;
pub mod types;
pub mod validate;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{AuthApi, HttpAuthApi};
pub use captcha::{CaptchaPhase, CaptchaService};
pub use confirm::{token_from_url, TokenConfirmation};
pub use error::ApiError;
pub use login::{LoginController, SubmitOutcome};
pub use notify::{LogNotifier, Notifier};
pub use register::{RegisterController, RegisterOutcome, RegistrationInput};
pub use types::{
    CaptchaChallenge, Credentials, FeedbackTone, FieldErrors, RegistrationForm, TokenPair,
    VerificationFeedback, VerificationOutcome,
};
pub use verification::VerificationHandshake;

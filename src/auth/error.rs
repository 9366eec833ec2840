//! Typed error taxonomy for the auth transport and its user-facing mapping.

use serde_json::Value;

/// Failures surfaced by the auth endpoints.
///
/// `Validation` is client-detected and never reaches the network.
/// `EmailNotVerified` is intercepted by the login controller and converted
/// into a dedicated UI mode; it must never land in the generic error banner.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email address not verified")]
    EmailNotVerified,
    #[error("captcha code does not match")]
    CaptchaInvalid,
    #[error("captcha challenge expired")]
    CaptchaExpired,
    #[error("conflict on fields: {}", .fields.join(", "))]
    Conflict { fields: Vec<String> },
    #[error("rate limited")]
    RateLimited {
        retry_after_seconds: Option<u64>,
        remaining_attempts: Option<u32>,
    },
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    /// Decode a failed response from its status and JSON error body:
    /// `{ "code": ..., "message": ..., "details": {...} }`.
    ///
    /// The unverified-email discriminator is code-first; a bare 403 without a
    /// recognizable code is also treated as unverified, matching the server's
    /// current contract. See DESIGN.md for the known ambiguity there.
    #[must_use]
    pub fn from_wire(status: u16, body: &Value) -> Self {
        let code = body.get("code").and_then(Value::as_str).unwrap_or("");
        let details = body.get("details");

        match code {
            "INVALID_CREDENTIALS" => return Self::InvalidCredentials,
            "EMAIL_NOT_VERIFIED" => return Self::EmailNotVerified,
            "CAPTCHA_INVALID" => return Self::CaptchaInvalid,
            "CAPTCHA_EXPIRED" => return Self::CaptchaExpired,
            "CONFLICT" => {
                let fields = details
                    .and_then(|details| details.get("fields"))
                    .and_then(Value::as_array)
                    .map(|fields| {
                        fields
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                return Self::Conflict { fields };
            }
            "RATE_LIMITED" => {
                return Self::RateLimited {
                    retry_after_seconds: details
                        .and_then(|details| details.get("retry_after_seconds"))
                        .and_then(Value::as_u64),
                    remaining_attempts: details
                        .and_then(|details| details.get("remaining_attempts"))
                        .and_then(Value::as_u64)
                        .and_then(|remaining| u32::try_from(remaining).ok()),
                };
            }
            "VALIDATION" => {
                let message = body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Invalid request");
                return Self::Validation(message.to_string());
            }
            _ => {}
        }

        match status {
            401 => Self::InvalidCredentials,
            403 => Self::EmailNotVerified,
            429 => Self::RateLimited {
                retry_after_seconds: details
                    .and_then(|details| details.get("retry_after_seconds"))
                    .and_then(Value::as_u64),
                remaining_attempts: details
                    .and_then(|details| details.get("remaining_attempts"))
                    .and_then(Value::as_u64)
                    .and_then(|remaining| u32::try_from(remaining).ok()),
            },
            _ => Self::Unknown(
                body.get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Something went wrong, please try again")
                    .to_string(),
            ),
        }
    }

    /// Code→message table with a generic fallback, for everything that
    /// resolves to a single user-facing notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::InvalidCredentials => "Incorrect identifier or password".to_string(),
            Self::EmailNotVerified => "Email address not verified".to_string(),
            Self::CaptchaInvalid => "Captcha code does not match".to_string(),
            Self::CaptchaExpired => "Captcha expired, please try the new one".to_string(),
            Self::Conflict { fields } => {
                if fields.is_empty() {
                    "Already in use".to_string()
                } else {
                    format!("Already in use: {}", fields.join(", "))
                }
            }
            Self::RateLimited {
                retry_after_seconds,
                remaining_attempts,
            } => {
                let mut message = "Too many attempts".to_string();
                if let Some(seconds) = retry_after_seconds {
                    message.push_str(&format!(", retry in {seconds}s"));
                }
                if let Some(remaining) = remaining_attempts {
                    message.push_str(&format!(" ({remaining} attempts left)"));
                }
                message
            }
            Self::Unknown(message) => message.clone(),
        }
    }
}

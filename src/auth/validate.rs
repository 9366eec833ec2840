//! Inline form validation for login and registration.
//!
//! The same functions drive per-keystroke inline messages and the submit
//! gate, so the disabled state of the submit button and the actual guard can
//! never disagree.

use super::types::{FieldErrors, RegistrationForm};
use regex::Regex;
use secrecy::ExposeSecret;

const MIN_PASSWORD_LEN: usize = 8;
const MIN_USERNAME_LEN: usize = 2;

/// Basic email format check; identifiers containing `@` must pass it.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Validate a login identifier. Presence of `@` selects the email rule,
/// otherwise the value is treated as a username.
#[must_use]
pub fn validate_identifier(identifier: &str) -> Option<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Some("Identifier is required".to_string());
    }
    if identifier.contains('@') {
        if !valid_email(identifier) {
            return Some("Enter a valid email address".to_string());
        }
    } else if identifier.chars().count() < MIN_USERNAME_LEN {
        return Some("Username must be at least 2 characters".to_string());
    }
    None
}

#[must_use]
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some("Password must be at least 8 characters".to_string());
    }
    None
}

/// Full login-form validation pass. Recomputed from scratch each time.
#[must_use]
pub fn validate_login(identifier: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(message) = validate_identifier(identifier) {
        errors.set("identifier", message);
    }
    if let Some(message) = validate_password(password) {
        errors.set("password", message);
    }
    errors
}

/// Full registration-form validation pass.
#[must_use]
pub fn validate_registration(form: &RegistrationForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let username = form.username.trim();
    if username.is_empty() {
        errors.set("username", "Username is required");
    } else if username.chars().count() < MIN_USERNAME_LEN {
        errors.set("username", "Username must be at least 2 characters");
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.set("email", "Email is required");
    } else if !valid_email(email) {
        errors.set("email", "Enter a valid email address");
    }

    if let Some(message) = validate_password(form.password.expose_secret()) {
        errors.set("password", message);
    }

    if form.captcha_code.trim().is_empty() {
        errors.set("captcha_code", "Enter the characters from the image");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn identifier_with_at_must_be_email_shaped() {
        assert!(validate_identifier("alice@example.com").is_none());
        assert!(validate_identifier("alice@example").is_some());
        assert!(validate_identifier("@example.com").is_some());
        assert!(validate_identifier("alice@").is_some());
    }

    #[test]
    fn identifier_without_at_is_a_username() {
        assert!(validate_identifier("al").is_none());
        assert!(validate_identifier("a").is_some());
        assert!(validate_identifier("").is_some());
        assert!(validate_identifier("   ").is_some());
    }

    #[test]
    fn password_length_gate() {
        assert!(validate_password("").is_some());
        assert!(validate_password("short").is_some());
        assert!(validate_password("1234567").is_some());
        assert!(validate_password("12345678").is_none());
        assert!(validate_password("longenough1").is_none());
    }

    #[test]
    fn login_scenario_short_password() {
        let errors = validate_login("alice@example.com", "short");
        assert!(errors.get("identifier").is_none());
        assert!(errors.get("password").is_some());
        assert!(!errors.is_empty());
    }

    #[test]
    fn login_scenario_short_username_ok() {
        let errors = validate_login("al", "longenough1");
        assert!(errors.is_empty());
    }

    #[test]
    fn registration_requires_captcha_code() {
        let form = RegistrationForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: SecretString::from("longenough1".to_string()),
            captcha_id: "cap-1".to_string(),
            captcha_code: " ".to_string(),
            avatar_url: None,
        };
        let errors = validate_registration(&form);
        assert!(errors.get("captcha_code").is_some());
        assert!(errors.get("username").is_none());
    }
}

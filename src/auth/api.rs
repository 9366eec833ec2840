//! Transport seam for the auth endpoints and its reqwest implementation.

use super::error::ApiError;
use super::types::{CaptchaChallenge, RegistrationForm, TokenPair, VerificationOutcome};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// The remote auth endpoints, abstractly. Injected into every controller so
/// the orchestration stays testable without a network.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, ApiError>;
    async fn register(&self, form: &RegistrationForm) -> Result<TokenPair, ApiError>;
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, ApiError>;
    async fn request_email_verification(
        &self,
        email: &str,
    ) -> Result<VerificationOutcome, ApiError>;
    async fn confirm_email_verification(&self, token: &str) -> Result<(), ApiError>;
}

/// Resolve an endpoint against the configured API base URL.
#[instrument]
pub fn endpoint_url(base_url: &str, endpoint: &str) -> Result<String> {
    let url = Url::parse(base_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{endpoint}");

    debug!("endpoint URL: {}", endpoint);

    Ok(endpoint_url)
}

/// Reqwest-backed implementation of [`AuthApi`].
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, endpoint: &str) -> Result<String, ApiError> {
        endpoint_url(&self.base_url, endpoint)
            .map_err(|err| ApiError::Unknown(format!("Invalid API URL: {err}")))
    }

    async fn post_json(&self, endpoint: &str, payload: &Value) -> Result<Value, ApiError> {
        let url = self.url(endpoint)?;
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            return Err(ApiError::from_wire(status.as_u16(), &body));
        }

        Ok(body)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Unknown(format!("Network error: {err}"))
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body)
        .map_err(|err| ApiError::Unknown(format!("Unexpected response shape: {err}")))
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, ApiError> {
        let payload = json!({
            "identifier": identifier,
            "password": password,
        });
        let body = self.post_json("/v1/auth/login", &payload).await?;
        decode(body)
    }

    async fn register(&self, form: &RegistrationForm) -> Result<TokenPair, ApiError> {
        let payload = json!({
            "username": form.username.trim(),
            "email": form.email.trim(),
            "password": form.password.expose_secret(),
            "captcha_id": form.captcha_id,
            "captcha_code": form.captcha_code.trim(),
            "avatar_url": form.avatar_url,
        });
        let body = self.post_json("/v1/auth/register", &payload).await?;
        decode(body)
    }

    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, ApiError> {
        let url = self.url("/v1/auth/captcha")?;
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            return Err(ApiError::from_wire(status.as_u16(), &body));
        }

        decode(body)
    }

    async fn request_email_verification(
        &self,
        email: &str,
    ) -> Result<VerificationOutcome, ApiError> {
        let payload = json!({ "email": email });
        let body = self
            .post_json("/v1/auth/resend-verification", &payload)
            .await?;
        decode(body)
    }

    async fn confirm_email_verification(&self, token: &str) -> Result<(), ApiError> {
        let payload = json!({ "token": token });
        self.post_json("/v1/auth/verify-email", &payload).await?;
        Ok(())
    }
}

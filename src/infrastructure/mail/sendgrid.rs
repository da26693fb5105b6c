//! SendGrid mail provider

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::domain::mail::{Mailer, TemplatedEmail};
use crate::domain::DomainError;

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the SendGrid mailer
#[derive(Clone)]
pub struct SendgridConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl SendgridConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl std::fmt::Debug for SendgridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendgridConfig")
            .field("api_key", &"[hidden]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sends dynamic-template emails through the SendGrid v3 API
#[derive(Debug, Clone)]
pub struct SendgridMailer {
    client: reqwest::Client,
    config: SendgridConfig,
}

impl SendgridMailer {
    pub fn new(config: SendgridConfig) -> Result<Self, DomainError> {
        if config.api_key.is_empty() {
            return Err(DomainError::configuration("SendGrid API key is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn request_body(email: &TemplatedEmail) -> Value {
        json!({
            "personalizations": [{
                "to": [{ "email": email.to }],
                "dynamic_template_data": email.data,
            }],
            "from": { "email": email.from },
            "template_id": email.template_id,
        })
    }
}

#[async_trait]
impl Mailer for SendgridMailer {
    async fn send(&self, email: TemplatedEmail) -> Result<(), DomainError> {
        let url = format!("{}/v3/mail/send", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&Self::request_body(&email))
            .send()
            .await
            .map_err(|e| DomainError::provider("sendgrid", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                "sendgrid",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        debug!(template_id = %email.template_id, "Email accepted by SendGrid");
        Ok(())
    }
}

//! SNIC (SUPR) account-registry lookups.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::RegistryConfig;

/// Production SUPR endpoint.
pub const DEFAULT_BASE_URL: &str = "https://supr.snic.se";

#[derive(Debug, Deserialize)]
struct EmailPresentResponse {
    email_present: bool,
}

/// Client for the account-registry `email_present` endpoint.
pub struct AccountRegistry {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl AccountRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Point the client at an explicit base URL (tests, staging).
    pub fn with_base_url(config: &RegistryConfig, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Whether the registry knows an account for `email`.
    pub async fn email_present(&self, email: &str) -> Result<bool> {
        let url = format!("{}/api/person/email_present/", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("email", email)])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .context("account registry request failed")?
            .error_for_status()
            .context("account registry returned an error status")?;

        let body: EmailPresentResponse = response
            .json()
            .await
            .context("failed to decode account registry response")?;

        Ok(body.email_present)
    }
}

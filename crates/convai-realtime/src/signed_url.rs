use anyhow::{Context, Result};
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::client::config::Config;
use crate::client::consts::{API_KEY_HEADER, SIGNED_URL_PATH};

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// Requests time-limited signed session URLs for a pre-configured agent.
#[derive(Clone)]
pub struct SignedUrlClient {
    http: reqwest::Client,
    config: Config,
}

impl SignedUrlClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// `GET {base}/convai/conversation/get_signed_url?agent_id=...`
    pub fn endpoint(&self, agent_id: &str) -> Result<Url> {
        let url = format!("{}/{}", self.config.base_url(), SIGNED_URL_PATH);
        Url::parse_with_params(&url, &[("agent_id", agent_id)])
            .with_context(|| format!("invalid signed URL endpoint: {url}"))
    }

    pub async fn get_signed_url(&self, agent_id: &str) -> Result<String> {
        let api_key = self.config.api_key().expose_secret();
        if api_key.is_empty() {
            return Err(anyhow::anyhow!("API key is not configured"));
        }

        let url = self.endpoint(agent_id)?;
        tracing::debug!("requesting signed URL for agent {}", agent_id);

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .context("signed URL request failed")?
            .error_for_status()
            .context("signed URL request was rejected")?
            .json::<SignedUrlResponse>()
            .await
            .context("failed to decode signed URL response")?;

        Ok(response.signed_url)
    }
}

//! Client for the new platform API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::{join_url, ClientError, PlatformApi};

/// HTTP client for the platform's REST API.
///
/// Only the two operations the worker needs: `list` feeds both the skip-set
/// and the foreign-key mappings, `create` inserts cleaned records.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: Client,
    base_url: String,
}

impl PlatformClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Url::parse(base_url)
            .with_context(|| format!("invalid platform API URL '{base_url}'"))?;
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn list(&self, resource: &str) -> Result<Vec<Value>, ClientError> {
        let url = join_url(&self.base_url, resource);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    async fn create(&self, resource: &str, body: &Value) -> Result<Value, ClientError> {
        let url = join_url(&self.base_url, resource);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }
}

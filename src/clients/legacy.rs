//! Client for the legacy ("ancient") incubator API.
//!
//! Every request carries the shared `X-Group-Authorization` secret. List
//! fetches are strict - a failure there aborts the resource's import - while
//! detail and image fetches return tagged or optional results so callers can
//! degrade instead of aborting a batch.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use url::Url;

use super::{join_url, ClientError, DetailOutcome, LegacyApi};

const AUTH_HEADER: &str = "X-Group-Authorization";

/// HTTP client for the ancient API.
#[derive(Debug, Clone)]
pub struct AncientClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AncientClient {
    /// Create a client for the given base URL and shared secret.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Url::parse(base_url)
            .with_context(|| format!("invalid ancient API URL '{base_url}'"))?;
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<Response, ClientError> {
        let response = self
            .client
            .get(url)
            .header(AUTH_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    async fn get_text(&self, url: &str) -> Result<String, ClientError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl LegacyApi for AncientClient {
    async fn fetch_all(&self, resource: &str) -> Result<Vec<Value>, ClientError> {
        let url = join_url(&self.base_url, resource);
        let response = self.get(&url).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    async fn fetch_detail(&self, resource: &str, id: i64) -> DetailOutcome {
        let url = join_url(&self.base_url, &format!("{resource}/{id}"));
        let response = match self
            .client
            .get(&url)
            .header(AUTH_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(source) => return DetailOutcome::Failed(ClientError::Transport { url, source }),
        };
        match response.status() {
            StatusCode::NOT_FOUND => DetailOutcome::Missing,
            status if !status.is_success() => {
                DetailOutcome::Failed(ClientError::Status { url, status })
            }
            _ => match response.json().await {
                Ok(record) => DetailOutcome::Found(record),
                Err(source) => DetailOutcome::Failed(ClientError::Decode { url, source }),
            },
        }
    }

    async fn fetch_image(&self, resource: &str, id: i64) -> Option<String> {
        let url = join_url(&self.base_url, &format!("{resource}/{id}/image"));
        match self.get_text(&url).await {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::debug!(resource, id, %err, "image fetch failed, continuing without");
                None
            }
        }
    }

    async fn fetch_founder_image(&self, startup_id: i64, founder_id: i64) -> Option<String> {
        let url = join_url(
            &self.base_url,
            &format!("startups/{startup_id}/founders/{founder_id}/image"),
        );
        match self.get_text(&url).await {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::debug!(
                    startup_id,
                    founder_id,
                    %err,
                    "founder image fetch failed, continuing without"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_url() {
        assert!(AncientClient::new("not a url", "key", Duration::from_secs(5)).is_err());
        assert!(AncientClient::new("https://legacy.test/api/", "key", Duration::from_secs(5)).is_ok());
    }
}

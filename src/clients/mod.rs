//! HTTP clients for the two APIs the worker talks to.
//!
//! Both sides are consumed as black boxes over JSON. The traits here are the
//! seam the reconciler is written against, so tests can swap in in-memory
//! fakes without a network.

mod legacy;
mod target;

pub use legacy::AncientClient;
pub use target::PlatformClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Transport-level failure talking to either API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of a single-record detail fetch.
///
/// Detail fetches are the one place where failure is routinely survivable:
/// the reconciler degrades `Missing`/`Failed` to a sentinel record so one bad
/// row cannot sink a batch. Keeping the outcome tagged makes that choice the
/// caller's, not the client's.
#[derive(Debug)]
pub enum DetailOutcome {
    /// The record decoded fine.
    Found(Value),
    /// The API answered 404.
    Missing,
    /// Anything else went wrong.
    Failed(ClientError),
}

/// Read access to the legacy source API.
#[async_trait]
pub trait LegacyApi: Send + Sync {
    /// List every record of a resource type.
    async fn fetch_all(&self, resource: &str) -> Result<Vec<Value>, ClientError>;

    /// Fetch one record by its legacy id.
    async fn fetch_detail(&self, resource: &str, id: i64) -> DetailOutcome;

    /// Fetch a resource's image payload (base64 text). `None` on any failure.
    async fn fetch_image(&self, resource: &str, id: i64) -> Option<String>;

    /// Fetch a founder's image payload. `None` on any failure.
    async fn fetch_founder_image(&self, startup_id: i64, founder_id: i64) -> Option<String>;
}

/// List/create access to the new platform API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// List every imported record of a resource type.
    async fn list(&self, resource: &str) -> Result<Vec<Value>, ClientError>;

    /// Create one record; returns the stored row with its new id.
    async fn create(&self, resource: &str, body: &Value) -> Result<Value, ClientError>;
}

/// Join a base URL and a path with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://x/api/", "startups"), "http://x/api/startups");
        assert_eq!(join_url("http://x/api", "startups"), "http://x/api/startups");
        assert_eq!(join_url("http://x/api", "/startups"), "http://x/api/startups");
    }
}

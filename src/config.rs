//! Settings and the import plan.
//!
//! Two configuration surfaces, matching how the worker is deployed:
//!
//! - **Environment** (plus `.env` via dotenvy): endpoints and the shared
//!   secret for the ancient API. Secrets never live in the plan file.
//! - **Plan file** (`config.json`): the ordered list of resource types to
//!   import, with per-resource options. Order is load-bearing - a resource
//!   whose references point at another resource must come after it, because
//!   foreign-key mappings are read once per run and never refreshed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Default delay between founder image fetches, in milliseconds.
///
/// Inherited from the previous worker; nothing documents it as a hard limit
/// of the ancient API, so it stays overridable.
pub const DEFAULT_FOUNDER_DELAY_MS: u64 = 200;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings resolved from the environment and CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the legacy source API.
    pub ancient_api_url: String,
    /// Shared secret sent as `X-Group-Authorization` on every legacy request.
    pub ancient_api_key: String,
    /// Base URL of the new platform API.
    pub api_url: String,
    /// Directory for the per-category plain-text logs.
    pub logs_dir: PathBuf,
    /// Path to the import plan file.
    pub plan_path: PathBuf,
    /// Pause between founder image fetches.
    pub founder_delay: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Settings {
    /// Resolve settings from the process environment.
    ///
    /// `plan_override` is the CLI `--config` flag and wins over the
    /// `MIGRATE_CONFIG` variable and the `./config.json` default.
    pub fn from_env(plan_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let ancient_api_url =
            require_env("ANCIENT_API_URL").context("legacy API endpoint is required")?;
        let ancient_api_key =
            require_env("ANCIENT_API_KEY").context("legacy API credential is required")?;
        let api_url = require_env("API_URL").context("platform API endpoint is required")?;

        let logs_dir = std::env::var("MIGRATE_LOGS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        let plan_path = plan_override
            .or_else(|| std::env::var("MIGRATE_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config.json"));

        let founder_delay_ms = match std::env::var("MIGRATE_FOUNDER_DELAY_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid MIGRATE_FOUNDER_DELAY_MS '{raw}'"))?,
            Err(_) => DEFAULT_FOUNDER_DELAY_MS,
        };

        Ok(Self {
            ancient_api_url,
            ancient_api_key,
            api_url,
            logs_dir,
            plan_path,
            founder_delay: Duration::from_millis(founder_delay_ms),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name).with_context(|| format!("{name} is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("{name} is empty");
    }
    Ok(value)
}

/// One resource type to import, in plan order.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    /// Resource name, used verbatim in both API paths and log categories.
    pub field: String,
    /// Declared foreign-key references: record field name -> resource whose
    /// mapping resolves it. Replaces the old `_id`-suffix pluralization
    /// guesswork; a `_id` field not listed here is treated as plain data.
    #[serde(default)]
    pub references: BTreeMap<String, String>,
    /// Re-fetch each record individually (list payloads are shallow for some
    /// resources on the ancient API).
    #[serde(default)]
    pub detail: bool,
    /// Attach the resource's image payload as an `image` field.
    #[serde(default)]
    pub image: bool,
    /// Run the founder sub-import on each record's `founders` array.
    #[serde(default)]
    pub founders: bool,
}

/// The ordered import plan.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub resources: Vec<ResourceEntry>,
}

impl ImportPlan {
    /// Load the plan from a JSON file: an ordered array of resource entries.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read plan file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("cannot parse plan file {}", path.display()))
    }

    /// Parse the plan from a JSON string.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let resources: Vec<ResourceEntry> = serde_json::from_str(raw)?;
        if resources.is_empty() {
            anyhow::bail!("plan lists no resources");
        }
        Ok(Self { resources })
    }

    /// Look up an entry by resource name.
    pub fn get(&self, resource: &str) -> Option<&ResourceEntry> {
        self.resources.iter().find(|e| e.field == resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"[
        {"field": "startups", "detail": true, "image": true, "founders": true},
        {"field": "investors", "image": true},
        {"field": "news", "references": {"startup_id": "startups"}}
    ]"#;

    #[test]
    fn parses_ordered_entries_with_defaults() {
        let plan = ImportPlan::from_json(PLAN).unwrap();
        assert_eq!(plan.resources.len(), 3);
        assert_eq!(plan.resources[0].field, "startups");
        assert!(plan.resources[0].founders);
        assert!(!plan.resources[1].detail);
        assert!(plan.resources[1].references.is_empty());
        assert_eq!(
            plan.resources[2].references.get("startup_id").map(String::as_str),
            Some("startups")
        );
    }

    #[test]
    fn rejects_empty_plan() {
        assert!(ImportPlan::from_json("[]").is_err());
    }

    #[test]
    fn get_finds_entries_by_name() {
        let plan = ImportPlan::from_json(PLAN).unwrap();
        assert!(plan.get("news").is_some());
        assert!(plan.get("mentors").is_none());
    }
}

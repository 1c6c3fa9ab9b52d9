//! Foreign-key resolution between legacy ids and newly-assigned ids.
//!
//! Imported rows keep their legacy id in `id_legacy`; the mapping for a
//! resource is rebuilt each run by listing that resource on the platform API
//! and pairing `id_legacy` with the new `id`. Mappings are cached for the
//! lifetime of one run and never invalidated mid-run, which is why plan order
//! matters: a referenced resource must be fully imported before anything that
//! points at it.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::clients::PlatformApi;
use crate::logbook::Logbook;

/// Log category for mapping and resolution events.
const LOG_CATEGORY: &str = "foreign_keys";

/// Resolves declared reference fields on outbound records.
///
/// Owns its per-resource cache; constructing a fresh resolver is how a run
/// (or a test) starts from a clean slate.
pub struct ForeignKeyResolver<'a> {
    platform: &'a dyn PlatformApi,
    logbook: &'a Logbook,
    cache: HashMap<String, HashMap<i64, i64>>,
}

impl<'a> ForeignKeyResolver<'a> {
    /// Create a resolver with an empty cache.
    pub fn new(platform: &'a dyn PlatformApi, logbook: &'a Logbook) -> Self {
        Self {
            platform,
            logbook,
            cache: HashMap::new(),
        }
    }

    /// Pre-seed the mapping for a resource (test hook; also lets a caller
    /// reuse a mapping it already paid for).
    pub fn seed(&mut self, resource: &str, mapping: HashMap<i64, i64>) {
        self.cache.insert(resource.to_string(), mapping);
    }

    /// The `{legacy_id -> new_id}` mapping for a resource.
    ///
    /// First access lists the resource on the platform API; later accesses
    /// hit the cache. A failed fetch degrades to an empty mapping - the run
    /// keeps going and unresolved references stay as legacy ids.
    pub async fn mapping_for(&mut self, resource: &str) -> &HashMap<i64, i64> {
        if !self.cache.contains_key(resource) {
            let mapping = match self.platform.list(resource).await {
                Ok(records) => {
                    let mapping = build_mapping(&records);
                    self.logbook.append(
                        LOG_CATEGORY,
                        &format!("built mapping for {resource} ({} entries)", mapping.len()),
                    );
                    tracing::info!(resource, entries = mapping.len(), "built foreign-key mapping");
                    mapping
                }
                Err(err) => {
                    self.logbook.append(
                        LOG_CATEGORY,
                        &format!("failed to build mapping for {resource}: {err}"),
                    );
                    tracing::error!(resource, %err, "foreign-key mapping fetch failed");
                    HashMap::new()
                }
            };
            self.cache.insert(resource.to_string(), mapping);
        }
        &self.cache[resource]
    }

    /// Rewrite every declared reference field on `item` from legacy id to new
    /// id. Unmapped values stay in place with a warning; null and absent
    /// fields are skipped. Returns how many references could not be resolved.
    pub async fn resolve(
        &mut self,
        item: &mut Value,
        references: &BTreeMap<String, String>,
    ) -> usize {
        let mut unresolved = 0;
        for (field, resource) in references {
            let legacy_id = match item.get(field) {
                Some(value) if value.is_null() => continue,
                Some(value) => match value.as_i64() {
                    Some(id) => id,
                    None => {
                        self.logbook.append(
                            LOG_CATEGORY,
                            &format!("{field} holds non-numeric value {value}, left as-is"),
                        );
                        continue;
                    }
                },
                None => continue,
            };

            let resolved = self.mapping_for(resource).await.get(&legacy_id).copied();
            match resolved {
                Some(new_id) => {
                    item[field.as_str()] = Value::from(new_id);
                }
                None => {
                    unresolved += 1;
                    self.logbook.append(
                        LOG_CATEGORY,
                        &format!(
                            "no {resource} mapping for {field}={legacy_id}, keeping legacy id"
                        ),
                    );
                    tracing::warn!(%field, legacy_id, %resource, "unresolved foreign key");
                }
            }
        }
        unresolved
    }
}

/// Pair each imported record's `id_legacy` with its new `id`.
fn build_mapping(records: &[Value]) -> HashMap<i64, i64> {
    records
        .iter()
        .filter_map(|record| {
            let legacy = record.get("id_legacy")?.as_i64()?;
            let new = record.get("id")?.as_i64()?;
            Some((legacy, new))
        })
        .collect()
}

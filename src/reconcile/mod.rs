//! Import reconciliation: one forward-only pass per configured resource.
//!
//! For each resource the pass is fetch source, fetch existing, partition into
//! skip/new, create each new record in source order. No retries, no backward
//! transitions, no transaction spanning creations - a failed create is logged
//! and the loop moves on.

mod founders;

use std::collections::HashSet;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use crate::clean;
use crate::clients::{DetailOutcome, LegacyApi, PlatformApi};
use crate::config::{ImportPlan, ResourceEntry};
use crate::logbook::Logbook;
use crate::resolver::ForeignKeyResolver;
use crate::throttle::Pacer;

/// Counters for one resource pass (or a whole run, once merged).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Source records fetched from the legacy API.
    pub scanned: usize,
    /// Records created on the platform API (or counted in dry-run mode).
    pub imported: usize,
    /// Records skipped because their `id_legacy` already exists.
    pub skipped: usize,
    /// Failed fetches or creations.
    pub errors: usize,
    /// Reference fields left holding a legacy id.
    pub unresolved_refs: usize,
}

impl ImportStats {
    /// Merge stats from another pass.
    pub fn merge(&mut self, other: &ImportStats) {
        self.scanned += other.scanned;
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.unresolved_refs += other.unresolved_refs;
    }
}

/// Drives the per-resource import passes.
pub struct Reconciler<'a> {
    legacy: &'a dyn LegacyApi,
    platform: &'a dyn PlatformApi,
    logbook: &'a Logbook,
    resolver: ForeignKeyResolver<'a>,
    founder_delay: Duration,
    dry_run: bool,
    limit: usize,
    show_progress: bool,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over the two APIs with a fresh resolver cache.
    pub fn new(
        legacy: &'a dyn LegacyApi,
        platform: &'a dyn PlatformApi,
        logbook: &'a Logbook,
        founder_delay: Duration,
    ) -> Self {
        Self {
            legacy,
            platform,
            logbook,
            resolver: ForeignKeyResolver::new(platform, logbook),
            founder_delay,
            dry_run: false,
            limit: 0,
            show_progress: false,
        }
    }

    /// Preview mode: partition and resolve but never POST.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Cap creations per resource (0 = unlimited).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Draw a progress bar per resource pass.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run every resource in plan order, merging per-resource stats.
    pub async fn run(&mut self, plan: &ImportPlan) -> ImportStats {
        let mut total = ImportStats::default();
        for entry in &plan.resources {
            let stats = self.import_resource(entry).await;
            total.merge(&stats);
        }
        total
    }

    /// One pass over a single resource.
    pub async fn import_resource(&mut self, entry: &ResourceEntry) -> ImportStats {
        let resource = entry.field.as_str();
        let mut stats = ImportStats::default();

        let source = match self.legacy.fetch_all(resource).await {
            Ok(records) => records,
            Err(err) => {
                stats.errors += 1;
                self.logbook
                    .append(resource, &format!("failed to fetch legacy {resource}: {err}"));
                tracing::error!(resource, %err, "legacy fetch failed, resource aborted");
                return stats;
            }
        };

        let existing = match self.platform.list(resource).await {
            Ok(records) => records,
            Err(err) => {
                stats.errors += 1;
                self.logbook.append(
                    resource,
                    &format!("failed to list imported {resource}: {err}"),
                );
                tracing::error!(resource, %err, "platform list failed, resource aborted");
                return stats;
            }
        };

        let seen = skip_set(&existing);
        stats.scanned = source.len();
        tracing::info!(
            resource,
            source = source.len(),
            existing = seen.len(),
            "starting resource pass"
        );

        let progress = self.make_progress_bar(resource, source.len());
        // One pacer per resource so founder fetches stay spaced across
        // consecutive startups, not just within one.
        let mut pacer = Pacer::new(self.founder_delay);

        for record in source {
            progress.inc(1);

            let legacy_id = match record.get("id").and_then(Value::as_i64) {
                Some(id) => id,
                None => {
                    stats.errors += 1;
                    self.logbook
                        .append(resource, "source record without numeric id, skipped");
                    continue;
                }
            };

            if seen.contains(&legacy_id) {
                let name = record
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("N/A")
                    .to_string();
                self.logbook.append(
                    resource,
                    &format!("skipping {resource} {legacy_id} ({name}): already imported"),
                );
                stats.skipped += 1;
                continue;
            }

            if self.limit != 0 && stats.imported >= self.limit {
                break;
            }

            let mut record = if entry.detail {
                match self.legacy.fetch_detail(resource, legacy_id).await {
                    DetailOutcome::Found(detail) if detail.is_object() => detail,
                    DetailOutcome::Found(_) => {
                        // The ancient API occasionally serves plain strings
                        // (maintenance pages) with a 200 status.
                        self.logbook.append(
                            resource,
                            &format!("{resource} {legacy_id} detail returned non-object payload, importing sentinel"),
                        );
                        sentinel_record(resource, legacy_id, "non-object detail payload")
                    }
                    DetailOutcome::Missing => {
                        self.logbook.append(
                            resource,
                            &format!("{resource} {legacy_id} missing on detail fetch, importing sentinel"),
                        );
                        sentinel_record(resource, legacy_id, "not found")
                    }
                    DetailOutcome::Failed(err) => {
                        self.logbook.append(
                            resource,
                            &format!("{resource} {legacy_id} detail fetch failed ({err}), importing sentinel"),
                        );
                        sentinel_record(resource, legacy_id, &err.to_string())
                    }
                }
            } else {
                record
            };

            retag(&mut record, legacy_id);

            if entry.image {
                let image = self.legacy.fetch_image(resource, legacy_id).await;
                if let Some(map) = record.as_object_mut() {
                    map.insert("image".to_string(), json!(image));
                }
            }

            if entry.founders {
                founders::prepare_founders(
                    &mut record,
                    self.legacy,
                    &mut pacer,
                    self.logbook,
                    resource,
                )
                .await;
            }

            stats.unresolved_refs += self.resolver.resolve(&mut record, &entry.references).await;
            clean::clean_value(&mut record);

            if self.dry_run {
                self.logbook
                    .append(resource, &format!("would create {resource} {legacy_id}"));
                stats.imported += 1;
                continue;
            }

            match self.platform.create(resource, &record).await {
                Ok(_) => {
                    self.logbook
                        .append(resource, &format!("created {resource} {legacy_id}"));
                    stats.imported += 1;
                }
                Err(err) => {
                    stats.errors += 1;
                    self.logbook.append(
                        resource,
                        &format!("failed to create {resource} {legacy_id}: {err}"),
                    );
                    tracing::warn!(resource, legacy_id, %err, "create failed, continuing");
                }
            }
        }

        progress.finish_and_clear();
        tracing::info!(
            resource,
            imported = stats.imported,
            skipped = stats.skipped,
            errors = stats.errors,
            "resource pass complete"
        );
        stats
    }

    fn make_progress_bar(&self, resource: &str, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .progress_chars("█▓░"),
        );
        pb.set_message(resource.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// `id_legacy` values already present on the platform side.
pub fn skip_set(existing: &[Value]) -> HashSet<i64> {
    existing
        .iter()
        .filter_map(|record| record.get("id_legacy").and_then(Value::as_i64))
        .collect()
}

/// How a source listing would partition against the skip set.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PreviewCounts {
    /// Records a run would POST.
    pub to_create: usize,
    /// Records whose id is already in the skip set.
    pub already_imported: usize,
    /// Records with no numeric `id` (a run counts these as errors).
    pub without_id: usize,
}

/// Partition a source listing against existing `id_legacy` values.
pub fn preview_counts(source: &[Value], seen: &HashSet<i64>) -> PreviewCounts {
    let mut counts = PreviewCounts::default();
    for record in source {
        match record.get("id").and_then(Value::as_i64) {
            None => counts.without_id += 1,
            Some(id) if seen.contains(&id) => counts.already_imported += 1,
            Some(_) => counts.to_create += 1,
        }
    }
    counts
}

/// Drop any `id` the record carries and stamp `id_legacy` from the listing;
/// the platform assigns the new `id`. Detail bodies cannot be trusted to
/// echo the id back, so the listing id is authoritative.
fn retag(record: &mut Value, legacy_id: i64) {
    if let Value::Object(map) = record {
        map.remove("id");
        map.insert("id_legacy".to_string(), Value::from(legacy_id));
    }
}

/// Placeholder imported when a record's detail cannot be fetched, so the rest
/// of the batch still lands.
fn sentinel_record(resource: &str, id: i64, message: &str) -> Value {
    json!({
        "id": id,
        "name": format!("{resource}_{id}_ERROR"),
        "error": true,
        "error_message": message,
    })
}

/// Print the run summary in the usual console format.
pub fn print_summary(stats: &ImportStats) {
    println!("\n{} Migration complete:", style("✓").green());
    println!("  Records scanned:  {}", style(stats.scanned).dim());
    println!("  Records imported: {}", style(stats.imported).green());
    println!("  Records skipped:  {}", style(stats.skipped).yellow());
    if stats.unresolved_refs > 0 {
        println!(
            "  Unresolved refs:  {} (see logs/foreign_keys.log)",
            style(stats.unresolved_refs).yellow()
        );
    }
    if stats.errors > 0 {
        println!("  Errors:           {}", style(stats.errors).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stats_merge_accumulates_all_counters() {
        let mut a = ImportStats {
            scanned: 3,
            imported: 2,
            skipped: 1,
            errors: 0,
            unresolved_refs: 1,
        };
        let b = ImportStats {
            scanned: 2,
            imported: 1,
            skipped: 0,
            errors: 1,
            unresolved_refs: 0,
        };
        a.merge(&b);
        assert_eq!(a.scanned, 5);
        assert_eq!(a.imported, 3);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.errors, 1);
        assert_eq!(a.unresolved_refs, 1);
    }

    #[test]
    fn retag_renames_id_and_drops_it() {
        let mut record = json!({"id": 7, "name": "Acme"});
        retag(&mut record, 7);
        assert_eq!(record["id_legacy"], 7);
        assert!(record.get("id").is_none());
    }

    #[test]
    fn retag_stamps_id_legacy_even_without_an_id_field() {
        let mut record = json!({"name": "anonymous"});
        retag(&mut record, 4);
        assert_eq!(record["id_legacy"], 4);
    }

    #[test]
    fn retag_prefers_the_listing_id_over_the_body() {
        let mut record = json!({"id": 999, "name": "Acme"});
        retag(&mut record, 7);
        assert_eq!(record["id_legacy"], 7);
        assert!(record.get("id").is_none());
    }

    #[test]
    fn preview_counts_add_up_to_the_source_total() {
        let source = vec![
            json!({"id": 1, "name": "fresh"}),
            json!({"id": 2, "name": "imported"}),
            json!({"name": "no id at all"}),
            json!({"id": "seven", "name": "non-numeric id"}),
        ];
        let seen = HashSet::from([2]);
        let counts = preview_counts(&source, &seen);
        assert_eq!(counts.to_create, 1);
        assert_eq!(counts.already_imported, 1);
        assert_eq!(counts.without_id, 2);
        assert_eq!(
            counts.to_create + counts.already_imported + counts.without_id,
            source.len()
        );
    }

    #[test]
    fn skip_set_ignores_records_without_marker() {
        let existing = vec![
            json!({"id": 105, "id_legacy": 5}),
            json!({"id": 106}),
            json!({"id": 107, "id_legacy": "not a number"}),
        ];
        let seen = skip_set(&existing);
        assert_eq!(seen, HashSet::from([5]));
    }

    #[test]
    fn sentinel_record_carries_error_marker() {
        let record = sentinel_record("startups", 12, "boom");
        assert_eq!(record["name"], "startups_12_ERROR");
        assert_eq!(record["error"], true);
        assert_eq!(record["error_message"], "boom");
        assert_eq!(record["id"], 12);
    }
}

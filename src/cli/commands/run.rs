//! The import command.

use console::style;

use crate::clients::{AncientClient, PlatformClient};
use crate::config::{ImportPlan, Settings};
use crate::logbook::Logbook;
use crate::reconcile::{print_summary, ImportStats, Reconciler};

/// Execute the migration over the configured plan.
pub async fn cmd_run(
    settings: &Settings,
    resource: Option<&str>,
    limit: usize,
    dry_run: bool,
) -> anyhow::Result<()> {
    let plan = ImportPlan::load(&settings.plan_path)?;

    if let Some(name) = resource {
        if plan.get(name).is_none() {
            anyhow::bail!(
                "resource '{}' is not in the plan. Use 'resources' to see what is configured.",
                name
            );
        }
    }

    let legacy = AncientClient::new(
        &settings.ancient_api_url,
        &settings.ancient_api_key,
        settings.request_timeout,
    )?;
    let platform = PlatformClient::new(&settings.api_url, settings.request_timeout)?;
    let logbook = Logbook::new(&settings.logs_dir);

    if dry_run {
        println!(
            "{} Dry run mode - no changes will be made",
            style("!").yellow()
        );
    }

    let mut reconciler = Reconciler::new(&legacy, &platform, &logbook, settings.founder_delay)
        .with_dry_run(dry_run)
        .with_limit(limit)
        .with_progress(true);

    let mut total = ImportStats::default();
    for entry in &plan.resources {
        if let Some(name) = resource {
            if entry.field != name {
                continue;
            }
        }
        println!("\n{} Importing {}", style("→").cyan(), entry.field);
        let stats = reconciler.import_resource(entry).await;
        println!(
            "  {} imported, {} skipped, {} errors",
            style(stats.imported).green(),
            style(stats.skipped).yellow(),
            if stats.errors > 0 {
                style(stats.errors).red()
            } else {
                style(stats.errors).dim()
            }
        );
        total.merge(&stats);
    }

    print_summary(&total);
    Ok(())
}

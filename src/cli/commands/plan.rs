//! Run preview: partition counts without creating anything.

use console::style;

use crate::clients::{AncientClient, LegacyApi, PlatformApi, PlatformClient};
use crate::config::{ImportPlan, Settings};
use crate::reconcile::{preview_counts, skip_set};

/// Show, per resource, how many records a run would skip and create.
pub async fn cmd_plan(settings: &Settings) -> anyhow::Result<()> {
    let plan = ImportPlan::load(&settings.plan_path)?;

    let legacy = AncientClient::new(
        &settings.ancient_api_url,
        &settings.ancient_api_key,
        settings.request_timeout,
    )?;
    let platform = PlatformClient::new(&settings.api_url, settings.request_timeout)?;

    println!("{} Previewing {} resources", style("→").cyan(), plan.resources.len());

    for entry in &plan.resources {
        let resource = &entry.field;
        let source = match legacy.fetch_all(resource).await {
            Ok(records) => records,
            Err(err) => {
                println!("  {} {resource}: {err}", style("✗").red());
                continue;
            }
        };
        let existing = match platform.list(resource).await {
            Ok(records) => records,
            Err(err) => {
                println!("  {} {resource}: {err}", style("✗").red());
                continue;
            }
        };

        let seen = skip_set(&existing);
        let counts = preview_counts(&source, &seen);

        let mut line = format!(
            "  {} {resource}: {} source, {} already imported, {} to create",
            style("✓").green(),
            source.len(),
            style(counts.already_imported).yellow(),
            style(counts.to_create).green()
        );
        if counts.without_id > 0 {
            line.push_str(&format!(", {} without id", style(counts.without_id).red()));
        }
        println!("{line}");
    }

    Ok(())
}

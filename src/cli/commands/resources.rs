//! List the configured plan.

use console::style;

use crate::config::{ImportPlan, Settings};

/// Print the plan entries in import order.
pub async fn cmd_resources(settings: &Settings) -> anyhow::Result<()> {
    let plan = ImportPlan::load(&settings.plan_path)?;

    for (position, entry) in plan.resources.iter().enumerate() {
        let mut flags = Vec::new();
        if entry.detail {
            flags.push("detail");
        }
        if entry.image {
            flags.push("image");
        }
        if entry.founders {
            flags.push("founders");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!("{:>3}. {}{}", position + 1, style(&entry.field).cyan(), flags);
        for (field, resource) in &entry.references {
            println!("       {} -> {}", field, resource);
        }
    }

    Ok(())
}

//! Inspect a foreign-key mapping.

use console::style;

use crate::clients::PlatformClient;
use crate::config::Settings;
use crate::logbook::Logbook;
use crate::resolver::ForeignKeyResolver;

/// Build and print the `{legacy_id -> new_id}` mapping for one resource.
pub async fn cmd_mapping(settings: &Settings, resource: &str) -> anyhow::Result<()> {
    let platform = PlatformClient::new(&settings.api_url, settings.request_timeout)?;
    let logbook = Logbook::new(&settings.logs_dir);
    let mut resolver = ForeignKeyResolver::new(&platform, &logbook);

    let mapping = resolver.mapping_for(resource).await;
    println!(
        "{} {} mapping entries for {}",
        style("→").cyan(),
        mapping.len(),
        resource
    );

    let mut pairs: Vec<(i64, i64)> = mapping.iter().map(|(k, v)| (*k, *v)).collect();
    pairs.sort_unstable();
    for (legacy, new) in pairs {
        println!("  {legacy} -> {new}");
    }

    Ok(())
}

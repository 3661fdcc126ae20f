// scorewatch/src/commands/reference.rs
//
// USE CASE: Build the reference statistics, once per model version.

use anyhow::Context;
use std::path::PathBuf;

use scorewatch_core::application::build_reference;
use scorewatch_core::infrastructure::adapters::DuckDbTableSource;
use scorewatch_core::infrastructure::config::load_monitor_config;
use scorewatch_core::infrastructure::repository::FsMonitorStore;

use super::{fmt_metric, new_table};

pub fn execute(
    project_dir: PathBuf,
    training: Option<PathBuf>,
    model_version: Option<String>,
) -> anyhow::Result<()> {
    println!("⚙️  Loading configuration...");
    let mut config = load_monitor_config(&project_dir)
        .with_context(|| format!("Invalid monitor config in {}", project_dir.display()))?;
    if model_version.is_some() {
        config.model_version = model_version;
    }

    let training = training.unwrap_or_else(|| project_dir.join(&config.paths.training));
    let source = DuckDbTableSource::in_memory()?;
    let store = FsMonitorStore::new(config.paths.monitor_paths(&project_dir));

    println!("📐 Building reference from {}", training.display());
    let reference = build_reference(
        &source,
        &store,
        &training,
        &config.features.numerical,
        config.features.bins,
        config.model_version.clone(),
    )
    .with_context(|| format!("Could not build reference from {}", training.display()))?;

    let mut table = new_table(["Feature", "Count", "Missing", "Min", "Median", "Max"]);
    for (name, feature) in &reference.features {
        table.add_row(vec![
            name.clone(),
            feature.count.to_string(),
            format!("{:.2}%", feature.missing_rate * 100.0),
            fmt_metric(feature.min),
            fmt_metric(feature.p50),
            fmt_metric(feature.max),
        ]);
    }
    println!("{table}");

    let skipped: Vec<&String> = config
        .features
        .numerical
        .iter()
        .filter(|f| reference.get(f).is_none())
        .collect();
    if !skipped.is_empty() {
        println!(
            "   ⚠️  Skipped (absent or entirely missing): {}",
            skipped.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        );
    }

    println!(
        "✨ Reference with {} features saved to {}",
        reference.len(),
        store.paths().reference.display()
    );
    Ok(())
}

// scorewatch/src/commands/check.rs
//
// USE CASE: Pre-flight check that the persisted reference covers the configured features.

use anyhow::Context;
use std::path::PathBuf;

use scorewatch_core::application::check_reference_coverage;
use scorewatch_core::infrastructure::config::load_monitor_config;
use scorewatch_core::infrastructure::repository::FsMonitorStore;

use super::new_table;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_monitor_config(&project_dir)
        .with_context(|| format!("Invalid monitor config in {}", project_dir.display()))?;
    let store = FsMonitorStore::new(config.paths.monitor_paths(&project_dir));

    println!("🔎 Checking reference coverage...");
    let coverage = check_reference_coverage(&store, &config.features.numerical)
        .context("Could not load the reference statistics")?;

    let mut table = new_table(["Feature", "In reference", "Histogram"]);
    let mut gaps = 0;
    for c in &coverage {
        if !(c.present && c.has_histogram) {
            gaps += 1;
        }
        table.add_row(vec![
            c.feature.clone(),
            if c.present { "✅" } else { "❌" }.to_string(),
            if c.has_histogram { "✅" } else { "❌" }.to_string(),
        ]);
    }
    println!("{table}");

    if gaps > 0 {
        eprintln!("\n❌ {} feature(s) cannot be drift-scored.", gaps);
        std::process::exit(1);
    }

    println!("   ✅ Reference covers all {} features.", coverage.len());
    Ok(())
}

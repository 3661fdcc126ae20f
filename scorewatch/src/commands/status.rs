// scorewatch/src/commands/status.rs
//
// USE CASE: Classify the latest row of the batch log.

use anyhow::Context;
use std::path::PathBuf;

use scorewatch_core::application::latest_status;
use scorewatch_core::infrastructure::config::load_monitor_config;
use scorewatch_core::infrastructure::repository::FsMonitorStore;

use super::{checks_table, exit_on_alert, fmt_metric, level_badge};
use crate::cli::OutputFormat;

pub fn execute(project_dir: PathBuf, format: OutputFormat, fail_on_alert: bool) -> anyhow::Result<()> {
    let config = load_monitor_config(&project_dir)
        .with_context(|| format!("Invalid monitor config in {}", project_dir.display()))?;
    let store = FsMonitorStore::new(config.paths.monitor_paths(&project_dir));

    let Some((summary, status)) =
        latest_status(&store, config.thresholds).context("Could not read the batch log")?
    else {
        match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Table => println!("ℹ️  No completed run in the batch log yet."),
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "summary": summary, "status": status });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            println!("🚦 Latest run: {} ({})", summary.run_id, summary.batch_time);
            if let Some(version) = &summary.model_version {
                println!("   Model version: {}", version);
            }
            println!("{}", checks_table(&status.checks));
            if !summary.top_drift.is_empty() {
                let top: Vec<String> = summary
                    .top_drift
                    .iter()
                    .map(|t| format!("{} ({})", t.feature, fmt_metric(Some(t.psi))))
                    .collect();
                println!("   Top drift: {}", top.join(", "));
            }
            println!("   Overall: {}", level_badge(status.overall));
            if status.retrain_recommended {
                println!("   🔁 Retraining recommended.");
            }
        }
    }

    exit_on_alert(fail_on_alert, status.overall);
    Ok(())
}

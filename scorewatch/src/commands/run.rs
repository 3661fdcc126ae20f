// scorewatch/src/commands/run.rs
//
// USE CASE: Monitor one batch, or every CSV of a directory in path order.

use anyhow::{Context, bail};
use chrono::Local;
use std::path::{Path, PathBuf};

use scorewatch_core::application::{MonitorRun, run_monitor};
use scorewatch_core::domain::monitoring::{Level, ThresholdClassifier};
use scorewatch_core::infrastructure::adapters::DuckDbTableSource;
use scorewatch_core::infrastructure::config::load_monitor_config;
use scorewatch_core::infrastructure::fs::list_csv_files;
use scorewatch_core::infrastructure::repository::FsMonitorStore;

use super::{checks_table, exit_on_alert, fmt_metric, level_badge, new_table};
use crate::cli::OutputFormat;

pub fn execute(
    project_dir: PathBuf,
    batch: Option<PathBuf>,
    format: OutputFormat,
    fail_on_alert: bool,
) -> anyhow::Result<()> {
    let config = load_monitor_config(&project_dir)
        .with_context(|| format!("Invalid monitor config in {}", project_dir.display()))?;

    let target = batch.unwrap_or_else(|| project_dir.join(&config.paths.default_batch));
    let batches = if target.is_dir() {
        list_csv_files(&target)?
    } else {
        vec![target.clone()]
    };
    if batches.is_empty() {
        bail!("No CSV batch found in {}", target.display());
    }
    tracing::debug!(count = batches.len(), "Batches discovered");

    let source = DuckDbTableSource::in_memory()?;
    let store = FsMonitorStore::new(config.paths.monitor_paths(&project_dir));

    let mut overall = Level::Ok;
    let mut runs = Vec::with_capacity(batches.len());
    for path in &batches {
        if format == OutputFormat::Table {
            println!("🚀 Monitoring batch {}", path.display());
        }
        let run = run_monitor(
            &source,
            &store,
            &store,
            &config,
            path,
            Local::now().naive_local(),
        )
        .with_context(|| format!("Monitoring run failed for {}", path.display()))?;

        overall = ThresholdClassifier::overall([overall, run.status.overall]);
        match format {
            OutputFormat::Table => print_run(path, &run),
            OutputFormat::Json => runs.push(run),
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
    } else {
        println!(
            "✨ {} run(s) appended to {}",
            batches.len(),
            store.paths().batch_log.display()
        );
    }

    exit_on_alert(fail_on_alert, overall);
    Ok(())
}

fn print_run(path: &Path, run: &MonitorRun) {
    let mut features = new_table(["Feature", "PSI", "PSI level", "Missing", "Missing level", "Mean diff"]);
    for (metric, status) in run.feature_metrics.iter().zip(&run.feature_status) {
        features.add_row(vec![
            metric.feature.clone(),
            fmt_metric(metric.psi),
            level_badge(status.psi),
            format!("{:.2}%", metric.missing_rate_new * 100.0),
            level_badge(status.missing_rate),
            fmt_metric(metric.mean_diff),
        ]);
    }
    println!("{features}");
    println!("{}", checks_table(&run.status.checks));

    for d in &run.diagnostics {
        println!("   ⚠️  {}", d);
    }

    let s = &run.summary;
    println!(
        "📊 {}: AUC={} KS={} PSI_max={} ({})",
        s.run_id,
        fmt_metric(s.auc),
        fmt_metric(s.ks),
        fmt_metric(s.psi_max_value),
        s.psi_max_feature.as_deref().unwrap_or("N/A"),
    );
    println!(
        "🚦 Overall for {}: {}{}",
        path.display(),
        level_badge(run.status.overall),
        if run.status.retrain_recommended {
            " (retrain recommended)"
        } else {
            ""
        }
    );
}

// scorewatch-core/src/application/monitor.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::application::fairness::fairness_verdict;
use crate::domain::error::DomainError;
use crate::domain::monitoring::thresholds::FeatureStatus;
use crate::domain::monitoring::{
    BatchFeatureMetric, BatchSummary, DriftScorer, PerformanceScorer, RunDiagnostic, StatusReport,
    ThresholdClassifier, Thresholds,
};
use crate::domain::ports::{BatchLogRepository, ReferenceRepository, TableSource};
use crate::error::ScorewatchError;
use crate::infrastructure::config::MonitorConfig;

pub const BATCH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything one monitoring run produced.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorRun {
    pub feature_metrics: Vec<BatchFeatureMetric>,
    pub summary: BatchSummary,
    pub status: StatusReport,
    pub feature_status: Vec<FeatureStatus>,
    pub diagnostics: Vec<RunDiagnostic>,
}

/// `{run_name}-{batch}-{timestamp}`, millisecond resolution.
pub fn run_id(run_name: &str, batch_name: &str, batch_time: NaiveDateTime) -> String {
    format!(
        "{}-{}-{}",
        run_name,
        batch_name,
        batch_time.format("%Y%m%dT%H%M%S%3f")
    )
}

/// Scores one batch against the persisted reference and records the run.
///
/// A missing reference, a missing batch file or an empty batch abort the run
/// before anything is written. Otherwise the feature table is replaced first
/// and the summary row appended last, so a crash in between leaves no new row.
#[instrument(skip(source, references, batch_log, config), fields(batch = %batch_path.display(), run = %config.run_name))]
pub fn run_monitor(
    source: &dyn TableSource,
    references: &dyn ReferenceRepository,
    batch_log: &dyn BatchLogRepository,
    config: &MonitorConfig,
    batch_path: &Path,
    batch_time: NaiveDateTime,
) -> Result<MonitorRun, ScorewatchError> {
    let reference = references.load_reference()?;
    let batch = source.read_table(batch_path)?;
    if batch.is_empty() {
        return Err(DomainError::EmptyDataset(batch.name().to_string()).into());
    }

    // 1. Drift
    let drift = DriftScorer::new(&reference).score(&batch);

    // 2. Performance
    let performance =
        PerformanceScorer::new(config.labels.clone(), config.baseline.clone()).score(&batch);

    // 3. Fairness
    let fairness = fairness_verdict(&batch, config);

    let mut diagnostics = drift.diagnostics.clone();
    diagnostics.extend(performance.diagnostics.iter().cloned());
    diagnostics.extend(fairness.diagnostics.iter().cloned());

    let metrics = &performance.metrics;
    let summary = BatchSummary {
        run_id: run_id(&config.run_name, batch.name(), batch_time),
        run_name: config.run_name.clone(),
        batch_time: batch_time.format(BATCH_TIME_FORMAT).to_string(),
        data_window: config.data_window.clone(),
        model_version: config.model_version.clone(),
        data_source: config.data_source.clone(),
        report_owner: config.report_owner.clone(),
        dq_notes: config.dq_notes.clone(),
        auc: metrics.auc,
        ks: metrics.ks,
        auc_drop: metrics.auc_drop,
        ks_drop: metrics.ks_drop,
        psi_max_value: drift.psi_max.as_ref().map(|m| m.value),
        psi_max_feature: drift.psi_max.as_ref().map(|m| m.feature.clone()),
        max_missing_rate: drift.max_missing.as_ref().map(|m| m.value),
        max_missing_feature: drift.max_missing.as_ref().map(|m| m.feature.clone()),
        top_drift: drift.top_drift.clone(),
        pass_80_rule: fairness.pass_80_rule,
        fairness_groups: fairness.fairness_groups,
    };

    // 4. Persist: feature table first, summary row last
    batch_log.write_feature_metrics(&drift.features)?;
    batch_log.append_batch_row(&summary)?;

    // 5. Classify
    let classifier = ThresholdClassifier::new(config.thresholds);
    let status = classifier.classify_summary(&summary);
    let feature_status = classifier.classify_features(&drift.features);

    for d in &diagnostics {
        warn!(diagnostic = %d, "Run diagnostic");
    }
    info!(
        run_id = %summary.run_id,
        overall = %status.overall,
        auc = ?summary.auc,
        psi_max = ?summary.psi_max_value,
        "Batch monitored"
    );

    Ok(MonitorRun {
        feature_metrics: drift.features,
        summary,
        status,
        feature_status,
        diagnostics,
    })
}

/// Classification of the last completed run, if there is one.
#[instrument(skip_all)]
pub fn latest_status(
    batch_log: &dyn BatchLogRepository,
    thresholds: Thresholds,
) -> Result<Option<(BatchSummary, StatusReport)>, ScorewatchError> {
    let Some(summary) = batch_log.latest_batch_row()? else {
        info!("Batch log is empty");
        return Ok(None);
    };
    let status = ThresholdClassifier::new(thresholds).classify_summary(&summary);
    Ok(Some((summary, status)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::Table;
    use crate::domain::monitoring::{Baseline, Level, ReferenceBuilder};
    use crate::infrastructure::repository::{InMemoryMonitorStore, InMemoryTableSource};
    use chrono::NaiveDate;

    fn batch_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap()
    }

    fn batch() -> Table {
        Table::from_records(
            "X_new",
            &["dti", "int_rate", "label", "score"],
            &[
                &["10", "0.10", "0", "0.10"],
                &["12", "0.12", "0", "0.20"],
                &["14", "", "1", "0.70"],
                &["16", "0.16", "0", "0.30"],
                &["18", "0.18", "1", "0.80"],
                &["20", "0.20", "1", "0.60"],
                &["22", "0.22", "0", "0.40"],
                &["24", "0.24", "1", "0.90"],
            ],
        )
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            model_version: Some("v1".into()),
            baseline: Baseline {
                roc_auc: Some(0.90),
                ks: Some(0.50),
            },
            features: crate::infrastructure::config::FeatureList {
                numerical: vec!["dti".into(), "int_rate".into()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn store_for(table: &Table) -> InMemoryMonitorStore {
        let reference = ReferenceBuilder::new(config().features.numerical)
            .build(table)
            .unwrap();
        InMemoryMonitorStore::with_reference(reference)
    }

    #[test]
    fn test_same_data_has_no_drift_and_perfect_separation() {
        let source = InMemoryTableSource::default().with_table("X_new.csv", batch());
        let store = store_for(&batch());

        let run = run_monitor(
            &source,
            &store,
            &store,
            &config(),
            Path::new("X_new.csv"),
            batch_time(),
        )
        .unwrap();

        assert_eq!(run.summary.run_id, "daily_batch-X_new-20260301T083000000");
        assert_eq!(run.summary.batch_time, "2026-03-01 08:30:00");
        assert_eq!(run.feature_metrics.len(), 2);
        for m in &run.feature_metrics {
            assert!(m.psi.unwrap().abs() < 1e-9, "{} drifted", m.feature);
            assert!(m.mean_diff.unwrap().abs() < 1e-9);
        }
        assert_eq!(run.summary.auc, Some(1.0));
        assert_eq!(run.summary.ks, Some(1.0));
        assert_eq!(run.summary.auc_drop, Some(0.0));
        assert_eq!(run.summary.max_missing_feature.as_deref(), Some("int_rate"));
        assert_eq!(run.summary.max_missing_rate, Some(0.125));
        assert_eq!(run.summary.pass_80_rule, None);

        // missing rate 0.125 is above the 0.10 alert band
        assert_eq!(run.status.level_of("max_missing_rate"), Some(Level::Alert));
        assert_eq!(run.status.level_of("pass_80_rule"), Some(Level::NotAvailable));
        assert_eq!(run.status.overall, Level::Alert);
        assert!(!run.status.retrain_recommended);

        assert_eq!(store.batch_rows().len(), 1);
        assert_eq!(store.feature_metrics().len(), 2);
    }

    #[test]
    fn test_two_runs_append_two_rows() {
        let source = InMemoryTableSource::default().with_table("X_new.csv", batch());
        let store = store_for(&batch());
        for _ in 0..2 {
            run_monitor(&source, &store, &store, &config(), Path::new("X_new.csv"), batch_time())
                .unwrap();
        }
        assert_eq!(store.batch_rows().len(), 2);

        let (latest, status) = latest_status(&store, Thresholds::default()).unwrap().unwrap();
        assert_eq!(latest.model_version.as_deref(), Some("v1"));
        assert_eq!(status.run_id, latest.run_id);
    }

    #[test]
    fn test_run_ids_distinct_per_batch_and_millisecond() {
        let source = InMemoryTableSource::default()
            .with_table("2026-01.csv", batch())
            .with_table("2026-02.csv", Table::from_records("2026-02", &["dti"], &[&["11"]]));
        let store = store_for(&batch());

        let ids: Vec<String> = ["2026-01.csv", "2026-02.csv"]
            .into_iter()
            .map(|p| {
                run_monitor(&source, &store, &store, &config(), Path::new(p), batch_time())
                    .unwrap()
                    .summary
                    .run_id
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert!(ids[1].starts_with("daily_batch-2026-02-"));

        let later = batch_time() + chrono::Duration::milliseconds(5);
        assert_eq!(run_id("daily_batch", "X_new", later), "daily_batch-X_new-20260301T083000005");
    }

    #[test]
    fn test_missing_reference_writes_nothing() {
        let source = InMemoryTableSource::default().with_table("X_new.csv", batch());
        let store = InMemoryMonitorStore::default();

        let err = run_monitor(&source, &store, &store, &config(), Path::new("X_new.csv"), batch_time())
            .unwrap_err();

        assert!(err.is_missing_input());
        assert!(store.batch_rows().is_empty());
        assert!(latest_status(&store, Thresholds::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_or_empty_batch_is_fatal() {
        let store = store_for(&batch());
        let empty = Table::from_records("X_new", &["dti", "label", "score"], &[]);
        let source = InMemoryTableSource::default().with_table("empty.csv", empty);

        for path in ["absent.csv", "empty.csv"] {
            let err = run_monitor(&source, &store, &store, &config(), Path::new(path), batch_time())
                .unwrap_err();
            assert!(err.is_missing_input(), "{path}");
        }
        assert!(store.batch_rows().is_empty());
    }

    #[test]
    fn test_no_common_features_still_logs_a_row() {
        let other = Table::from_records(
            "other",
            &["zip", "label", "score"],
            &[&["1", "0", "0.1"], &["2", "1", "0.9"]],
        );
        let source = InMemoryTableSource::default().with_table("other.csv", other);
        let store = store_for(&batch());

        let run =
            run_monitor(&source, &store, &store, &config(), Path::new("other.csv"), batch_time())
                .unwrap();

        assert!(run.feature_metrics.is_empty());
        assert_eq!(run.summary.psi_max_value, None);
        assert_eq!(run.summary.auc, None);
        assert!(run.diagnostics.contains(&RunDiagnostic::NoCommonFeatures));
        assert!(
            run.diagnostics
                .iter()
                .any(|d| matches!(d, RunDiagnostic::InsufficientRows { valid: 2, .. }))
        );
        assert_eq!(run.status.level_of("psi_max"), Some(Level::NotAvailable));
        assert_eq!(store.batch_rows().len(), 1);
    }
}

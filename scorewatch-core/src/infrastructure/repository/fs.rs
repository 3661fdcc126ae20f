// scorewatch-core/src/infrastructure/repository/fs.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::monitoring::{BatchFeatureMetric, BatchSummary, ReferenceStats};
use crate::domain::ports::{BatchLogRepository, ReferenceRepository};
use crate::error::ScorewatchError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::{append_line, atomic_write, read_last_line};

/// Where the monitoring artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorPaths {
    pub reference: PathBuf,
    pub feature_metrics: PathBuf,
    pub batch_log: PathBuf,
}

impl MonitorPaths {
    /// Resolves relative artifact paths against `root`.
    pub fn rooted(self, root: &Path) -> Self {
        Self {
            reference: root.join(self.reference),
            feature_metrics: root.join(self.feature_metrics),
            batch_log: root.join(self.batch_log),
        }
    }
}

/// JSON reference, JSON feature-metrics table and JSONL batch log.
pub struct FsMonitorStore {
    paths: MonitorPaths,
}

impl FsMonitorStore {
    pub fn new(paths: MonitorPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &MonitorPaths {
        &self.paths
    }
}

impl ReferenceRepository for FsMonitorStore {
    #[instrument(skip(self), fields(path = %self.paths.reference.display()))]
    fn load_reference(&self) -> Result<ReferenceStats, ScorewatchError> {
        let path = &self.paths.reference;
        if !path.is_file() {
            return Err(InfrastructureError::ReferenceNotFound(path.display().to_string()).into());
        }

        let content = fs::read_to_string(path)?;
        let document: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| InfrastructureError::json(path, e))?;
        let reference =
            ReferenceStats::from_document(document).map_err(|e| InfrastructureError::json(path, e))?;

        debug!(features = reference.len(), "Reference loaded");
        Ok(reference)
    }

    #[instrument(skip(self, reference), fields(path = %self.paths.reference.display()))]
    fn save_reference(&self, reference: &ReferenceStats) -> Result<(), ScorewatchError> {
        let path = &self.paths.reference;
        let body = serde_json::to_string_pretty(reference)
            .map_err(|e| InfrastructureError::json(path, e))?;
        atomic_write(path, body)?;
        info!(features = reference.len(), "Reference saved");
        Ok(())
    }
}

impl BatchLogRepository for FsMonitorStore {
    fn write_feature_metrics(&self, metrics: &[BatchFeatureMetric]) -> Result<(), ScorewatchError> {
        let path = &self.paths.feature_metrics;
        let body =
            serde_json::to_string_pretty(metrics).map_err(|e| InfrastructureError::json(path, e))?;
        atomic_write(path, body)?;
        Ok(())
    }

    fn append_batch_row(&self, summary: &BatchSummary) -> Result<(), ScorewatchError> {
        let path = &self.paths.batch_log;
        let line = serde_json::to_string(summary).map_err(|e| InfrastructureError::json(path, e))?;
        append_line(path, &line)?;
        Ok(())
    }

    fn latest_batch_row(&self) -> Result<Option<BatchSummary>, ScorewatchError> {
        let path = &self.paths.batch_log;
        let Some(line) = read_last_line(path)? else {
            return Ok(None);
        };
        let summary = serde_json::from_str(&line).map_err(|e| InfrastructureError::json(path, e))?;
        Ok(Some(summary))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::monitoring::FeatureReference;
    use anyhow::Result;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn store(root: &Path) -> FsMonitorStore {
        FsMonitorStore::new(
            MonitorPaths {
                reference: "monitor/reference_stats.json".into(),
                feature_metrics: "monitor/metrics_log.json".into(),
                batch_log: "monitor/batch_metrics_log.jsonl".into(),
            }
            .rooted(root),
        )
    }

    fn summary(run_id: &str, auc: Option<f64>) -> BatchSummary {
        BatchSummary {
            run_id: run_id.into(),
            run_name: "daily_batch".into(),
            batch_time: "2026-03-01 08:00:00".into(),
            data_window: None,
            model_version: Some("v1".into()),
            data_source: None,
            report_owner: None,
            dq_notes: None,
            auc,
            ks: None,
            auc_drop: None,
            ks_drop: None,
            psi_max_value: None,
            psi_max_feature: None,
            max_missing_rate: None,
            max_missing_feature: None,
            top_drift: vec![],
            pass_80_rule: None,
            fairness_groups: None,
        }
    }

    #[test]
    fn test_missing_reference_is_not_found() -> Result<()> {
        let dir = tempdir()?;
        let err = store(dir.path()).load_reference().unwrap_err();
        assert!(err.is_missing_input());
        Ok(())
    }

    #[test]
    fn test_reference_save_then_load() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());

        let mut features = BTreeMap::new();
        features.insert(
            "dti".to_string(),
            FeatureReference {
                kind: Some("numeric".into()),
                count: 4,
                bins: Some(vec![0.0, 1.0, 2.0]),
                counts: Some(vec![2, 2]),
                ..Default::default()
            },
        );
        let reference = ReferenceStats::from_features(features).with_metadata(Some("v1".into()), None);

        store.save_reference(&reference)?;
        assert_eq!(store.load_reference()?, reference);
        Ok(())
    }

    #[test]
    fn test_bare_reference_mapping_is_accepted() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        fs::create_dir_all(dir.path().join("monitor"))?;
        fs::write(
            &store.paths().reference,
            r#"{"age": {"type": "numeric", "count": 3, "missing_rate": 0.0}}"#,
        )?;

        let reference = store.load_reference()?;
        assert_eq!(reference.len(), 1);
        assert!(reference.get("age").expect("age").is_numeric());
        Ok(())
    }

    #[test]
    fn test_corrupt_reference_is_json_error() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        fs::create_dir_all(dir.path().join("monitor"))?;
        fs::write(&store.paths().reference, "{not json")?;

        let err = store.load_reference().unwrap_err();
        assert!(!err.is_missing_input());
        assert!(err.to_string().contains("JSON"));
        Ok(())
    }

    #[test]
    fn test_batch_log_appends_and_reads_latest() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        assert_eq!(store.latest_batch_row()?, None);

        store.append_batch_row(&summary("run-1", Some(0.71)))?;
        store.append_batch_row(&summary("run-2", None))?;

        let content = fs::read_to_string(&store.paths().batch_log)?;
        assert_eq!(content.lines().count(), 2);
        let latest = store.latest_batch_row()?.expect("row");
        assert_eq!(latest.run_id, "run-2");
        assert_eq!(latest.auc, None);
        Ok(())
    }

    #[test]
    fn test_feature_metrics_are_replaced() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        let metric = |feature: &str| BatchFeatureMetric {
            feature: feature.into(),
            psi: Some(0.01),
            missing_rate_new: 0.0,
            mean_diff: None,
        };

        store.write_feature_metrics(&[metric("age"), metric("dti")])?;
        store.write_feature_metrics(&[metric("income")])?;

        let content = fs::read_to_string(&store.paths().feature_metrics)?;
        let rows: Vec<BatchFeatureMetric> = serde_json::from_str(&content)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].feature, "income");
        Ok(())
    }
}

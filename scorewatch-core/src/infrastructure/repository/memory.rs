// scorewatch-core/src/infrastructure/repository/memory.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::dataset::Table;
use crate::domain::monitoring::{BatchFeatureMetric, BatchSummary, ReferenceStats};
use crate::domain::ports::{BatchLogRepository, ReferenceRepository, TableSource};
use crate::error::ScorewatchError;
use crate::infrastructure::error::InfrastructureError;

/// Keeps every artifact in memory. Used for dry runs and tests.
#[derive(Default)]
pub struct InMemoryMonitorStore {
    reference: Mutex<Option<ReferenceStats>>,
    feature_metrics: Mutex<Vec<BatchFeatureMetric>>,
    batch_log: Mutex<Vec<BatchSummary>>,
}

fn poisoned() -> ScorewatchError {
    ScorewatchError::InternalError("In-memory store mutex poisoned".into())
}

impl InMemoryMonitorStore {
    pub fn with_reference(reference: ReferenceStats) -> Self {
        Self {
            reference: Mutex::new(Some(reference)),
            ..Default::default()
        }
    }

    pub fn feature_metrics(&self) -> Vec<BatchFeatureMetric> {
        self.feature_metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn batch_rows(&self) -> Vec<BatchSummary> {
        self.batch_log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ReferenceRepository for InMemoryMonitorStore {
    fn load_reference(&self) -> Result<ReferenceStats, ScorewatchError> {
        self.reference
            .lock()
            .map_err(|_| poisoned())?
            .clone()
            .ok_or_else(|| InfrastructureError::ReferenceNotFound("<memory>".into()).into())
    }

    fn save_reference(&self, reference: &ReferenceStats) -> Result<(), ScorewatchError> {
        *self.reference.lock().map_err(|_| poisoned())? = Some(reference.clone());
        Ok(())
    }
}

impl BatchLogRepository for InMemoryMonitorStore {
    fn write_feature_metrics(&self, metrics: &[BatchFeatureMetric]) -> Result<(), ScorewatchError> {
        *self.feature_metrics.lock().map_err(|_| poisoned())? = metrics.to_vec();
        Ok(())
    }

    fn append_batch_row(&self, summary: &BatchSummary) -> Result<(), ScorewatchError> {
        self.batch_log
            .lock()
            .map_err(|_| poisoned())?
            .push(summary.clone());
        Ok(())
    }

    fn latest_batch_row(&self) -> Result<Option<BatchSummary>, ScorewatchError> {
        Ok(self.batch_log.lock().map_err(|_| poisoned())?.last().cloned())
    }
}

/// Serves pre-built tables by path.
#[derive(Default)]
pub struct InMemoryTableSource {
    tables: HashMap<PathBuf, Table>,
}

impl InMemoryTableSource {
    pub fn with_table(mut self, path: impl Into<PathBuf>, table: Table) -> Self {
        self.tables.insert(path.into(), table);
        self
    }
}

impl TableSource for InMemoryTableSource {
    fn read_table(&self, path: &Path) -> Result<Table, ScorewatchError> {
        self.tables
            .get(path)
            .cloned()
            .ok_or_else(|| InfrastructureError::DataFileNotFound(path.display().to_string()).into())
    }
}

// scorewatch-core/src/domain/ports/repository.rs
//
// Persisted monitoring state: the reference is written once per model version
// and read by every run; the batch log only ever grows.

use crate::domain::monitoring::{BatchFeatureMetric, BatchSummary, ReferenceStats};
use crate::error::ScorewatchError;

pub trait ReferenceRepository: Send + Sync {
    fn load_reference(&self) -> Result<ReferenceStats, ScorewatchError>;

    fn save_reference(&self, reference: &ReferenceStats) -> Result<(), ScorewatchError>;
}

pub trait BatchLogRepository: Send + Sync {
    /// Replaces the feature-level table of the previous run.
    fn write_feature_metrics(&self, metrics: &[BatchFeatureMetric]) -> Result<(), ScorewatchError>;

    /// Appends exactly one row. Callers serialize concurrent runs themselves.
    fn append_batch_row(&self, summary: &BatchSummary) -> Result<(), ScorewatchError>;

    /// Last completed run, if any.
    fn latest_batch_row(&self) -> Result<Option<BatchSummary>, ScorewatchError>;
}

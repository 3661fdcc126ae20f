// scorewatch-core/src/domain/monitoring/mod.rs

pub mod drift;
pub mod fairness;
pub mod performance;
pub mod reference;
pub mod summary;
pub mod thresholds;

// Re-exports
pub use drift::{BatchFeatureMetric, DriftReport, DriftScorer, FeatureExtreme};
pub use fairness::{
    CutoffPolicy, FairnessAudit, FairnessColumns, FairnessReport, FairnessScorer, GroupFairness,
};
pub use performance::{Baseline, LabelColumns, PerformanceMetrics, PerformanceScorer};
pub use reference::{FeatureCoverage, FeatureReference, ReferenceBuilder, ReferenceStats};
pub use summary::{BatchSummary, RunDiagnostic, TopDrift};
pub use thresholds::{CheckResult, Level, StatusReport, ThresholdClassifier, Thresholds};

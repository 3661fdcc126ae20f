// scorewatch-core/src/domain/monitoring/drift.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::dataset::{Table, missing_rate};
use crate::domain::monitoring::reference::ReferenceStats;
use crate::domain::monitoring::summary::{RunDiagnostic, TOP_DRIFT_REF, TopDrift};
use crate::domain::stats;

/// Proportion used in place of an empty bin so the log term stays finite.
pub const PSI_FLOOR: f64 = 1e-8;
pub const TOP_DRIFT_COUNT: usize = 3;

/// One row of the feature-level metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFeatureMetric {
    pub feature: String,
    pub psi: Option<f64>,
    pub missing_rate_new: f64,
    pub mean_diff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtreme {
    pub feature: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriftReport {
    /// Ordered by feature name.
    pub features: Vec<BatchFeatureMetric>,
    pub psi_max: Option<FeatureExtreme>,
    pub max_missing: Option<FeatureExtreme>,
    pub top_drift: Vec<TopDrift>,
    pub diagnostics: Vec<RunDiagnostic>,
}

/// Population Stability Index of `values` against a reference histogram.
///
/// `values` are binned with the reference edges, never with fresh ones, so both
/// distributions share one partition. Returns `None` when the PSI cannot be
/// computed; callers must not read that as "no drift".
pub fn population_stability_index(values: &[f64], bins: &[f64], expected: &[u64]) -> Option<f64> {
    if values.is_empty() || bins.len() < 2 || expected.len() != bins.len() - 1 {
        return None;
    }

    let actual = stats::histogram(values, bins);
    let actual_total = actual.iter().sum::<u64>().max(1) as f64;
    let expected_total = expected.iter().sum::<u64>().max(1) as f64;

    let psi = actual
        .iter()
        .zip(expected)
        .map(|(&a, &e)| {
            let new_pct = floor_zero(a as f64 / actual_total);
            let ref_pct = floor_zero(e as f64 / expected_total);
            (new_pct - ref_pct) * (new_pct / ref_pct).ln()
        })
        .sum();

    Some(psi)
}

fn floor_zero(pct: f64) -> f64 {
    if pct == 0.0 { PSI_FLOOR } else { pct }
}

/// Scores a batch against the reference distribution of each shared feature.
pub struct DriftScorer<'a> {
    reference: &'a ReferenceStats,
}

impl<'a> DriftScorer<'a> {
    pub fn new(reference: &'a ReferenceStats) -> Self {
        Self { reference }
    }

    pub fn score(&self, batch: &Table) -> DriftReport {
        let mut report = DriftReport::default();

        // BTreeMap iteration: metrics come out ordered by feature name
        for (feature, base) in &self.reference.features {
            let Some(values) = batch.numeric_column(feature) else {
                continue;
            };

            let valid = stats::present(&values);
            let mean_diff = match (stats::mean(&valid), base.mean) {
                (Some(new_mean), Some(ref_mean)) => Some(new_mean - ref_mean),
                _ => None,
            };

            let psi = if base.is_numeric() {
                match (base.bins.as_deref(), base.counts.as_deref()) {
                    (Some(bins), Some(counts)) => population_stability_index(&valid, bins, counts),
                    _ => None,
                }
            } else {
                None
            };

            if psi.is_none() {
                debug!(feature = %feature, "PSI not computable");
                report.diagnostics.push(RunDiagnostic::UndefinedPsi {
                    feature: feature.clone(),
                });
            }

            report.features.push(BatchFeatureMetric {
                feature: feature.clone(),
                psi,
                missing_rate_new: missing_rate(&values),
                mean_diff,
            });
        }

        if report.features.is_empty() {
            warn!(
                batch = batch.name(),
                reference_features = self.reference.len(),
                "No common features between batch and reference"
            );
            report.diagnostics.push(RunDiagnostic::NoCommonFeatures);
            return report;
        }

        report.psi_max = first_max(report.features.iter().filter_map(|m| Some((m, m.psi?))));
        report.max_missing =
            first_max(report.features.iter().map(|m| (m, m.missing_rate_new)));
        report.top_drift = top_drift(&report.features);
        report
    }
}

/// First feature holding the maximum value (earlier features win ties).
fn first_max<'m>(
    candidates: impl Iterator<Item = (&'m BatchFeatureMetric, f64)>,
) -> Option<FeatureExtreme> {
    let mut best: Option<(&BatchFeatureMetric, f64)> = None;
    for (metric, value) in candidates {
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((metric, value));
        }
    }
    best.map(|(metric, value)| FeatureExtreme {
        feature: metric.feature.clone(),
        value,
    })
}

fn top_drift(features: &[BatchFeatureMetric]) -> Vec<TopDrift> {
    let mut ranked: Vec<(&str, f64)> = features
        .iter()
        .filter_map(|m| Some((m.feature.as_str(), m.psi?)))
        .collect();
    // stable: equal PSI keeps table order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(TOP_DRIFT_COUNT)
        .map(|(feature, psi)| TopDrift {
            feature: feature.to_string(),
            psi,
            reference: TOP_DRIFT_REF.to_string(),
        })
        .collect()
}

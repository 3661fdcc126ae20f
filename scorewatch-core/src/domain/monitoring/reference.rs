// scorewatch-core/src/domain/monitoring/reference.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::dataset::{Table, missing_rate};
use crate::domain::error::DomainError;
use crate::domain::stats;

pub const DEFAULT_BIN_COUNT: usize = 20;
pub const NUMERIC_KIND: &str = "numeric";

/// Baseline description of one feature, as captured from the training snapshot.
///
/// Every field is optional on the way in: artifacts written by older tooling
/// may lack the mean or even the histogram. Records produced by
/// [`ReferenceBuilder`] always fill everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureReference {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub missing_rate: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub p01: Option<f64>,
    #[serde(default)]
    pub p05: Option<f64>,
    #[serde(default)]
    pub p25: Option<f64>,
    #[serde(default)]
    pub p50: Option<f64>,
    #[serde(default)]
    pub p75: Option<f64>,
    #[serde(default)]
    pub p95: Option<f64>,
    #[serde(default)]
    pub p99: Option<f64>,
    #[serde(default)]
    pub bins: Option<Vec<f64>>,
    #[serde(default)]
    pub counts: Option<Vec<u64>>,
}

impl FeatureReference {
    /// Declared numeric, or carrying a histogram we can score against.
    pub fn is_numeric(&self) -> bool {
        let declared = self
            .kind
            .as_deref()
            .map(|k| matches!(k.to_ascii_lowercase().as_str(), "numeric" | "numerical"))
            .unwrap_or(false);
        declared || (self.bins.is_some() && self.counts.is_some())
    }

    /// Bin edges and counts, only when they describe a consistent histogram.
    pub fn histogram(&self) -> Option<(&[f64], &[u64])> {
        let bins = self.bins.as_deref()?;
        let counts = self.counts.as_deref()?;
        (bins.len() >= 2 && counts.len() == bins.len() - 1).then_some((bins, counts))
    }
}

/// Per-feature baseline for one model version. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<String>,
    pub features: BTreeMap<String, FeatureReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCoverage {
    pub feature: String,
    pub present: bool,
    pub has_histogram: bool,
}

impl ReferenceStats {
    pub fn from_features(features: BTreeMap<String, FeatureReference>) -> Self {
        Self {
            model_version: None,
            built_at: None,
            features,
        }
    }

    pub fn with_metadata(mut self, model_version: Option<String>, built_at: Option<String>) -> Self {
        self.model_version = model_version;
        self.built_at = built_at;
        self
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureReference> {
        self.features.get(feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Reports which expected features made it into the reference. The builder
    /// skips absent or all-missing columns silently, so strict callers check here.
    pub fn coverage(&self, expected: &[String]) -> Vec<FeatureCoverage> {
        expected
            .iter()
            .map(|feature| {
                let record = self.features.get(feature);
                FeatureCoverage {
                    feature: feature.clone(),
                    present: record.is_some(),
                    has_histogram: record.and_then(|r| r.histogram()).is_some(),
                }
            })
            .collect()
    }

    /// Normalizes the two accepted artifact shapes: `{"features": {...}}` or a bare
    /// feature mapping. Shape checks stay here so the scorers only see `ReferenceStats`.
    pub fn from_document(document: serde_json::Value) -> Result<Self, serde_json::Error> {
        let wrapped = document
            .as_object()
            .is_some_and(|obj| obj.get("features").is_some_and(|f| f.is_object()));

        if wrapped {
            serde_json::from_value(document)
        } else {
            let features: BTreeMap<String, FeatureReference> = serde_json::from_value(document)?;
            Ok(Self::from_features(features))
        }
    }
}

/// Builds [`ReferenceStats`] from a training snapshot.
#[derive(Debug, Clone)]
pub struct ReferenceBuilder {
    features: Vec<String>,
    bins: usize,
}

impl ReferenceBuilder {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            bins: DEFAULT_BIN_COUNT,
        }
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    pub fn build(&self, table: &Table) -> Result<ReferenceStats, DomainError> {
        if table.is_empty() {
            return Err(DomainError::EmptyDataset(table.name().to_string()));
        }

        let mut features = BTreeMap::new();
        for feature in &self.features {
            let Some(values) = table.numeric_column(feature) else {
                debug!(feature = %feature, "Feature absent from training data, skipped");
                continue;
            };
            match describe(&values, self.bins) {
                Some(record) => {
                    features.insert(feature.clone(), record);
                }
                None => debug!(feature = %feature, "No valid values, skipped"),
            }
        }

        Ok(ReferenceStats::from_features(features))
    }
}

fn describe(values: &[Option<f64>], bins: usize) -> Option<FeatureReference> {
    let valid = stats::present(values);
    let edges = stats::histogram_bin_edges(&valid, bins)?;
    let counts = stats::histogram(&valid, &edges);
    let sorted = stats::sorted(&valid);
    let q = |p: f64| stats::quantile_sorted(&sorted, p);

    Some(FeatureReference {
        kind: Some(NUMERIC_KIND.to_string()),
        count: valid.len() as u64,
        missing_rate: missing_rate(values),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean: stats::mean(&valid),
        p01: q(0.01),
        p05: q(0.05),
        p25: q(0.25),
        p50: q(0.50),
        p75: q(0.75),
        p95: q(0.95),
        p99: q(0.99),
        bins: Some(edges),
        counts: Some(counts),
    })
}

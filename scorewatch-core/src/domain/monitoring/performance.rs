// scorewatch-core/src/domain/monitoring/performance.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::dataset::Table;
use crate::domain::monitoring::summary::RunDiagnostic;

/// Below this many valid rows AUC/KS are too noisy to report.
pub const MIN_VALID_ROWS: usize = 5;

/// Label and score column names. Set explicitly, never guessed from the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelColumns {
    #[serde(default = "default_label_column")]
    pub y_col: String,
    #[serde(default = "default_score_column")]
    pub p_col: String,
}

impl Default for LabelColumns {
    fn default() -> Self {
        Self {
            y_col: default_label_column(),
            p_col: default_score_column(),
        }
    }
}

fn default_label_column() -> String {
    "label".to_string()
}
fn default_score_column() -> String {
    "score".to_string()
}

/// Performance recorded at model validation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    #[serde(default)]
    pub roc_auc: Option<f64>,
    #[serde(default)]
    pub ks: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub auc: Option<f64>,
    pub ks: Option<f64>,
    pub auc_drop: Option<f64>,
    pub ks_drop: Option<f64>,
    pub valid_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceReport {
    pub metrics: PerformanceMetrics,
    pub diagnostics: Vec<RunDiagnostic>,
}

/// Area under the ROC curve via the rank-sum formulation; tied scores share
/// their average rank, which matches the trapezoidal ROC area.
/// `labels[i]` is true for the positive ("bad") class.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    if labels.len() != scores.len() {
        return None;
    }
    let n_pos = labels.iter().filter(|&&y| y).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let order = ascending_order(scores);
    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1 ..= end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        pos_rank_sum += avg_rank * positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Maximum gap between the cumulative good and bad curves, walking scores upwards.
pub fn ks_statistic(labels: &[bool], scores: &[f64]) -> Option<f64> {
    if labels.len() != scores.len() || labels.is_empty() {
        return None;
    }
    let total_bad = labels.iter().filter(|&&y| y).count();
    let total_good = labels.len() - total_bad;
    let denom_bad = total_bad.max(1) as f64;
    let denom_good = total_good.max(1) as f64;

    let mut cum_bad = 0usize;
    let mut cum_good = 0usize;
    let mut ks: f64 = 0.0;
    for i in ascending_order(scores) {
        if labels[i] {
            cum_bad += 1;
        } else {
            cum_good += 1;
        }
        let gap = (cum_bad as f64 / denom_bad - cum_good as f64 / denom_good).abs();
        ks = ks.max(gap);
    }
    Some(ks)
}

/// Drop versus baseline, floored at zero: an improvement is not a negative drop.
pub fn drop_vs_baseline(current: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    Some((baseline? - current?).max(0.0))
}

fn ascending_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // stable sort
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order
}

pub struct PerformanceScorer {
    columns: LabelColumns,
    baseline: Baseline,
}

impl PerformanceScorer {
    pub fn new(columns: LabelColumns, baseline: Baseline) -> Self {
        Self { columns, baseline }
    }

    pub fn score(&self, batch: &Table) -> PerformanceReport {
        let mut report = PerformanceReport::default();

        let (labels, scores) = match (
            batch.numeric_column(&self.columns.y_col),
            batch.numeric_column(&self.columns.p_col),
        ) {
            (Some(y), Some(p)) => valid_pairs(&y, &p),
            (y, p) => {
                let missing: Vec<String> = [
                    (y.is_none(), &self.columns.y_col),
                    (p.is_none(), &self.columns.p_col),
                ]
                .into_iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, name)| name.clone())
                .collect();
                warn!(columns = ?missing, "Label/score columns missing, AUC/KS undefined");
                report
                    .diagnostics
                    .push(RunDiagnostic::MissingColumns { columns: missing });
                (Vec::new(), Vec::new())
            }
        };

        report.metrics.valid_rows = labels.len();

        if labels.len() < MIN_VALID_ROWS {
            if report.diagnostics.is_empty() {
                warn!(valid = labels.len(), "Insufficient valid rows for AUC/KS");
                report.diagnostics.push(RunDiagnostic::InsufficientRows {
                    valid: labels.len(),
                    required: MIN_VALID_ROWS,
                });
            }
        } else if labels.iter().all(|&y| y) || labels.iter().all(|&y| !y) {
            warn!("Need at least 2 label classes for AUC/KS");
            report.diagnostics.push(RunDiagnostic::SingleLabelClass);
        } else {
            report.metrics.auc = roc_auc(&labels, &scores);
            report.metrics.ks = ks_statistic(&labels, &scores);
            debug!(auc = ?report.metrics.auc, ks = ?report.metrics.ks, "Computed AUC/KS");
        }

        report.metrics.auc_drop = drop_vs_baseline(report.metrics.auc, self.baseline.roc_auc);
        report.metrics.ks_drop = drop_vs_baseline(report.metrics.ks, self.baseline.ks);
        report
    }
}

/// Rows where both label and score coerce, with a label of exactly 0 or 1.
fn valid_pairs(labels: &[Option<f64>], scores: &[Option<f64>]) -> (Vec<bool>, Vec<f64>) {
    labels
        .iter()
        .zip(scores)
        .filter_map(|(y, p)| match (y, p) {
            (Some(y), Some(p)) if *y == 0.0 || *y == 1.0 => Some((*y == 1.0, *p)),
            _ => None,
        })
        .unzip()
}

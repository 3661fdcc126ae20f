// scorewatch-core/src/domain/monitoring/summary.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal conditions met during a run. They never abort the run; the
/// affected metrics are reported as undefined instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunDiagnostic {
    NoCommonFeatures,
    UndefinedPsi { feature: String },
    MissingColumns { columns: Vec<String> },
    InsufficientRows { valid: usize, required: usize },
    SingleLabelClass,
    FairnessSkipped { reason: String },
    SmallFairnessGroups { column: String, groups: Vec<String> },
}

impl fmt::Display for RunDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunDiagnostic::NoCommonFeatures => {
                write!(f, "batch shares no feature with the reference; drift not scored")
            }
            RunDiagnostic::UndefinedPsi { feature } => {
                write!(f, "PSI undefined for '{}'", feature)
            }
            RunDiagnostic::MissingColumns { columns } => {
                write!(f, "missing columns: {}", columns.join(", "))
            }
            RunDiagnostic::InsufficientRows { valid, required } => write!(
                f,
                "only {} valid label/score rows (need {}); AUC/KS undefined",
                valid, required
            ),
            RunDiagnostic::SingleLabelClass => {
                write!(f, "labels contain a single class; AUC/KS undefined")
            }
            RunDiagnostic::FairnessSkipped { reason } => {
                write!(f, "fairness audit skipped: {}", reason)
            }
            RunDiagnostic::SmallFairnessGroups { column, groups } => write!(
                f,
                "'{}' groups below the minimum size, rates are unreliable: {}",
                column,
                groups.join(", ")
            ),
        }
    }
}

pub const TOP_DRIFT_REF: &str = "ref-dist";

/// One entry of the "top drifted features" list carried by the batch summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDrift {
    pub feature: String,
    pub psi: f64,
    #[serde(rename = "ref")]
    pub reference: String,
}

/// One row of the append-only batch log.
///
/// Every field is serialized on every row, undefined values included (`null`):
/// downstream readers tell "no data" apart from zero by the explicit null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: String,
    pub run_name: String,
    pub batch_time: String,
    pub data_window: Option<String>,
    pub model_version: Option<String>,
    pub data_source: Option<String>,
    pub report_owner: Option<String>,
    pub dq_notes: Option<String>,

    pub auc: Option<f64>,
    pub ks: Option<f64>,
    pub auc_drop: Option<f64>,
    pub ks_drop: Option<f64>,

    pub psi_max_value: Option<f64>,
    pub psi_max_feature: Option<String>,
    pub max_missing_rate: Option<f64>,
    pub max_missing_feature: Option<String>,
    pub top_drift: Vec<TopDrift>,

    pub pass_80_rule: Option<bool>,
    pub fairness_groups: Option<String>,
}

// scorewatch-core/src/domain/monitoring/thresholds.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::domain::monitoring::drift::BatchFeatureMetric;
use crate::domain::monitoring::summary::BatchSummary;

// --- CONFIGURATION ---

/// Alert bands. Key names match the flat keys of the monitor config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_psi_bands"))]
pub struct Thresholds {
    #[serde(rename = "psi_threshold_warn", default = "default_psi_warn")]
    #[validate(range(min = 0.0, message = "PSI warn threshold must be >= 0"))]
    pub psi_warn: f64,

    #[serde(rename = "psi_threshold_alert", default = "default_psi_alert")]
    #[validate(range(min = 0.0, message = "PSI alert threshold must be >= 0"))]
    pub psi_alert: f64,

    #[serde(default = "default_auc_drop_alert")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub auc_drop_alert: f64,

    #[serde(default = "default_ks_drop_alert")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub ks_drop_alert: f64,

    #[serde(default = "default_missing_rate_alert")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub missing_rate_alert: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            psi_warn: default_psi_warn(),
            psi_alert: default_psi_alert(),
            auc_drop_alert: default_auc_drop_alert(),
            ks_drop_alert: default_ks_drop_alert(),
            missing_rate_alert: default_missing_rate_alert(),
        }
    }
}

fn default_psi_warn() -> f64 {
    0.10
}
fn default_psi_alert() -> f64 {
    0.20
}
fn default_auc_drop_alert() -> f64 {
    0.05
}
fn default_ks_drop_alert() -> f64 {
    0.10
}
fn default_missing_rate_alert() -> f64 {
    0.10
}

fn validate_psi_bands(t: &Thresholds) -> Result<(), ValidationError> {
    if t.psi_warn > t.psi_alert {
        let mut err = ValidationError::new("psi_bands");
        err.message = Some("psi_threshold_warn must not exceed psi_threshold_alert".into());
        return Err(err);
    }
    Ok(())
}

// --- LEVELS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "ALERT")]
    Alert,
    /// No data. Deliberately distinct from `Ok`.
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Ok => "OK",
            Level::Warn => "WARN",
            Level::Alert => "ALERT",
            Level::NotAvailable => "N/A",
        };
        f.write_str(label)
    }
}

// --- REPORTS ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: String,
    /// Feature or group the value refers to, when there is one.
    pub subject: Option<String>,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub run_id: String,
    pub checks: Vec<CheckResult>,
    pub overall: Level,
    /// PSI or a performance drop is in ALERT.
    pub retrain_recommended: bool,
}

impl StatusReport {
    pub fn level_of(&self, check: &str) -> Option<Level> {
        self.checks.iter().find(|c| c.check == check).map(|c| c.level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStatus {
    pub feature: String,
    pub psi: Level,
    pub missing_rate: Level,
}

// --- CLASSIFIER ---

pub struct ThresholdClassifier {
    thresholds: Thresholds,
}

impl ThresholdClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Three bands: `<= warn` OK, `<= alert` WARN, above ALERT.
    pub fn psi(&self, value: Option<f64>) -> Level {
        match value {
            None => Level::NotAvailable,
            Some(v) if v <= self.thresholds.psi_warn => Level::Ok,
            Some(v) if v <= self.thresholds.psi_alert => Level::Warn,
            Some(_) => Level::Alert,
        }
    }

    pub fn auc_drop(&self, value: Option<f64>) -> Level {
        binary(value, self.thresholds.auc_drop_alert)
    }

    pub fn ks_drop(&self, value: Option<f64>) -> Level {
        binary(value, self.thresholds.ks_drop_alert)
    }

    pub fn missing_rate(&self, value: Option<f64>) -> Level {
        binary(value, self.thresholds.missing_rate_alert)
    }

    pub fn fairness(&self, pass_80_rule: Option<bool>) -> Level {
        match pass_80_rule {
            Some(true) => Level::Ok,
            Some(false) => Level::Alert,
            None => Level::NotAvailable,
        }
    }

    /// ALERT beats WARN beats OK. `N/A` never moves the aggregate.
    pub fn overall(levels: impl IntoIterator<Item = Level>) -> Level {
        let mut overall = Level::Ok;
        for level in levels {
            match level {
                Level::Alert => return Level::Alert,
                Level::Warn => overall = Level::Warn,
                Level::Ok | Level::NotAvailable => {}
            }
        }
        overall
    }

    pub fn classify_summary(&self, summary: &BatchSummary) -> StatusReport {
        let t = &self.thresholds;
        let checks = vec![
            CheckResult {
                check: "psi_max".into(),
                subject: summary.psi_max_feature.clone(),
                value: summary.psi_max_value,
                threshold: Some(t.psi_alert),
                level: self.psi(summary.psi_max_value),
            },
            CheckResult {
                check: "auc_drop".into(),
                subject: None,
                value: summary.auc_drop,
                threshold: Some(t.auc_drop_alert),
                level: self.auc_drop(summary.auc_drop),
            },
            CheckResult {
                check: "ks_drop".into(),
                subject: None,
                value: summary.ks_drop,
                threshold: Some(t.ks_drop_alert),
                level: self.ks_drop(summary.ks_drop),
            },
            CheckResult {
                check: "max_missing_rate".into(),
                subject: summary.max_missing_feature.clone(),
                value: summary.max_missing_rate,
                threshold: Some(t.missing_rate_alert),
                level: self.missing_rate(summary.max_missing_rate),
            },
            CheckResult {
                check: "pass_80_rule".into(),
                subject: summary.fairness_groups.clone(),
                value: None,
                threshold: None,
                level: self.fairness(summary.pass_80_rule),
            },
        ];

        let retrain_recommended = checks
            .iter()
            .filter(|c| matches!(c.check.as_str(), "psi_max" | "auc_drop" | "ks_drop"))
            .any(|c| c.level == Level::Alert);

        StatusReport {
            run_id: summary.run_id.clone(),
            overall: Self::overall(checks.iter().map(|c| c.level)),
            checks,
            retrain_recommended,
        }
    }

    pub fn classify_features(&self, metrics: &[BatchFeatureMetric]) -> Vec<FeatureStatus> {
        metrics
            .iter()
            .map(|m| FeatureStatus {
                feature: m.feature.clone(),
                psi: self.psi(m.psi),
                missing_rate: self.missing_rate(Some(m.missing_rate_new)),
            })
            .collect()
    }
}

/// Performance and missingness have no WARN tier.
fn binary(value: Option<f64>, alert: f64) -> Level {
    match value {
        None => Level::NotAvailable,
        Some(v) if v >= alert => Level::Alert,
        Some(_) => Level::Ok,
    }
}

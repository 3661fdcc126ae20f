// scorewatch-core/src/infrastructure/config/monitor.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::monitoring::reference::DEFAULT_BIN_COUNT;
use crate::domain::monitoring::{
    Baseline, CutoffPolicy, FairnessColumns, LabelColumns, Thresholds,
};
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::repository::MonitorPaths;

pub const CONFIG_CANDIDATES: [&str; 2] = ["scorewatch.yaml", "monitor/config.yaml"];

pub const DEFAULT_FEATURES: [&str; 7] = [
    "int_rate",
    "dti",
    "fico_mid",
    "installment_to_income",
    "log_loan_amnt",
    "log_annual_inc",
    "credit_history_length",
];

/// Monitor settings. Every key is optional; thresholds sit at the top level
/// of the file (`psi_threshold_warn`, `auc_drop_alert`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MonitorConfig {
    #[serde(default = "default_run_name")]
    pub run_name: String,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub data_window: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub report_owner: Option<String>,
    #[serde(default)]
    pub dq_notes: Option<String>,

    #[serde(flatten)]
    #[validate(nested)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub labels: LabelColumns,
    #[serde(default)]
    pub baseline: Baseline,
    #[serde(default)]
    #[validate(nested)]
    pub features: FeatureList,

    #[serde(default)]
    #[validate(nested)]
    pub fairness: Option<FairnessConfig>,
    /// Manual fairness verdict, used when no audit is configured.
    #[serde(default)]
    pub pass_80_rule: Option<bool>,
    #[serde(default)]
    pub fairness_groups: Option<String>,

    #[serde(default)]
    pub paths: PathsConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            run_name: default_run_name(),
            model_version: None,
            data_window: None,
            data_source: None,
            report_owner: None,
            dq_notes: None,
            thresholds: Thresholds::default(),
            labels: LabelColumns::default(),
            baseline: Baseline::default(),
            features: FeatureList::default(),
            fairness: None,
            pass_80_rule: None,
            fairness_groups: None,
            paths: PathsConfig::default(),
        }
    }
}

fn default_run_name() -> String {
    "daily_batch".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureList {
    #[serde(default = "default_numerical")]
    pub numerical: Vec<String>,
    /// Equal-width histogram bins per feature in the reference.
    #[serde(default = "default_bins")]
    #[validate(range(min = 1))]
    pub bins: usize,
}

impl Default for FeatureList {
    fn default() -> Self {
        Self {
            numerical: default_numerical(),
            bins: default_bins(),
        }
    }
}

fn default_bins() -> usize {
    DEFAULT_BIN_COUNT
}

fn default_numerical() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FairnessConfig {
    #[validate(length(min = 1, message = "at least one group column is required"))]
    pub group_columns: Vec<String>,
    /// Falls back to `labels.y_col`.
    #[serde(default)]
    pub outcome_column: Option<String>,
    /// Falls back to `labels.p_col`.
    #[serde(default)]
    pub score_column: Option<String>,
    #[serde(default = "default_target_approval")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub target_approval: f64,
    #[serde(default)]
    pub policy: CutoffPolicy,
    #[serde(default)]
    pub min_group_size: usize,
}

fn default_target_approval() -> f64 {
    0.40
}

impl FairnessConfig {
    pub fn columns_for(&self, group: &str, labels: &LabelColumns) -> FairnessColumns {
        FairnessColumns {
            outcome: self
                .outcome_column
                .clone()
                .unwrap_or_else(|| labels.y_col.clone()),
            score: self
                .score_column
                .clone()
                .unwrap_or_else(|| labels.p_col.clone()),
            group: group.to_string(),
        }
    }
}

/// Artifact locations, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_reference_path")]
    pub reference: PathBuf,
    #[serde(default = "default_feature_metrics_path")]
    pub feature_metrics: PathBuf,
    #[serde(default = "default_batch_log_path")]
    pub batch_log: PathBuf,
    #[serde(default = "default_batch_path")]
    pub default_batch: PathBuf,
    #[serde(default = "default_training_path")]
    pub training: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            reference: default_reference_path(),
            feature_metrics: default_feature_metrics_path(),
            batch_log: default_batch_log_path(),
            default_batch: default_batch_path(),
            training: default_training_path(),
        }
    }
}

fn default_reference_path() -> PathBuf {
    PathBuf::from("monitor/reference_stats.json")
}
fn default_feature_metrics_path() -> PathBuf {
    PathBuf::from("monitor/metrics_log.json")
}
fn default_batch_log_path() -> PathBuf {
    PathBuf::from("monitor/batch_metrics_log.jsonl")
}
fn default_batch_path() -> PathBuf {
    PathBuf::from("monitor/X_new.csv")
}
fn default_training_path() -> PathBuf {
    PathBuf::from("X_train.csv")
}

impl PathsConfig {
    pub fn monitor_paths(&self, project_dir: &Path) -> MonitorPaths {
        MonitorPaths {
            reference: self.reference.clone(),
            feature_metrics: self.feature_metrics.clone(),
            batch_log: self.batch_log.clone(),
        }
        .rooted(project_dir)
    }
}

// --- LOADER ---

#[instrument(skip(project_dir), fields(dir = %project_dir.display()))]
pub fn load_monitor_config(project_dir: &Path) -> Result<MonitorConfig, InfrastructureError> {
    let mut config = match find_config_file(project_dir) {
        Some(path) => {
            info!(path = ?path, "Loading monitor config");
            parse_monitor_config(&fs::read_to_string(&path)?)?
        }
        None => {
            info!("No monitor config found, using defaults");
            MonitorConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

pub fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file())
}

/// Parses YAML text; an empty document yields the defaults.
pub fn parse_monitor_config(content: &str) -> Result<MonitorConfig, InfrastructureError> {
    if content.trim().is_empty() {
        return Ok(MonitorConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Env layer on top of the file: `SCOREWATCH_MODEL_VERSION`, `SCOREWATCH_RUN_NAME`.
pub fn apply_env_overrides(config: &mut MonitorConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("SCOREWATCH_MODEL_VERSION") {
        info!(old = ?config.model_version, new = %val, "Overriding model version via ENV");
        config.model_version = Some(val);
    }
    if let Some(val) = lookup("SCOREWATCH_RUN_NAME") {
        info!(old = %config.run_name, new = %val, "Overriding run name via ENV");
        config.run_name = val;
    }
}

// scorewatch-core/src/application/fairness.rs

use std::path::Path;
use tracing::{info, instrument, warn};

use crate::domain::Table;
use crate::domain::monitoring::{FairnessAudit, FairnessColumns, FairnessScorer, RunDiagnostic};
use crate::domain::ports::TableSource;
use crate::error::ScorewatchError;
use crate::infrastructure::config::{FairnessConfig, MonitorConfig};

/// Explicit audit request: missing columns or an empty batch are errors.
#[instrument(skip(source, columns), fields(path = %path.display(), group = %columns.group))]
pub fn run_fairness_audit(
    source: &dyn TableSource,
    path: &Path,
    columns: FairnessColumns,
    target_approval: f64,
    min_group_size: usize,
) -> Result<FairnessAudit, ScorewatchError> {
    let table = source.read_table(path)?;
    let audit = FairnessScorer::new(columns, target_approval)?
        .with_min_group_size(min_group_size)
        .audit(&table)?;

    info!(
        rows = audit.rows_used,
        global_ratio = ?audit.global.disparate_impact,
        group_ratio = ?audit.group_specific.disparate_impact,
        "Fairness audit complete"
    );
    Ok(audit)
}

/// Fairness fields of a batch summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FairnessVerdict {
    pub pass_80_rule: Option<bool>,
    pub fairness_groups: Option<String>,
    pub diagnostics: Vec<RunDiagnostic>,
}

/// Scores the configured group columns, or falls back to the manual verdict
/// of the config. Inside a monitoring run, audit failures only downgrade the
/// verdict to undefined.
pub fn fairness_verdict(table: &Table, config: &MonitorConfig) -> FairnessVerdict {
    match &config.fairness {
        Some(fairness) => audit_configured(table, fairness, config),
        None => FairnessVerdict {
            pass_80_rule: config.pass_80_rule,
            fairness_groups: config.fairness_groups.clone(),
            diagnostics: Vec::new(),
        },
    }
}

fn audit_configured(table: &Table, fairness: &FairnessConfig, config: &MonitorConfig) -> FairnessVerdict {
    let mut verdict = FairnessVerdict {
        fairness_groups: Some(fairness.group_columns.join(", ")),
        ..Default::default()
    };

    let mut outcomes = Vec::with_capacity(fairness.group_columns.len());
    for group in &fairness.group_columns {
        let columns = fairness.columns_for(group, &config.labels);
        let report = FairnessScorer::new(columns, fairness.target_approval).and_then(|scorer| {
            scorer
                .with_min_group_size(fairness.min_group_size)
                .score(table, fairness.policy)
        });

        match report {
            Ok(report) => {
                let small = report.small_groups();
                if !small.is_empty() {
                    warn!(group = %group, small = ?small, "Fairness groups below the minimum size");
                    verdict.diagnostics.push(RunDiagnostic::SmallFairnessGroups {
                        column: group.clone(),
                        groups: small.into_iter().map(str::to_string).collect(),
                    });
                }
                outcomes.push(report.pass_80_rule);
            }
            Err(e) => {
                warn!(group = %group, error = %e, "Fairness check skipped");
                verdict.diagnostics.push(RunDiagnostic::FairnessSkipped {
                    reason: e.to_string(),
                });
                outcomes.push(None);
            }
        }
    }

    verdict.pass_80_rule = combine(&outcomes);
    verdict
}

/// Any failure fails; a pass needs every group column to pass.
fn combine(outcomes: &[Option<bool>]) -> Option<bool> {
    if outcomes.contains(&Some(false)) {
        Some(false)
    } else if !outcomes.is_empty() && outcomes.iter().all(|o| *o == Some(true)) {
        Some(true)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::monitoring::CutoffPolicy;
    use crate::infrastructure::repository::InMemoryTableSource;

    /// Group A scores low (approved more often) than group B under a global cutoff.
    fn skewed() -> Table {
        Table::from_records(
            "batch",
            &["label", "score", "region"],
            &[
                &["0", "0.1", "A"],
                &["0", "0.2", "A"],
                &["0", "0.3", "A"],
                &["1", "0.4", "A"],
                &["1", "0.5", "A"],
                &["0", "0.6", "B"],
                &["0", "0.7", "B"],
                &["1", "0.8", "B"],
                &["1", "0.9", "B"],
                &["1", "0.95", "B"],
            ],
        )
    }

    fn fairness(groups: &[&str]) -> FairnessConfig {
        FairnessConfig {
            group_columns: groups.iter().map(|g| g.to_string()).collect(),
            outcome_column: None,
            score_column: None,
            target_approval: 0.4,
            policy: CutoffPolicy::Global,
            min_group_size: 0,
        }
    }

    #[test]
    fn test_explicit_audit_reports_both_policies() {
        let source = InMemoryTableSource::default().with_table("b.csv", skewed());
        let audit = run_fairness_audit(
            &source,
            Path::new("b.csv"),
            FairnessColumns {
                outcome: "label".into(),
                score: "score".into(),
                group: "region".into(),
            },
            0.4,
            0,
        )
        .unwrap();

        assert_eq!(audit.rows_used, 10);
        assert_eq!(audit.global.pass_80_rule, Some(false));
        assert_eq!(audit.group_specific.pass_80_rule, Some(true));
    }

    #[test]
    fn test_explicit_audit_missing_column_is_error() {
        let source = InMemoryTableSource::default().with_table("b.csv", skewed());
        let result = run_fairness_audit(
            &source,
            Path::new("b.csv"),
            FairnessColumns {
                outcome: "label".into(),
                score: "score".into(),
                group: "gender".into(),
            },
            0.4,
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_verdict_falls_back_to_manual_config() {
        let config = MonitorConfig {
            pass_80_rule: Some(true),
            fairness_groups: Some("income_group".into()),
            ..Default::default()
        };
        let verdict = fairness_verdict(&skewed(), &config);
        assert_eq!(verdict.pass_80_rule, Some(true));
        assert_eq!(verdict.fairness_groups.as_deref(), Some("income_group"));

        let verdict = fairness_verdict(&skewed(), &MonitorConfig::default());
        assert_eq!(verdict.pass_80_rule, None);
    }

    #[test]
    fn test_configured_audit_drives_verdict() {
        let config = MonitorConfig {
            fairness: Some(fairness(&["region"])),
            ..Default::default()
        };
        let verdict = fairness_verdict(&skewed(), &config);
        assert_eq!(verdict.pass_80_rule, Some(false));
        assert_eq!(verdict.fairness_groups.as_deref(), Some("region"));
        assert!(verdict.diagnostics.is_empty());
    }

    #[test]
    fn test_small_groups_reported_as_diagnostic() {
        let mut config = fairness(&["region"]);
        config.min_group_size = 6;
        let config = MonitorConfig {
            fairness: Some(config),
            ..Default::default()
        };
        let verdict = fairness_verdict(&skewed(), &config);

        // A and B (5 rows each) are pooled into OTHER, which still has 10 rows
        assert!(verdict.diagnostics.is_empty());

        let mut config = fairness(&["region"]);
        config.min_group_size = 11;
        let config = MonitorConfig {
            fairness: Some(config),
            ..Default::default()
        };
        let verdict = fairness_verdict(&skewed(), &config);
        assert_eq!(
            verdict.diagnostics,
            vec![RunDiagnostic::SmallFairnessGroups {
                column: "region".into(),
                groups: vec!["OTHER".into()],
            }]
        );
    }

    #[test]
    fn test_missing_group_column_downgrades_to_undefined() {
        let config = MonitorConfig {
            fairness: Some(fairness(&["gender"])),
            ..Default::default()
        };
        let verdict = fairness_verdict(&skewed(), &config);
        assert_eq!(verdict.pass_80_rule, None);
        assert_eq!(verdict.diagnostics.len(), 1);
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(&[Some(true), Some(true)]), Some(true));
        assert_eq!(combine(&[Some(true), None]), None);
        assert_eq!(combine(&[None, Some(false)]), Some(false));
        assert_eq!(combine(&[]), None);
    }
}

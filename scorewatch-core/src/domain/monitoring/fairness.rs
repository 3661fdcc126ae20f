// scorewatch-core/src/domain/monitoring/fairness.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::dataset::{Table, coerce_numeric};
use crate::domain::error::DomainError;
use crate::domain::stats;

/// The "80% rule": lowest over highest approval rate must reach this ratio.
pub const FOUR_FIFTHS: f64 = 0.8;
pub const OTHER_GROUP: &str = "OTHER";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum CutoffPolicy {
    /// One cutoff for everybody: the target quantile of all scores.
    #[default]
    Global,
    /// One cutoff per group: the target quantile of that group's scores.
    GroupSpecific,
}

impl std::fmt::Display for CutoffPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutoffPolicy::Global => write!(f, "global_cutoff"),
            CutoffPolicy::GroupSpecific => write!(f, "group_cutoffs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessColumns {
    /// True outcome, 0 = good.
    pub outcome: String,
    /// Risk score, lower = lower risk.
    pub score: String,
    /// Protected attribute.
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFairness {
    pub group: String,
    pub n: usize,
    pub cutoff: f64,
    pub approval_rate: f64,
    /// Approval rate among rows with a good outcome.
    pub tpr_good: Option<f64>,
    /// Approval rate relative to the largest group.
    pub dir_vs_majority: Option<f64>,
    /// Fewer rows than the configured minimum, `OTHER` included.
    pub small_sample: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairnessReport {
    pub policy: CutoffPolicy,
    pub target_approval: f64,
    /// Set for the global policy only; group cutoffs live on each group.
    pub used_cutoff: Option<f64>,
    /// Largest group first.
    pub groups: Vec<GroupFairness>,
    pub disparate_impact: Option<f64>,
    pub tpr_good_range: Option<f64>,
    pub pass_80_rule: Option<bool>,
}

impl FairnessReport {
    /// Groups flagged as too small to read the rates with confidence.
    pub fn small_groups(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| g.small_sample)
            .map(|g| g.group.as_str())
            .collect()
    }
}

/// Both policies on the same rows, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairnessAudit {
    pub group_column: String,
    pub rows_used: usize,
    pub global: FairnessReport,
    pub group_specific: FairnessReport,
}

/// min/max of the approval rates; undefined without groups or when nobody is approved.
pub fn disparate_impact(rates: &[f64]) -> Option<f64> {
    let max = rates.iter().copied().reduce(f64::max)?;
    let min = rates.iter().copied().reduce(f64::min)?;
    (max > 0.0).then(|| min / max)
}

pub fn passes_four_fifths(ratio: Option<f64>) -> Option<bool> {
    ratio.map(|r| r >= FOUR_FIFTHS)
}

struct Applicant {
    group: String,
    score: f64,
    good: bool,
}

pub struct FairnessScorer {
    columns: FairnessColumns,
    target_approval: f64,
    min_group_size: Option<usize>,
}

impl FairnessScorer {
    pub fn new(columns: FairnessColumns, target_approval: f64) -> Result<Self, DomainError> {
        if !(target_approval > 0.0 && target_approval < 1.0) {
            return Err(DomainError::InvalidTargetApproval(target_approval));
        }
        Ok(Self {
            columns,
            target_approval,
            min_group_size: None,
        })
    }

    /// Groups smaller than `min` are pooled into [`OTHER_GROUP`] before scoring.
    /// A group still under `min` after pooling is flagged `small_sample`.
    pub fn with_min_group_size(mut self, min: usize) -> Self {
        self.min_group_size = (min > 1).then_some(min);
        self
    }

    pub fn audit(&self, table: &Table) -> Result<FairnessAudit, DomainError> {
        let applicants = self.applicants(table)?;
        Ok(FairnessAudit {
            group_column: self.columns.group.clone(),
            rows_used: applicants.len(),
            global: self.evaluate(&applicants, CutoffPolicy::Global),
            group_specific: self.evaluate(&applicants, CutoffPolicy::GroupSpecific),
        })
    }

    pub fn score(&self, table: &Table, policy: CutoffPolicy) -> Result<FairnessReport, DomainError> {
        let applicants = self.applicants(table)?;
        Ok(self.evaluate(&applicants, policy))
    }

    fn applicants(&self, table: &Table) -> Result<Vec<Applicant>, DomainError> {
        let column = |name: &str| {
            table.text_column(name).ok_or_else(|| DomainError::MissingColumn {
                dataset: table.name().to_string(),
                column: name.to_string(),
            })
        };
        let outcomes = column(&self.columns.outcome)?;
        let scores = column(&self.columns.score)?;
        let groups = column(&self.columns.group)?;

        let mut applicants: Vec<Applicant> = outcomes
            .into_iter()
            .zip(scores)
            .zip(groups)
            .filter_map(|((outcome, score), group)| {
                let group = group.map(str::trim).filter(|g| !g.is_empty())?;
                let outcome = outcome.filter(|o| !o.trim().is_empty())?;
                Some(Applicant {
                    group: group.to_string(),
                    score: coerce_numeric(score)?,
                    // only a numeric 0 is good; unreadable outcomes count as not good
                    good: coerce_numeric(Some(outcome)) == Some(0.0),
                })
            })
            .collect();

        if applicants.is_empty() {
            return Err(DomainError::EmptyDataset(table.name().to_string()));
        }

        if let Some(min) = self.min_group_size {
            let mut sizes: BTreeMap<String, usize> = BTreeMap::new();
            for a in &applicants {
                *sizes.entry(a.group.clone()).or_default() += 1;
            }
            for a in applicants.iter_mut() {
                if sizes.get(&a.group).is_some_and(|&n| n < min) {
                    a.group = OTHER_GROUP.to_string();
                }
            }
        }

        Ok(applicants)
    }

    fn evaluate(&self, applicants: &[Applicant], policy: CutoffPolicy) -> FairnessReport {
        let mut by_group: BTreeMap<&str, Vec<&Applicant>> = BTreeMap::new();
        for a in applicants {
            by_group.entry(a.group.as_str()).or_default().push(a);
        }

        let all_scores: Vec<f64> = applicants.iter().map(|a| a.score).collect();
        let global_cutoff = stats::quantile(&all_scores, self.target_approval);

        let mut groups: Vec<GroupFairness> = by_group
            .into_iter()
            .filter_map(|(group, members)| {
                let cutoff = match policy {
                    CutoffPolicy::Global => global_cutoff?,
                    CutoffPolicy::GroupSpecific => {
                        let scores: Vec<f64> = members.iter().map(|a| a.score).collect();
                        stats::quantile(&scores, self.target_approval)?
                    }
                };
                Some(group_stats(group, &members, cutoff))
            })
            .collect();

        // largest group first, ties by name
        groups.sort_by(|a, b| b.n.cmp(&a.n).then_with(|| a.group.cmp(&b.group)));

        let majority_rate = groups.first().map(|g| g.approval_rate);
        for g in groups.iter_mut() {
            g.small_sample = self.min_group_size.is_some_and(|min| g.n < min);
            g.dir_vs_majority = majority_rate
                .filter(|&base| base > 0.0)
                .map(|base| g.approval_rate / base);
        }

        let rates: Vec<f64> = groups.iter().map(|g| g.approval_rate).collect();
        let ratio = disparate_impact(&rates);

        let tprs: Vec<f64> = groups.iter().filter_map(|g| g.tpr_good).collect();
        let tpr_good_range = tprs
            .iter()
            .copied()
            .reduce(f64::max)
            .zip(tprs.iter().copied().reduce(f64::min))
            .map(|(max, min)| max - min);

        debug!(%policy, ratio = ?ratio, groups = groups.len(), "Fairness evaluated");

        FairnessReport {
            policy,
            target_approval: self.target_approval,
            used_cutoff: match policy {
                CutoffPolicy::Global => global_cutoff,
                CutoffPolicy::GroupSpecific => None,
            },
            groups,
            disparate_impact: ratio,
            tpr_good_range,
            pass_80_rule: passes_four_fifths(ratio),
        }
    }
}

fn group_stats(group: &str, members: &[&Applicant], cutoff: f64) -> GroupFairness {
    let n = members.len();
    let approved = members.iter().filter(|a| a.score <= cutoff).count();
    let good: Vec<&&Applicant> = members.iter().filter(|a| a.good).collect();
    let good_approved = good.iter().filter(|a| a.score <= cutoff).count();

    GroupFairness {
        group: group.to_string(),
        n,
        cutoff,
        approval_rate: approved as f64 / n as f64,
        tpr_good: (!good.is_empty()).then(|| good_approved as f64 / good.len() as f64),
        dir_vs_majority: None,
        small_sample: false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn columns() -> FairnessColumns {
        FairnessColumns {
            outcome: "loan_status".into(),
            score: "pd_score".into(),
            group: "income_group".into(),
        }
    }

    /// Group A scores 1..=a_n, group B scores offset..offset+b_n; every third row defaults.
    fn applicants_table(a_n: usize, b_n: usize, offset: usize) -> Table {
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        for i in 1..=a_n {
            rows.push(vec![
                Some(((i % 3 == 0) as u8).to_string()),
                Some(i.to_string()),
                Some("A".into()),
            ]);
        }
        for i in 0..b_n {
            rows.push(vec![
                Some(((i % 3 == 0) as u8).to_string()),
                Some((offset + i).to_string()),
                Some("B".into()),
            ]);
        }
        Table::new(
            "applicants",
            vec!["loan_status".into(), "pd_score".into(), "income_group".into()],
            rows,
        )
    }

    #[test]
    fn test_four_fifths_rule_examples() {
        let pass = disparate_impact(&[0.40, 0.36]).unwrap();
        assert!((pass - 0.9).abs() < 1e-9);
        assert_eq!(passes_four_fifths(Some(pass)), Some(true));

        let fail = disparate_impact(&[0.40, 0.25]).unwrap();
        assert!((fail - 0.625).abs() < 1e-9);
        assert_eq!(passes_four_fifths(Some(fail)), Some(false));

        assert_eq!(passes_four_fifths(Some(0.8)), Some(true));
    }

    #[test]
    fn test_ratio_undefined_when_nobody_approved() {
        assert_eq!(disparate_impact(&[0.0, 0.0]), None);
        assert_eq!(disparate_impact(&[]), None);
        assert_eq!(passes_four_fifths(None), None);
    }

    #[test]
    fn test_group_cutoffs_equalize_approval_rates() {
        let table = applicants_table(10, 20, 1);
        let scorer = FairnessScorer::new(columns(), 0.40).unwrap();
        let report = scorer.score(&table, CutoffPolicy::GroupSpecific).unwrap();

        assert_eq!(report.groups.len(), 2);
        for g in &report.groups {
            assert!((g.approval_rate - 0.40).abs() < 1e-9, "{:?}", g);
        }
        assert_eq!(report.pass_80_rule, Some(true));
        assert!(report.used_cutoff.is_none());
        // largest group first
        assert_eq!(report.groups[0].group, "B");
    }

    #[test]
    fn test_global_cutoff_shows_disparate_impact() {
        // A holds the 10 lowest scores, B the 10 highest
        let table = applicants_table(10, 10, 11);
        let audit = FairnessScorer::new(columns(), 0.5).unwrap().audit(&table).unwrap();

        let global = &audit.global;
        assert!((global.used_cutoff.unwrap() - 10.5).abs() < 1e-9);
        let rate = |name: &str| {
            global
                .groups
                .iter()
                .find(|g| g.group == name)
                .unwrap()
                .approval_rate
        };
        assert_eq!(rate("A"), 1.0);
        assert_eq!(rate("B"), 0.0);
        assert_eq!(global.disparate_impact, Some(0.0));
        assert_eq!(global.pass_80_rule, Some(false));
        assert_eq!(global.tpr_good_range, Some(1.0));

        assert_eq!(audit.group_specific.pass_80_rule, Some(true));
        assert_eq!(audit.rows_used, 20);
    }

    #[test]
    fn test_tpr_good_undefined_without_good_outcomes() {
        let table = Table::from_records(
            "t",
            &["loan_status", "pd_score", "income_group"],
            &[&["1", "0.2", "A"], &["1", "0.6", "A"], &["0", "0.3", "B"], &["0", "0.9", "B"]],
        );
        let report = FairnessScorer::new(columns(), 0.5)
            .unwrap()
            .score(&table, CutoffPolicy::Global)
            .unwrap();
        let a = report.groups.iter().find(|g| g.group == "A").unwrap();
        assert_eq!(a.tpr_good, None);
        let b = report.groups.iter().find(|g| g.group == "B").unwrap();
        assert_eq!(b.tpr_good, Some(0.5));
        // only one group has a defined TPR
        assert_eq!(report.tpr_good_range, Some(0.0));
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let table = Table::from_records(
            "t",
            &["loan_status", "pd_score", "income_group"],
            &[&["0", "0.2", "A"], &["", "0.6", "A"], &["0", "x", "B"], &["0", "0.9", ""]],
        );
        let audit = FairnessScorer::new(columns(), 0.5).unwrap().audit(&table).unwrap();
        assert_eq!(audit.rows_used, 1);
    }

    #[test]
    fn test_small_groups_pooled_into_other() {
        let table = Table::from_records(
            "t",
            &["loan_status", "pd_score", "income_group"],
            &[
                &["0", "1", "CA"],
                &["0", "2", "CA"],
                &["0", "3", "CA"],
                &["0", "4", "NV"],
                &["0", "5", "UT"],
            ],
        );
        let report = FairnessScorer::new(columns(), 0.5)
            .unwrap()
            .with_min_group_size(2)
            .score(&table, CutoffPolicy::GroupSpecific)
            .unwrap();
        let names: Vec<&str> = report.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(names, vec!["CA", OTHER_GROUP]);
        assert!(report.small_groups().is_empty());
    }

    #[test]
    fn test_pooled_group_still_too_small_is_flagged() {
        let table = Table::from_records(
            "t",
            &["loan_status", "pd_score", "income_group"],
            &[
                &["0", "1", "CA"],
                &["0", "2", "CA"],
                &["1", "3", "CA"],
                &["0", "4", "NV"],
                &["1", "5", "UT"],
            ],
        );
        let audit = FairnessScorer::new(columns(), 0.5)
            .unwrap()
            .with_min_group_size(3)
            .audit(&table)
            .unwrap();

        for report in [&audit.global, &audit.group_specific] {
            assert_eq!(report.small_groups(), vec![OTHER_GROUP]);
            let other = report.groups.iter().find(|g| g.group == OTHER_GROUP).unwrap();
            assert_eq!(other.n, 2);
            let ca = report.groups.iter().find(|g| g.group == "CA").unwrap();
            assert!(!ca.small_sample);
        }
    }

    #[test]
    fn test_unreadable_outcome_counts_as_not_good() {
        let table = Table::from_records(
            "t",
            &["loan_status", "pd_score", "income_group"],
            &[&["0", "0.2", "A"], &["charged_off", "0.3", "A"], &["0", "0.9", "B"]],
        );
        let report = FairnessScorer::new(columns(), 0.5)
            .unwrap()
            .score(&table, CutoffPolicy::Global)
            .unwrap();

        let a = report.groups.iter().find(|g| g.group == "A").unwrap();
        assert_eq!(a.n, 2);
        // cutoff 0.3 approves both A rows; only one of them is good
        assert_eq!(a.tpr_good, Some(1.0));
        assert_eq!(a.approval_rate, 1.0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            FairnessScorer::new(columns(), 1.0),
            Err(DomainError::InvalidTargetApproval(_))
        ));
        let table = Table::from_records("t", &["pd_score"], &[&["1"]]);
        let res = FairnessScorer::new(columns(), 0.4).unwrap().audit(&table);
        assert!(matches!(res, Err(DomainError::MissingColumn { .. })));
    }
}

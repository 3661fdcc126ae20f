// scorewatch/src/commands/fairness.rs
//
// USE CASE: Explicit fairness audit, global cutoff vs. group-specific cutoffs.

use anyhow::Context;
use std::path::PathBuf;

use scorewatch_core::application::run_fairness_audit;
use scorewatch_core::domain::monitoring::{FairnessColumns, FairnessReport};
use scorewatch_core::infrastructure::adapters::DuckDbTableSource;
use scorewatch_core::infrastructure::config::load_monitor_config;

use super::{fmt_metric, new_table};
use crate::cli::OutputFormat;

pub struct FairnessArgs {
    pub project_dir: PathBuf,
    pub data: Option<PathBuf>,
    pub group: String,
    pub outcome: Option<String>,
    pub score: Option<String>,
    pub target: f64,
    pub min_group_size: usize,
    pub format: OutputFormat,
}

pub fn execute(args: FairnessArgs) -> anyhow::Result<()> {
    let config = load_monitor_config(&args.project_dir)
        .with_context(|| format!("Invalid monitor config in {}", args.project_dir.display()))?;

    let data = args
        .data
        .unwrap_or_else(|| args.project_dir.join(&config.paths.default_batch));
    let columns = FairnessColumns {
        outcome: args.outcome.unwrap_or_else(|| config.labels.y_col.clone()),
        score: args.score.unwrap_or_else(|| config.labels.p_col.clone()),
        group: args.group,
    };

    let source = DuckDbTableSource::in_memory()?;
    let audit = run_fairness_audit(&source, &data, columns, args.target, args.min_group_size)
        .with_context(|| format!("Fairness audit failed for {}", data.display()))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&audit)?),
        OutputFormat::Table => {
            println!(
                "⚖️  Fairness by '{}' on {} rows (target approval {:.0}%)",
                audit.group_column,
                audit.rows_used,
                args.target * 100.0
            );
            print_report("Global cutoff", &audit.global);
            print_report("Group-specific cutoffs", &audit.group_specific);
        }
    }
    Ok(())
}

fn print_report(title: &str, report: &FairnessReport) {
    match report.used_cutoff {
        Some(cutoff) => println!("\n📏 {} (cutoff {:.4})", title, cutoff),
        None => println!("\n📏 {}", title),
    }

    let mut table = new_table(["Group", "N", "Cutoff", "Approval", "TPR good", "DIR vs majority"]);
    for g in &report.groups {
        let n = if g.small_sample {
            format!("{} ⚠️", g.n)
        } else {
            g.n.to_string()
        };
        table.add_row(vec![
            g.group.clone(),
            n,
            format!("{:.4}", g.cutoff),
            format!("{:.2}%", g.approval_rate * 100.0),
            fmt_metric(g.tpr_good),
            fmt_metric(g.dir_vs_majority),
        ]);
    }
    println!("{table}");

    let small = report.small_groups();
    if !small.is_empty() {
        println!(
            "   ⚠️  Below the minimum group size, rates are unreliable: {}",
            small.join(", ")
        );
    }

    let verdict = match report.pass_80_rule {
        Some(true) => "✅ passes the 80% rule",
        Some(false) => "❌ fails the 80% rule",
        None => "➖ 80% rule undefined",
    };
    println!(
        "   Disparate impact: {} → {} | TPR-good range: {}",
        fmt_metric(report.disparate_impact),
        verdict,
        fmt_metric(report.tpr_good_range)
    );
}

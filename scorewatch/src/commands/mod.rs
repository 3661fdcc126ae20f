// scorewatch/src/commands/mod.rs

pub mod check;
pub mod fairness;
pub mod reference;
pub mod run;
pub mod status;

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use scorewatch_core::domain::monitoring::{CheckResult, Level};

pub fn new_table(header: impl Into<comfy_table::Row>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

pub fn level_badge(level: Level) -> String {
    match level {
        Level::Ok => "✅ OK".to_string(),
        Level::Warn => "⚠️  WARN".to_string(),
        Level::Alert => "🚨 ALERT".to_string(),
        Level::NotAvailable => "➖ N/A".to_string(),
    }
}

/// Undefined metrics print as `N/A`, never as zero.
pub fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.4}", v))
}

pub fn checks_table(checks: &[CheckResult]) -> Table {
    let mut table = new_table(["Check", "Subject", "Value", "Alert threshold", "Level"]);
    for c in checks {
        table.add_row(vec![
            c.check.clone(),
            c.subject.clone().unwrap_or_default(),
            fmt_metric(c.value),
            fmt_metric(c.threshold),
            level_badge(c.level),
        ]);
    }
    table
}

/// Exit code 2 marks "ran fine, but the model needs attention".
pub fn exit_on_alert(fail_on_alert: bool, overall: Level) {
    if fail_on_alert && overall == Level::Alert {
        eprintln!("\n💥 --fail-on-alert: overall status is ALERT.");
        std::process::exit(2);
    }
}

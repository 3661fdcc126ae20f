// scorewatch-core/src/application/mod.rs

pub mod fairness;
pub mod monitor;
pub mod reference;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use scorewatch_core::application::{run_monitor, build_reference};`

pub use fairness::{FairnessVerdict, fairness_verdict, run_fairness_audit};
pub use monitor::{BATCH_TIME_FORMAT, MonitorRun, latest_status, run_id, run_monitor};
pub use reference::{build_reference, check_reference_coverage};

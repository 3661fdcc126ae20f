// scorewatch-core/src/infrastructure/repository/mod.rs

pub mod fs;
pub mod memory;

pub use fs::{FsMonitorStore, MonitorPaths};
pub use memory::{InMemoryMonitorStore, InMemoryTableSource};

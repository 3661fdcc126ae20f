// scorewatch-core/src/domain/ports/table.rs

use crate::domain::dataset::Table;
use crate::error::ScorewatchError;
use std::path::Path;

/// Reads a tabular file (training snapshot or batch) into memory.
pub trait TableSource: Send + Sync {
    /// Fails with a "not found" error when `path` does not exist;
    /// a missing input is fatal for the run.
    fn read_table(&self, path: &Path) -> Result<Table, ScorewatchError>;
}

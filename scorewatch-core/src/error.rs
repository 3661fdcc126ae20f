// scorewatch-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ScorewatchError {
    // --- DOMAIN ERRORS (empty datasets, missing columns) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, Parsing, DuckDB) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for ScorewatchError {
    fn from(err: std::io::Error) -> Self {
        ScorewatchError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl ScorewatchError {
    /// True for the "missing input" family: the run could not start at all.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            ScorewatchError::Infrastructure(
                InfrastructureError::ReferenceNotFound(_) | InfrastructureError::DataFileNotFound(_)
            ) | ScorewatchError::Domain(DomainError::EmptyDataset(_))
        )
    }
}

// scorewatch-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Dataset '{0}' has no rows")]
    #[diagnostic(
        code(scorewatch::domain::empty_dataset),
        help("A monitoring run needs at least one data row. Check the export that produced this file.")
    )]
    EmptyDataset(String),

    #[error("Column '{column}' not found in dataset '{dataset}'")]
    #[diagnostic(
        code(scorewatch::domain::missing_column),
        help("Column names are matched exactly. Set them explicitly in scorewatch.yaml or on the command line.")
    )]
    MissingColumn { dataset: String, column: String },

    #[error("Invalid target approval rate {0}: must be strictly between 0 and 1")]
    #[diagnostic(code(scorewatch::domain::target_approval))]
    InvalidTargetApproval(f64),
}

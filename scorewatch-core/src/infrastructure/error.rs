// scorewatch-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(scorewatch::infra::database::duckdb),
        help("DuckDB could not read the file. Check that it is a well-formed CSV with a header row.")
    )]
    DuckDB(#[from] duckdb::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (CSV ingestion) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(scorewatch::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- MISSING INPUTS (fatal for the run) ---
    #[error("Reference statistics not found at '{0}'")]
    #[diagnostic(
        code(scorewatch::infra::reference_missing),
        help("Build the reference first: scorewatch reference --training <csv>")
    )]
    ReferenceNotFound(String),

    #[error("Data file not found at '{0}'")]
    #[diagnostic(code(scorewatch::infra::data_missing))]
    DataFileNotFound(String),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(scorewatch::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid monitor configuration: {0}")]
    #[diagnostic(
        code(scorewatch::infra::config_invalid),
        help("Thresholds must be non-negative and psi_threshold_warn <= psi_threshold_alert.")
    )]
    InvalidConfig(#[from] validator::ValidationErrors),

    // --- ARTIFACTS (JSON) ---
    #[error("JSON Error in '{path}': {source}")]
    #[diagnostic(code(scorewatch::infra::json))]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InfrastructureError {
    pub fn json(path: impl AsRef<std::path::Path>, source: serde_json::Error) -> Self {
        InfrastructureError::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

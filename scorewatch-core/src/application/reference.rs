// scorewatch-core/src/application/reference.rs

use chrono::Utc;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::domain::monitoring::{FeatureCoverage, ReferenceBuilder, ReferenceStats};
use crate::domain::ports::{ReferenceRepository, TableSource};
use crate::error::ScorewatchError;

/// Builds the reference from the training snapshot and persists it.
/// Run once per model version.
#[instrument(skip(source, repo, features), fields(path = %training_path.display()))]
pub fn build_reference(
    source: &dyn TableSource,
    repo: &dyn ReferenceRepository,
    training_path: &Path,
    features: &[String],
    bins: usize,
    model_version: Option<String>,
) -> Result<ReferenceStats, ScorewatchError> {
    let table = source.read_table(training_path)?;
    let reference = ReferenceBuilder::new(features.iter().cloned())
        .with_bins(bins)
        .build(&table)?
        .with_metadata(model_version, Some(Utc::now().to_rfc3339()));

    if reference.len() < features.len() {
        warn!(
            built = reference.len(),
            requested = features.len(),
            "Some features were absent or entirely missing in the training data"
        );
    }

    repo.save_reference(&reference)?;
    info!(features = reference.len(), rows = table.len(), "Reference built");
    Ok(reference)
}

/// Which expected features the persisted reference covers.
#[instrument(skip_all)]
pub fn check_reference_coverage(
    repo: &dyn ReferenceRepository,
    features: &[String],
) -> Result<Vec<FeatureCoverage>, ScorewatchError> {
    let reference = repo.load_reference()?;
    Ok(reference.coverage(features))
}

use std::fs;
use std::path::{Path, PathBuf};

use mdify_core::output_path_for;

use crate::types::ScrapeError;

/// Resolve where `identifier` is stored and make sure its directory exists.
///
/// Directory creation is create-if-missing, so workers resolving sibling
/// paths at the same time do not trip over each other.
pub fn resolve_output_path(identifier: &str, output_root: &Path) -> Result<PathBuf, ScrapeError> {
    let path = output_path_for(identifier, output_root).map_err(|err| {
        ScrapeError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: err.to_string(),
        }
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ScrapeError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(path)
}

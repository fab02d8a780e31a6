use std::path::{Path, PathBuf};

pub type JobId = u64;

/// One identifier bundled with everything needed to run it through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub identifier: String,
    pub selector: String,
    pub output_root: PathBuf,
}

impl Job {
    pub fn new(
        id: JobId,
        identifier: impl Into<String>,
        selector: impl Into<String>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            selector: selector.into(),
            output_root: output_root.into(),
        }
    }

    /// Build one job per identifier, ids assigned in input order starting at 0.
    pub fn batch(identifiers: &[String], selector: &str, output_root: &Path) -> Vec<Job> {
        identifiers
            .iter()
            .enumerate()
            .map(|(idx, identifier)| {
                Job::new(idx as JobId, identifier.as_str(), selector, output_root)
            })
            .collect()
    }
}

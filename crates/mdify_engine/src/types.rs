use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mdify_core::JobId;

use crate::decode::DecodeError;
use crate::persist::PersistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    Downloading,
    Extracting,
    Writing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    /// A failed attempt will be retried after `delay`; `attempt` is the
    /// 1-based number of the upcoming attempt.
    RetryScheduled {
        job_id: JobId,
        url: String,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },
    JobCompleted {
        job_id: JobId,
        success: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Every way a single job can fail. None of these abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("invalid identifier {identifier}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },
    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("404 not found: {url}")]
    NotFound { url: String },
    #[error("failed after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: FetchError,
    },
    #[error("fetch rejected: {0}")]
    Rejected(#[source] FetchError),
    #[error("failed to parse document: {0}")]
    Parse(#[source] DecodeError),
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("selector '{selector}' matched no elements")]
    SelectorNoMatch { selector: String },
    #[error("failed to save {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
    #[error("cancelled before processing")]
    Cancelled,
    #[error("job aborted before reporting an outcome")]
    Aborted,
}

/// The single result reported for one job.
#[derive(Debug)]
pub struct Outcome {
    pub job_id: JobId,
    pub identifier: String,
    pub result: Result<PathBuf, ScrapeError>,
}

impl Outcome {
    pub fn failure(job_id: JobId, identifier: impl Into<String>, error: ScrapeError) -> Self {
        Self {
            job_id,
            identifier: identifier.into(),
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn error(&self) -> Option<&ScrapeError> {
        self.result.as_ref().err()
    }
}

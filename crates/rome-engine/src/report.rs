//! Outcome of a mirror run

use rome_types::{Error, ErrorKind, MirrorStats};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier of one mirror run
pub type RunId = Uuid;

/// A single entry that could not be mirrored
#[derive(Debug, Clone)]
pub struct JobFailure {
    /// Entry under the source root
    pub source_path: PathBuf,
    /// Mapped destination, when mapping got that far
    pub destination: Option<PathBuf>,
    /// What went wrong
    pub error: Error,
}

impl JobFailure {
    /// Create a failure record
    pub fn new<P: Into<PathBuf>>(source_path: P, destination: Option<PathBuf>, error: Error) -> Self {
        Self {
            source_path: source_path.into(),
            destination,
            error,
        }
    }

    /// Category of the failure
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.destination {
            Some(destination) => write!(
                f,
                "{} -> {}: {}",
                self.source_path.display(),
                destination.display(),
                self.error
            ),
            None => write!(f, "{}: {}", self.source_path.display(), self.error),
        }
    }
}

/// Everything the coordinator knows once both pools have joined
#[derive(Debug, Clone)]
pub struct MirrorReport {
    /// Identifier of the run, also attached to its log span
    pub run_id: RunId,
    /// Run statistics
    pub stats: MirrorStats,
    /// Per-entry failures, in the order they were collected
    pub failures: Vec<JobFailure>,
    /// Whether the run was cancelled before the walk finished
    pub cancelled: bool,
}

impl MirrorReport {
    /// Whether any entry failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Completed without cancellation and without failures
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

//! Core data types for rome
//!
//! This module provides the data types shared by the mirror engine, the
//! build collaborators and the command line front end.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The product variant being built: a flavor plus a version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildTarget {
    /// Build flavor, e.g. `ent`
    pub flavor: String,
    /// Release version stamped into the output
    pub version: String,
}

impl BuildTarget {
    /// Create a new build target
    pub fn new<F: Into<String>, V: Into<String>>(flavor: F, version: V) -> Self {
        Self {
            flavor: flavor.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flavor, self.version)
    }
}

/// Statistics of one mirror run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MirrorStats {
    /// Non-directory entries classified by the walker
    pub entries: u64,
    /// File jobs emitted
    pub files_queued: u64,
    /// Link jobs emitted
    pub links_queued: u64,
    /// File jobs that completed successfully
    pub files_built: u64,
    /// Link jobs that completed successfully
    pub links_created: u64,
    /// Directories pruned by skip rules
    pub directories_skipped: u64,
    /// Per-entry failures (walk, transform, link)
    pub errors: u64,
    /// Pushes that found a queue full and had to wait
    pub backpressure_events: u64,
    /// Wall clock time of the run
    pub duration: Duration,
}

impl MirrorStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs that finished successfully, regardless of kind
    pub fn completed(&self) -> u64 {
        self.files_built + self.links_created
    }

    /// Entries processed per second
    pub fn entries_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.entries as f64 / secs
        } else {
            0.0
        }
    }
}

//! Collaborator traits for rome
//!
//! The mirror engine never looks inside a file. Producing the destination
//! file, and wiping an old build, are delegated to implementations of the
//! traits below.

use crate::{BuildTarget, Result};
use async_trait::async_trait;
use std::path::Path;

/// Per-file content transformation
///
/// Implementations must create any missing parent directory of
/// `destination`, must not modify `source`, and must be deterministic for
/// identical inputs. They are called concurrently from many workers, but
/// never twice for the same destination within a run.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Produce `destination` from `source` for the given build target
    async fn transform(&self, source: &Path, destination: &Path, target: &BuildTarget)
        -> Result<()>;
}

/// Recursive removal of an existing build
#[async_trait]
pub trait Clean: Send + Sync {
    /// Remove everything below `destination`, leaving an empty root
    async fn clean(&self, destination: &Path) -> Result<()>;
}

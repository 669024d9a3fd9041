//! Mirror jobs produced by the walker

use std::path::PathBuf;

/// One regular file to run through the content transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    /// Path under the source root
    pub source_path: PathBuf,
}

impl FileJob {
    /// Create a file job
    pub fn new<P: Into<PathBuf>>(source_path: P) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }
}

/// One symbolic link to recreate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkJob {
    /// Path of the link under the source root
    pub link_path: PathBuf,
    /// Target as stored in the link, not resolved or checked
    pub target: PathBuf,
}

impl LinkJob {
    /// Create a link job
    pub fn new<L: Into<PathBuf>, T: Into<PathBuf>>(link_path: L, target: T) -> Self {
        Self {
            link_path: link_path.into(),
            target: target.into(),
        }
    }
}

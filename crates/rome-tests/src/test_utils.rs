//! Unified test utilities for rome integration tests
//!
//! Fixture trees, a snapshot of a built tree that can be compared between
//! runs, and transforms with controllable behavior.

use async_trait::async_trait;
use rome_types::{BuildTarget, Error, Result, Transform};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;

/// One non-directory entry of a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySnapshot {
    /// Regular file with its content
    File(Vec<u8>),
    /// Symbolic link with its target string
    Link(PathBuf),
}

/// Every non-directory entry under `root`, keyed by relative path
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, EntrySnapshot> {
    let mut entries = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.expect("Failed to walk snapshot tree");
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("Entry outside the snapshot root")
            .to_path_buf();

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path()).expect("Failed to read link");
            entries.insert(relative, EntrySnapshot::Link(target));
        } else if entry.file_type().is_file() {
            let content = fs::read(entry.path()).expect("Failed to read file");
            entries.insert(relative, EntrySnapshot::File(content));
        }
    }

    entries
}

/// Write `files` (relative path, content) below `root`
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
    }
}

/// Create a symbolic link at `root/link` pointing at `target`
#[cfg(unix)]
pub fn symlink(root: &Path, link: &str, target: &str) {
    let path = root.join(link);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::os::unix::fs::symlink(target, path).expect("Failed to create fixture link");
}

/// The reference tree:
///
/// ```text
/// a.txt
/// sub/b.txt
/// sub/link -> ../a.txt
/// node_modules/ignored.js
/// ```
#[cfg(unix)]
pub fn scenario_tree() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_files(
        temp_dir.path(),
        &[
            ("a.txt", "a"),
            ("sub/b.txt", "b"),
            ("node_modules/ignored.js", "ignored"),
        ],
    );
    symlink(temp_dir.path(), "sub/link", "../a.txt");
    temp_dir
}

/// A wider tree: `dirs` directories with `files_per_dir` files each and one
/// link per directory
#[cfg(unix)]
pub fn wide_tree(dirs: usize, files_per_dir: usize) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for d in 0..dirs {
        for f in 0..files_per_dir {
            let name = format!("dir{}/nested/file{}.txt", d, f);
            write_files(temp_dir.path(), &[(&name, &format!("{} @_SUGAR_VERSION", name))]);
        }
        symlink(
            temp_dir.path(),
            &format!("dir{}/latest", d),
            "nested/file0.txt",
        );
    }
    temp_dir
}

/// Copies files verbatim, counting calls
#[derive(Debug, Default)]
pub struct CountingCopy {
    calls: AtomicU64,
}

impl CountingCopy {
    /// Number of transform calls so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transform for CountingCopy {
    async fn transform(&self, source: &Path, destination: &Path, _: &BuildTarget) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, destination)
            .await
            .map_err(|e| Error::transform(source, destination, e.to_string()))?;
        Ok(())
    }
}

/// Sleeps before every file, so a run can be cancelled half way
#[derive(Debug)]
pub struct SlowTransform {
    delay: Duration,
    inner: CountingCopy,
}

impl SlowTransform {
    /// Create a transform sleeping `delay` per file
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: CountingCopy::default(),
        }
    }

    /// Number of transform calls so far
    pub fn calls(&self) -> u64 {
        self.inner.calls()
    }
}

#[async_trait]
impl Transform for SlowTransform {
    async fn transform(&self, source: &Path, destination: &Path, target: &BuildTarget) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.transform(source, destination, target).await
    }
}

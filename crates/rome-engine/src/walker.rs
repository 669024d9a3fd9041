//! Tree walker and entry classifier
//!
//! The walker is synchronous (`walkdir`) and runs on the blocking thread
//! pool. It pushes into the bounded queues with blocking sends, so a slow
//! worker pool suspends the walk instead of buffering the whole tree.

use crate::counter::ProgressCounter;
use crate::job::{FileJob, LinkJob};
use crate::mapping::PathMapper;
use crate::queue::JobSender;
use crate::report::JobFailure;
use crate::skip::SkipRules;
use rome_types::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What the walker emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// File jobs pushed
    pub files: u64,
    /// Link jobs pushed
    pub links: u64,
    /// Directories pruned by skip rules
    pub directories_skipped: u64,
    /// Symlinks whose target could not be read
    pub unreadable_links: u64,
    /// Entries that could not be read
    pub errors: u64,
    /// The walk stopped early because of cancellation
    pub interrupted: bool,
}

/// Walks the source root and feeds the job queues
#[derive(Debug)]
pub struct Walker {
    mapper: PathMapper,
    skip: SkipRules,
    counter: ProgressCounter,
    cancel: CancellationToken,
    failures: UnboundedSender<JobFailure>,
    excluded: Option<PathBuf>,
}

impl Walker {
    /// Create a walker
    pub fn new(
        mapper: PathMapper,
        skip: SkipRules,
        counter: ProgressCounter,
        cancel: CancellationToken,
        failures: UnboundedSender<JobFailure>,
    ) -> Self {
        Self {
            mapper,
            skip,
            counter,
            cancel,
            failures,
            excluded: None,
        }
    }

    /// Never descend into `relative` (to the source root)
    ///
    /// Used when the destination root lives inside the source tree.
    pub fn with_excluded<P: Into<PathBuf>>(mut self, relative: P) -> Self {
        self.excluded = Some(relative.into());
        self
    }

    /// Walk to completion, then close both queues
    ///
    /// Unreadable subtrees are reported and skipped. Failing to read the
    /// source root itself is the only error returned.
    pub fn run(self, files: JobSender<FileJob>, links: JobSender<LinkJob>) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();
        let root = self.mapper.source_root().to_path_buf();
        let mut it = WalkDir::new(&root).follow_links(false).into_iter();

        loop {
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            let entry = match it.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                    if e.depth() == 0 {
                        return Err(Error::SourceUnreadable {
                            path,
                            message: e.to_string(),
                        });
                    }
                    self.report(path, e.to_string(), &mut summary);
                    continue;
                }
            };

            let file_type = entry.file_type();

            if file_type.is_dir() {
                if entry.depth() > 0 && self.is_excluded(entry.path()) {
                    debug!("Not walking destination {}", entry.path().display());
                    it.skip_current_dir();
                } else if entry.depth() > 0 && self.is_skipped(entry.path()) {
                    debug!("Skipping directory {}", entry.path().display());
                    it.skip_current_dir();
                    summary.directories_skipped += 1;
                }
                continue;
            }

            let pushed = if file_type.is_symlink() {
                match std::fs::read_link(entry.path()) {
                    Ok(target) => {
                        summary.links += 1;
                        links.blocking_push(LinkJob::new(entry.into_path(), target))
                    }
                    Err(e) => {
                        self.unreadable_link(entry.into_path(), &e, &mut summary);
                        continue;
                    }
                }
            } else {
                summary.files += 1;
                files.blocking_push(FileJob::new(entry.into_path()))
            };

            if pushed.is_err() {
                // every worker is gone
                summary.interrupted = true;
                break;
            }
            self.counter.increment();
        }

        files.close();
        links.close();

        debug!(
            "Walk finished: {} files, {} links, {} directories skipped",
            summary.files, summary.links, summary.directories_skipped
        );
        Ok(summary)
    }

    fn is_skipped(&self, path: &Path) -> bool {
        self.mapper
            .relative(path)
            .is_ok_and(|relative| self.skip.is_skipped(relative))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.as_deref().is_some_and(|excluded| {
            self.mapper
                .relative(path)
                .is_ok_and(|relative| relative == excluded)
        })
    }

    /// A symlink was classified but its target is unreadable: it still counts
    fn unreadable_link(&self, path: PathBuf, error: &std::io::Error, summary: &mut WalkSummary) {
        summary.unreadable_links += 1;
        self.counter.increment();
        self.report(path, error.to_string(), summary);
    }

    fn report(&self, path: PathBuf, message: String, summary: &mut WalkSummary) {
        warn!("Failed to read {}: {}", path.display(), message);
        summary.errors += 1;
        let error = Error::walk(path.clone(), message);
        let _ = self.failures.send(JobFailure::new(path, None, error));
    }
}

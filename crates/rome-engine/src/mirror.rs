//! Mirror run coordinator
//!
//! A run goes through these steps:
//!
//! 1. Both worker pools are started, so every job has a consumer.
//! 2. The destination root is created. Failure cancels the pools and is
//!    returned as an error.
//! 3. The walker runs on the blocking pool and closes both queues when done.
//! 4. Both pools drain and join.
//! 5. Failures reported along the way are collected into the report.

use crate::counter::ProgressCounter;
use crate::job::{FileJob, LinkJob};
use crate::mapping::PathMapper;
use crate::pool::{spawn_file_workers, spawn_link_workers, WorkerContext};
use crate::queue::{bounded, QueueStats};
use crate::report::{JobFailure, MirrorReport, RunId};
use crate::skip::SkipRules;
use crate::walker::Walker;
use rome_types::{
    BuildTarget, Error, MirrorStats, QueueCapacity, Result, Transform, WorkerCount,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// Immutable settings of one mirror run
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Directory to mirror
    pub source_root: PathBuf,
    /// Directory receiving the build
    pub destination_root: PathBuf,
    /// Flavor and version handed to the transform
    pub target: BuildTarget,
    /// Number of file workers
    pub file_workers: WorkerCount,
    /// Capacity of the file job queue
    pub file_queue_capacity: QueueCapacity,
    /// Number of link workers
    pub link_workers: WorkerCount,
    /// Capacity of the link job queue
    pub link_queue_capacity: QueueCapacity,
    /// Directories left out of the mirror
    pub skip: SkipRules,
}

impl MirrorConfig {
    /// Settings with default pool sizes and no skip rules
    pub fn new<S, D>(source_root: S, destination_root: D, target: BuildTarget) -> Self
    where
        S: Into<PathBuf>,
        D: Into<PathBuf>,
    {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            target,
            file_workers: WorkerCount::default_file(),
            file_queue_capacity: QueueCapacity::default_file(),
            link_workers: WorkerCount::default_link(),
            link_queue_capacity: QueueCapacity::default_link(),
            skip: SkipRules::none(),
        }
    }

    /// Set the file pool size and queue capacity
    pub fn with_file_pool(mut self, workers: WorkerCount, capacity: QueueCapacity) -> Self {
        self.file_workers = workers;
        self.file_queue_capacity = capacity;
        self
    }

    /// Set the link pool size and queue capacity
    pub fn with_link_pool(mut self, workers: WorkerCount, capacity: QueueCapacity) -> Self {
        self.link_workers = workers;
        self.link_queue_capacity = capacity;
        self
    }

    /// Set the skip rules
    pub fn with_skip_rules(mut self, skip: SkipRules) -> Self {
        self.skip = skip;
        self
    }

    fn mapper(&self) -> PathMapper {
        PathMapper::new(&self.source_root, &self.destination_root)
    }
}

/// Cooperative cancellation of a running mirror
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Ask every worker and the walker to stop
    ///
    /// Jobs already being processed finish; queued jobs are dropped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// One mirror run: walker, two worker pools and the shutdown logic tying them
/// together
pub struct Mirror {
    config: Arc<MirrorConfig>,
    transform: Arc<dyn Transform>,
    cancel: CancellationToken,
    counter: ProgressCounter,
    run_id: RunId,
}

impl Mirror {
    /// Prepare a run
    pub fn new(config: MirrorConfig, transform: Arc<dyn Transform>) -> Self {
        Self {
            config: Arc::new(config),
            transform,
            cancel: CancellationToken::new(),
            counter: ProgressCounter::new(),
            run_id: RunId::new_v4(),
        }
    }

    /// Settings of this run
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Identifier attached to every log line of the run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Handle that cancels the run from elsewhere
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel.clone(),
        }
    }

    /// Live count of classified entries
    pub fn progress(&self) -> ProgressCounter {
        self.counter.clone()
    }

    /// Run to completion
    ///
    /// Per-entry failures end up in the report. Only fatal conditions (the
    /// source root or destination root being unusable) return an error.
    pub async fn run(self) -> Result<MirrorReport> {
        let span = info_span!("mirror", run_id = %self.run_id);
        self.execute().instrument(span).await
    }

    async fn execute(self) -> Result<MirrorReport> {
        let started = Instant::now();
        let config = Arc::clone(&self.config);

        check_source(&config.source_root).await?;

        info!(
            "Mirroring {} -> {} for {} ({} file workers, {} link workers)",
            config.source_root.display(),
            config.destination_root.display(),
            config.target,
            config.file_workers.get(),
            config.link_workers.get()
        );

        let (file_tx, file_rx) = bounded::<FileJob>(config.file_queue_capacity);
        let (link_tx, link_rx) = bounded::<LinkJob>(config.link_queue_capacity);
        let file_stats = file_tx.stats();
        let link_stats = link_tx.stats();
        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<JobFailure>();

        let context = WorkerContext {
            mapper: Arc::new(config.mapper()),
            target: Arc::new(config.target.clone()),
            cancel: self.cancel.clone(),
            failures: failure_tx.clone(),
        };

        let file_workers = spawn_file_workers(
            config.file_workers,
            file_rx,
            Arc::clone(&self.transform),
            &context,
        );
        let link_workers = spawn_link_workers(config.link_workers, link_rx, &context);
        drop(context);

        if let Err(e) = fs::create_dir_all(&config.destination_root).await {
            error!(
                "Cannot create destination {}: {}",
                config.destination_root.display(),
                e
            );
            return Err(self
                .abort(
                    file_workers,
                    link_workers,
                    Error::DestinationUnavailable {
                        path: config.destination_root.clone(),
                        message: e.to_string(),
                    },
                )
                .await);
        }

        let nested = match nested_destination(&config.source_root, &config.destination_root).await
        {
            Ok(nested) => nested,
            Err(e) => return Err(self.abort(file_workers, link_workers, e).await),
        };

        let mut walker = Walker::new(
            config.mapper(),
            config.skip.clone(),
            self.counter.clone(),
            self.cancel.clone(),
            failure_tx,
        );
        if let Some(relative) = nested {
            info!(
                "Destination lies inside the source, not walking {}",
                relative.display()
            );
            walker = walker.with_excluded(relative);
        }
        let walk = tokio::task::spawn_blocking(move || walker.run(file_tx, link_tx)).await;

        let summary = match walk {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                error!("Walk failed: {}", e);
                return Err(self.abort(file_workers, link_workers, e).await);
            }
            Err(e) => {
                let e = Error::other(format!("Walker task failed: {}", e));
                return Err(self.abort(file_workers, link_workers, e).await);
            }
        };

        let files_built = join_pool(file_workers).await?;
        let links_created = join_pool(link_workers).await?;

        let mut failures = Vec::new();
        while let Some(failure) = failure_rx.recv().await {
            failures.push(failure);
        }

        let stats = MirrorStats {
            entries: self.counter.get(),
            files_queued: summary.files,
            links_queued: summary.links,
            files_built,
            links_created,
            directories_skipped: summary.directories_skipped,
            errors: failures.len() as u64,
            backpressure_events: backpressure(&file_stats) + backpressure(&link_stats),
            duration: started.elapsed(),
        };
        let cancelled = self.cancel.is_cancelled();

        info!(
            "Mirrored {} entries ({} files, {} links) in {:.2?} with {} errors{}",
            stats.entries,
            stats.files_built,
            stats.links_created,
            stats.duration,
            stats.errors,
            if cancelled { ", cancelled" } else { "" }
        );

        Ok(MirrorReport {
            run_id: self.run_id,
            stats,
            failures,
            cancelled,
        })
    }

    /// Cancel both pools, wait for them and hand back `error`
    async fn abort(
        &self,
        file_workers: Vec<JoinHandle<u64>>,
        link_workers: Vec<JoinHandle<u64>>,
        error: Error,
    ) -> Error {
        self.cancel.cancel();
        let _ = join_pool(file_workers).await;
        let _ = join_pool(link_workers).await;
        error
    }
}

async fn check_source(source_root: &Path) -> Result<()> {
    match fs::metadata(source_root).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        _ => Err(Error::SourceNotFound {
            path: source_root.to_path_buf(),
        }),
    }
}

/// Destination root relative to the source root, when it lies inside it
async fn nested_destination(source_root: &Path, destination_root: &Path) -> Result<Option<PathBuf>> {
    let (Ok(source), Ok(destination)) = (
        fs::canonicalize(source_root).await,
        fs::canonicalize(destination_root).await,
    ) else {
        return Ok(None);
    };

    match destination.strip_prefix(&source) {
        Ok(relative) if relative.as_os_str().is_empty() => Err(Error::DestinationUnavailable {
            path: destination_root.to_path_buf(),
            message: "destination is the source root".to_string(),
        }),
        Ok(relative) => Ok(Some(relative.to_path_buf())),
        Err(_) => Ok(None),
    }
}

async fn join_pool(workers: Vec<JoinHandle<u64>>) -> Result<u64> {
    let mut total = 0;
    for worker in workers {
        total += worker
            .await
            .map_err(|e| Error::other(format!("Worker task failed: {}", e)))?;
    }
    Ok(total)
}

fn backpressure(stats: &QueueStats) -> u64 {
    stats.snapshot().backpressure_events
}

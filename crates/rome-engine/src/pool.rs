//! File and link worker pools

use crate::job::{FileJob, LinkJob};
use crate::mapping::PathMapper;
use crate::queue::JobReceiver;
use crate::report::JobFailure;
use rome_types::{BuildTarget, Error, Result, Transform, WorkerCount};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// State shared by every worker of both pools
#[derive(Clone)]
pub struct WorkerContext {
    /// Source to destination mapping
    pub mapper: Arc<PathMapper>,
    /// Flavor and version handed to the transform
    pub target: Arc<BuildTarget>,
    /// Stops workers without draining their queue
    pub cancel: CancellationToken,
    /// Per-job failures, collected by the coordinator
    pub failures: UnboundedSender<JobFailure>,
}

impl WorkerContext {
    fn report(&self, failure: JobFailure) {
        warn!("{}", failure);
        let _ = self.failures.send(failure);
    }
}

/// Spawn the file pool; each handle resolves to the number of files built
pub fn spawn_file_workers(
    count: WorkerCount,
    receiver: JobReceiver<FileJob>,
    transform: Arc<dyn Transform>,
    context: &WorkerContext,
) -> Vec<JoinHandle<u64>> {
    (0..count.get())
        .map(|id| {
            let receiver = receiver.clone();
            let transform = Arc::clone(&transform);
            let context = context.clone();
            tokio::spawn(async move { file_worker(id, receiver, transform, context).await })
        })
        .collect()
}

/// Spawn the link pool; each handle resolves to the number of links created
pub fn spawn_link_workers(
    count: WorkerCount,
    receiver: JobReceiver<LinkJob>,
    context: &WorkerContext,
) -> Vec<JoinHandle<u64>> {
    (0..count.get())
        .map(|id| {
            let receiver = receiver.clone();
            let context = context.clone();
            tokio::spawn(async move { link_worker(id, receiver, context).await })
        })
        .collect()
}

async fn file_worker(
    id: usize,
    receiver: JobReceiver<FileJob>,
    transform: Arc<dyn Transform>,
    context: WorkerContext,
) -> u64 {
    let mut built = 0;

    loop {
        let job = tokio::select! {
            biased;
            () = context.cancel.cancelled() => break,
            job = receiver.pop() => job,
        };
        let Some(job) = job else { break };

        let destination = match context.mapper.map(&job.source_path) {
            Ok(destination) => destination,
            Err(e) => {
                context.report(JobFailure::new(job.source_path, None, e));
                continue;
            }
        };

        if let Err(e) = clear_stale_ancestors(context.mapper.destination_root(), &destination).await {
            let error = Error::transform(&job.source_path, &destination, e.to_string());
            context.report(JobFailure::new(job.source_path, Some(destination), error));
            continue;
        }

        match transform
            .transform(&job.source_path, &destination, &context.target)
            .await
        {
            Ok(()) => {
                trace!("file worker {} built {}", id, destination.display());
                built += 1;
            }
            Err(e) => context.report(JobFailure::new(job.source_path, Some(destination), e)),
        }
    }

    debug!("file worker {} exiting after {} files", id, built);
    built
}

async fn link_worker(id: usize, receiver: JobReceiver<LinkJob>, context: WorkerContext) -> u64 {
    let mut created = 0;

    loop {
        let job = tokio::select! {
            biased;
            () = context.cancel.cancelled() => break,
            job = receiver.pop() => job,
        };
        let Some(job) = job else { break };

        let destination = match context.mapper.map(&job.link_path) {
            Ok(destination) => destination,
            Err(e) => {
                context.report(JobFailure::new(job.link_path, None, e));
                continue;
            }
        };

        match recreate_link(&job, context.mapper.destination_root(), &destination).await {
            Ok(()) => {
                trace!(
                    "link worker {} linked {} -> {}",
                    id,
                    destination.display(),
                    job.target.display()
                );
                created += 1;
            }
            Err(e) => context.report(JobFailure::new(job.link_path, Some(destination), e)),
        }
    }

    debug!("link worker {} exiting after {} links", id, created);
    created
}

/// Create a link at `destination` with the same target string as the source
async fn recreate_link(job: &LinkJob, root: &Path, destination: &Path) -> Result<()> {
    let link_error = |message: String| Error::Link {
        link: job.link_path.clone(),
        target: job.target.clone(),
        destination: destination.to_path_buf(),
        message,
    };

    clear_stale_ancestors(root, destination)
        .await
        .map_err(|e| link_error(e.to_string()))?;

    // a file or link from an earlier build is replaced; a directory is not
    match fs::symlink_metadata(destination).await {
        Ok(metadata) if !metadata.is_dir() => remove_link(destination)
            .await
            .map_err(|e| link_error(format!("Failed to replace {}: {}", destination.display(), e)))?,
        _ => {}
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| link_error(format!("Failed to create directory {}: {}", parent.display(), e)))?;
    }

    create_symlink(job, destination)
        .await
        .map_err(|e| link_error(e.to_string()))
}

/// Remove links left by an earlier build between `root` and the parent of
/// `destination`, so directories are created inside the destination tree
async fn clear_stale_ancestors(root: &Path, destination: &Path) -> std::io::Result<()> {
    let Some(parent) = destination.parent() else {
        return Ok(());
    };
    let Ok(relative) = parent.strip_prefix(root) else {
        return Ok(());
    };

    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current).await {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                debug!("Removing stale link {}", current.display());
                remove_link(&current).await?;
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Remove a non-directory entry; concurrent removal by another worker is fine
async fn remove_link(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        // another worker already put a directory in its place
        Err(_) if fs::symlink_metadata(path).await.is_ok_and(|m| m.is_dir()) => Ok(()),
        Err(e) => {
            #[cfg(windows)]
            return fs::remove_dir(path).await.map_err(|_| e);
            #[cfg(not(windows))]
            Err(e)
        }
    }
}

#[cfg(unix)]
async fn create_symlink(job: &LinkJob, destination: &Path) -> std::io::Result<()> {
    fs::symlink(&job.target, destination).await
}

#[cfg(windows)]
async fn create_symlink(job: &LinkJob, destination: &Path) -> std::io::Result<()> {
    // Windows needs to know whether the target is a directory
    let resolved = job
        .link_path
        .parent()
        .map_or_else(|| job.target.clone(), |parent| parent.join(&job.target));
    if fs::metadata(&resolved).await.is_ok_and(|m| m.is_dir()) {
        fs::symlink_dir(&job.target, destination).await
    } else {
        fs::symlink_file(&job.target, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::bounded;
    use async_trait::async_trait;
    use rome_types::QueueCapacity;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Records calls and fails for file names starting with "bad"
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    #[async_trait]
    impl Transform for Recorder {
        async fn transform(&self, source: &Path, destination: &Path, _: &BuildTarget) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((source.to_path_buf(), destination.to_path_buf()));
            let bad = source
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("bad"));
            if bad {
                return Err(Error::transform(source, destination, "refused"));
            }
            Ok(())
        }
    }

    fn context(source: &Path, destination: &Path) -> (WorkerContext, mpsc::UnboundedReceiver<JobFailure>) {
        let (failures, failure_rx) = mpsc::unbounded_channel();
        (
            WorkerContext {
                mapper: Arc::new(PathMapper::new(source, destination)),
                target: Arc::new(BuildTarget::new("ent", "1.0")),
                cancel: CancellationToken::new(),
                failures,
            },
            failure_rx,
        )
    }

    #[tokio::test]
    async fn test_file_pool_maps_and_continues_after_errors() {
        let (context, mut failure_rx) = context(Path::new("/src"), Path::new("/dst"));
        let (sender, receiver) = bounded(QueueCapacity::new(2).unwrap());
        let recorder = Arc::new(Recorder::default());

        let workers = spawn_file_workers(
            WorkerCount::new(3).unwrap(),
            receiver,
            recorder.clone(),
            &context,
        );

        for name in ["a.txt", "bad.txt", "sub/c.txt", "bad2.txt"] {
            sender.push(FileJob::new(Path::new("/src").join(name))).await.unwrap();
        }
        sender.push(FileJob::new("/elsewhere/x.txt")).await.unwrap();
        sender.close();

        let built = join_counts(workers).await;
        drop(context);

        assert_eq!(built, 2);
        let calls = recorder.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        assert!(calls.contains(&(PathBuf::from("/src/sub/c.txt"), PathBuf::from("/dst/sub/c.txt"))));

        let mut failures = Vec::new();
        while let Some(failure) = failure_rx.recv().await {
            failures.push(failure);
        }
        assert_eq!(failures.len(), 3);
        assert!(failures
            .iter()
            .any(|f| matches!(f.error, Error::PathMapping { .. }) && f.destination.is_none()));
    }

    #[tokio::test]
    async fn test_cancelled_workers_exit_without_draining() {
        let (context, _failure_rx) = context(Path::new("/src"), Path::new("/dst"));
        let (sender, receiver) = bounded(QueueCapacity::new(8).unwrap());
        let recorder = Arc::new(Recorder::default());

        for i in 0..5 {
            sender
                .push(FileJob::new(format!("/src/{}.txt", i)))
                .await
                .unwrap();
        }
        context.cancel.cancel();

        let workers = spawn_file_workers(WorkerCount::new(2).unwrap(), receiver, recorder.clone(), &context);
        for worker in workers {
            assert_eq!(worker.await.unwrap(), 0);
        }
        assert!(recorder.calls.lock().unwrap().is_empty());
        drop(sender);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_link_pool_recreates_target_string() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        std::fs::create_dir_all(source.join("sub")).unwrap();
        std::fs::create_dir_all(destination.join("sub/occupied")).unwrap();
        std::os::unix::fs::symlink("../missing/target", source.join("sub/dangling")).unwrap();

        let (context, mut failure_rx) = context(&source, &destination);
        let (sender, receiver) = bounded(QueueCapacity::new(1).unwrap());
        let workers = spawn_link_workers(WorkerCount::new(1).unwrap(), receiver, &context);

        // a directory in the way fails the job but does not stop the worker
        sender
            .push(LinkJob::new(source.join("sub/occupied"), "elsewhere"))
            .await
            .unwrap();
        sender
            .push(LinkJob::new(source.join("sub/dangling"), "../missing/target"))
            .await
            .unwrap();
        sender.close();

        let created: u64 = join_counts(workers).await;
        drop(context);

        assert_eq!(created, 1);
        let link = destination.join("sub/dangling");
        assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("../missing/target"));
        assert!(destination.join("sub/occupied").is_dir());

        let failure = failure_rx.recv().await.unwrap();
        assert_eq!(failure.kind(), rome_types::ErrorKind::Link);
        assert!(failure_rx.recv().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_link_from_earlier_build_is_replaced() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&destination).unwrap();
        std::os::unix::fs::symlink("old-target", destination.join("current")).unwrap();
        std::fs::write(destination.join("was-a-file"), "old").unwrap();

        let (context, mut failure_rx) = context(&source, &destination);
        let (sender, receiver) = bounded(QueueCapacity::new(4).unwrap());
        let workers = spawn_link_workers(WorkerCount::new(2).unwrap(), receiver, &context);

        sender
            .push(LinkJob::new(source.join("current"), "new-target"))
            .await
            .unwrap();
        sender
            .push(LinkJob::new(source.join("was-a-file"), "current"))
            .await
            .unwrap();
        sender.close();

        assert_eq!(join_counts(workers).await, 2);
        drop(context);

        assert_eq!(
            std::fs::read_link(destination.join("current")).unwrap(),
            PathBuf::from("new-target")
        );
        assert_eq!(
            std::fs::read_link(destination.join("was-a-file")).unwrap(),
            PathBuf::from("current")
        );
        assert!(failure_rx.recv().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_directory_link_is_not_followed() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        let outside = temp_dir.path().join("outside");
        std::fs::create_dir_all(source.join("sub")).unwrap();
        std::fs::create_dir_all(&destination).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        // an earlier build left `sub` as a link pointing out of the tree
        std::os::unix::fs::symlink(&outside, destination.join("sub")).unwrap();

        clear_stale_ancestors(&destination, &destination.join("sub/deeper/b.txt"))
            .await
            .unwrap();

        assert!(!destination.join("sub").exists());
        assert!(outside.is_dir());
        std::fs::create_dir_all(destination.join("sub/deeper")).unwrap();
        assert_eq!(std::fs::read_dir(&outside).unwrap().count(), 0);
    }

    async fn join_counts(workers: Vec<JoinHandle<u64>>) -> u64 {
        let mut total = 0;
        for worker in workers {
            total += worker.await.unwrap();
        }
        total
    }
}

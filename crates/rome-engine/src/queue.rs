//! Bounded job queues with backpressure
//!
//! Each queue is a bounded `tokio::sync::mpsc` channel. The walker holds the
//! only [`JobSender`]; the worker pool shares the receiving end through an
//! async mutex, so any number of workers can pop from one queue. Dropping
//! (or [`JobSender::close`]-ing) the sender closes the queue: workers drain
//! what is left and then see `None`.

use rome_types::{Error, QueueCapacity, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

/// Counters shared by both ends of a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Jobs accepted by the queue
    pub pushed: AtomicU64,
    /// Jobs handed to a worker
    pub popped: AtomicU64,
    /// Pushes that found the queue full and had to wait
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`QueueStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Jobs accepted by the queue
    pub pushed: u64,
    /// Jobs handed to a worker
    pub popped: u64,
    /// Pushes that had to wait for space
    pub backpressure_events: u64,
}

/// Create a bounded queue
pub fn bounded<T>(capacity: QueueCapacity) -> (JobSender<T>, JobReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity.get());
    let stats = Arc::new(QueueStats::default());

    (
        JobSender {
            sender,
            stats: Arc::clone(&stats),
        },
        JobReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
            stats,
        },
    )
}

/// Producing end of a queue
#[derive(Debug)]
pub struct JobSender<T> {
    sender: mpsc::Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> JobSender<T> {
    /// Push from a blocking thread, waiting while the queue is full
    ///
    /// Must not be called from inside the async runtime. Fails only when
    /// every receiver is gone, which happens after cancellation.
    pub fn blocking_push(&self, job: T) -> Result<()> {
        match self.sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                self.stats
                    .backpressure_events
                    .fetch_add(1, Ordering::Relaxed);
                self.sender.blocking_send(job).map_err(|_| Error::Cancelled)?;
            }
            Err(TrySendError::Closed(_)) => return Err(Error::Cancelled),
        }

        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Push from async code, waiting while the queue is full
    pub async fn push(&self, job: T) -> Result<()> {
        match self.sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                self.stats
                    .backpressure_events
                    .fetch_add(1, Ordering::Relaxed);
                self.sender.send(job).await.map_err(|_| Error::Cancelled)?;
            }
            Err(TrySendError::Closed(_)) => return Err(Error::Cancelled),
        }

        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close the queue; pending jobs stay poppable
    pub fn close(self) {
        drop(self);
    }

    /// Queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Consuming end of a queue, cloned once per worker
#[derive(Debug)]
pub struct JobReceiver<T> {
    receiver: Arc<Mutex<mpsc::Receiver<T>>>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for JobReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> JobReceiver<T> {
    /// Next job, or `None` once the queue is closed and drained
    ///
    /// Cancel safe: a job is never lost if the future is dropped.
    pub async fn pop(&self) -> Option<T> {
        let job = self.receiver.lock().await.recv().await;
        if job.is_some() {
            self.stats.popped.fetch_add(1, Ordering::Relaxed);
        }
        job
    }

    /// Queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn capacity(n: usize) -> QueueCapacity {
        QueueCapacity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_drains_after_close() {
        let (sender, receiver) = bounded(capacity(4));
        sender.push(1).await.unwrap();
        sender.push(2).await.unwrap();
        sender.close();

        assert_eq!(receiver.pop().await, Some(1));
        assert_eq!(receiver.pop().await, Some(2));
        assert_eq!(receiver.pop().await, None);
        assert_eq!(receiver.stats().snapshot().popped, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_exactly_once_with_many_consumers() {
        let (sender, receiver) = bounded(capacity(1));
        let total = 500u32;

        let producer = tokio::task::spawn_blocking(move || {
            for i in 0..total {
                sender.blocking_push(i).unwrap();
            }
            let stats = sender.stats();
            sender.close();
            stats
        });

        let mut consumers = Vec::new();
        for _ in 0..8 {
            let receiver = receiver.clone();
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(job) = receiver.pop().await {
                    seen.push(job);
                }
                seen
            }));
        }

        let stats = producer.await.unwrap();
        let mut all = HashSet::new();
        let mut count = 0;
        for consumer in consumers {
            for job in consumer.await.unwrap() {
                all.insert(job);
                count += 1;
            }
        }

        assert_eq!(count, total as usize);
        assert_eq!(all.len(), total as usize);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.pushed, u64::from(total));
        assert_eq!(snapshot.popped, u64::from(total));
    }

    #[tokio::test]
    async fn test_backpressure_counted() {
        let (sender, receiver) = bounded(capacity(1));
        sender.push(1).await.unwrap();
        let stats = sender.stats();

        let pusher = tokio::spawn(async move {
            sender.push(2).await.unwrap();
        });

        while stats.snapshot().backpressure_events == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(receiver.pop().await, Some(1));
        pusher.await.unwrap();
        assert_eq!(receiver.pop().await, Some(2));
        assert_eq!(stats.snapshot().backpressure_events, 1);
    }

    #[tokio::test]
    async fn test_push_after_receivers_dropped() {
        let (sender, receiver) = bounded::<u8>(capacity(2));
        drop(receiver);
        assert!(matches!(sender.push(1).await, Err(Error::Cancelled)));
    }
}

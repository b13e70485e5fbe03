//! Per-adapter rate-limited request queue.
//!
//! Work is drained in FIFO batches of at most `max_concurrent` tasks. Each
//! batch runs to completion, then the drain loop sleeps for the inter-batch
//! delay before taking the next one. Callers are never rejected; they only
//! wait longer.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{trace, warn};

type Job = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The task was dropped (it panicked) before producing a value.
    #[error("queued task was dropped before completing")]
    Dropped,
}

/// Cloneable handle to one throttled queue.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    max_concurrent: usize,
    inter_batch_delay: Duration,
    jobs: Mutex<VecDeque<Job>>,
    draining: AtomicBool,
}

impl RequestQueue {
    pub fn new(max_concurrent: usize, inter_batch_delay: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                max_concurrent: max_concurrent.max(1),
                inter_batch_delay,
                jobs: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
            }),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    pub fn inter_batch_delay(&self) -> Duration {
        self.inner.inter_batch_delay
    }

    pub fn pending(&self) -> usize {
        self.inner.lock_jobs().len()
    }

    /// Queue `task` and wait for its output.
    pub async fn enqueue<F, Fut, T>(&self, task: F) -> Result<T, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let value = task().await;
                // The caller may have stopped waiting.
                let _ = sender.send(value);
            })
        });

        self.inner.lock_jobs().push_back(job);
        self.start_draining();

        receiver.await.map_err(|_| QueueError::Dropped)
    }

    fn start_draining(&self) {
        if self.inner.try_claim_drain() {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.drain());
        }
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("max_concurrent", &self.inner.max_concurrent)
            .field("inter_batch_delay", &self.inner.inter_batch_delay)
            .field("pending", &self.pending())
            .field("draining", &self.inner.draining.load(Ordering::Acquire))
            .finish()
    }
}

impl QueueInner {
    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_claim_drain(&self) -> bool {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn take_batch(&self) -> Vec<Job> {
        let mut jobs = self.lock_jobs();
        let size = jobs.len().min(self.max_concurrent);
        jobs.drain(..size).collect()
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let batch = self.take_batch();
            if batch.is_empty() {
                self.draining.store(false, Ordering::Release);
                // A task may have been pushed after the empty check but
                // before the flag was cleared.
                if self.lock_jobs().is_empty() || !self.try_claim_drain() {
                    return;
                }
                continue;
            }

            trace!(batch = batch.len(), "running queued batch");
            let handles: Vec<_> = batch.into_iter().map(|job| tokio::spawn(job())).collect();
            for outcome in join_all(handles).await {
                if let Err(error) = outcome {
                    warn!(error = %error, "queued task did not complete");
                }
            }

            tokio::time::sleep(self.inter_batch_delay).await;
        }
    }
}

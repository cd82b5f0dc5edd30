//! Bounded-concurrency work queue
//!
//! Admission control for download tasks: at most `limit` tasks run at once,
//! the rest wait in FIFO order. Task panics or failures never affect other
//! queued tasks; each task owns its permit for exactly its own runtime.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// FIFO work queue with a fixed concurrency cap.
///
/// Reconfiguring the cap is done by replacing the queue; tasks admitted
/// under the old queue finish under the old cap (they hold clones of the
/// old semaphore), new submissions see the new cap.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl WorkQueue {
    /// Create a queue allowing `limit` concurrent tasks.
    ///
    /// `limit` must be at least 1; configuration validation enforces this
    /// before a queue is ever built.
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// The concurrency cap this queue was built with
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Submit a task for execution.
    ///
    /// The task is spawned immediately but waits for a permit before its
    /// body runs. tokio's semaphore queues waiters fairly, so tasks start
    /// in submission order.
    pub fn submit<F, T>(&self, task: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            // The semaphore is never closed, but don't block the task on a
            // permit if it somehow was.
            let _permit = semaphore.acquire_owned().await.ok();
            task.await
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // -----------------------------------------------------------------------
    // Concurrency cap: with limit N and M > N tasks, the number of tasks
    // observed in flight never exceeds N
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn in_flight_tasks_never_exceed_the_cap() {
        let queue = WorkQueue::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(queue.submit(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(
            max_seen.load(Ordering::SeqCst) <= 2,
            "saw {} tasks in flight with a cap of 2",
            max_seen.load(Ordering::SeqCst)
        );
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    // -----------------------------------------------------------------------
    // Isolation: one task panicking does not prevent queued tasks from running
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn panicking_task_does_not_poison_the_queue() {
        let queue = WorkQueue::new(1);
        let completed = Arc::new(AtomicUsize::new(0));

        let bad = queue.submit(async { panic!("task blew up") });
        let completed_clone = completed.clone();
        let good = queue.submit(async move {
            completed_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bad.await.is_err(), "panicked task should surface JoinError");
        good.await.unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    // -----------------------------------------------------------------------
    // Submission order: with a cap of 1, tasks start in FIFO order
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn tasks_start_in_submission_order() {
        let queue = WorkQueue::new(1);
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let order = order.clone();
            handles.push(queue.submit(async move {
                order.lock().await.push(i);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn tasks_return_their_values() {
        let queue = WorkQueue::new(4);
        let handle = queue.submit(async { 21 * 2 });
        assert_eq!(handle.await.unwrap(), 42);
    }

    #[test]
    fn limit_is_observable() {
        assert_eq!(WorkQueue::new(7).limit(), 7);
    }
}

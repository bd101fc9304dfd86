//! Background task queue
//!
//! Detached work (saves dispatched while an editor is torn down, reminder
//! polling) runs here instead of on the caller. Failures are logged and
//! dropped since nobody is left to receive them. `shutdown` waits for
//! everything still in flight.

use crate::error::{AppError, Result};
use std::future::Future;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

#[derive(Clone, Debug)]
pub struct TaskQueue {
    tracker: TaskTracker,
    handle: Handle,
}

impl TaskQueue {
    pub fn new(handle: Handle) -> Self {
        Self {
            tracker: TaskTracker::new(),
            handle,
        }
    }

    /// Queue bound to the runtime of the calling task.
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| AppError::Runtime(format!("No tokio runtime available: {}", e)))?;
        Ok(Self::new(handle))
    }

    /// Run `task` detached. Usable from synchronous code such as `Drop`.
    pub fn dispatch<F>(&self, label: &str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let label = label.to_string();
        tracing::debug!("Dispatching background task: {}", label);

        self.tracker.spawn_on(
            async move {
                match task.await {
                    Ok(()) => tracing::debug!("Background task finished: {}", label),
                    Err(e) => tracing::warn!("Background task '{}' failed: {}", label, e),
                }
            },
            &self.handle,
        );
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait for all dispatched tasks to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        tracing::info!("Waiting for {} background task(s)", self.tracker.len());
        self.tracker.wait().await;
        tracing::info!("Background tasks drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_dispatched_tasks() {
        let queue = TaskQueue::current().unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            queue.dispatch("sleep", async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        queue.shutdown().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failed_task_is_absorbed() {
        let queue = TaskQueue::current().unwrap();

        queue.dispatch("fail", async {
            Err(AppError::Generic("network down".to_string()))
        });
        queue.shutdown().await;

        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_current_requires_runtime() {
        assert!(matches!(TaskQueue::current(), Err(AppError::Runtime(_))));
    }
}

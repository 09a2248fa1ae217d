//! Deferred work: scheduled sends and standup endings.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Time left until `unix_secs`, zero if it has passed. Saturates instead of
/// overflowing for far-future times.
pub fn delay_until(unix_secs: i64) -> Duration {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let ms = unix_secs.saturating_mul(1000).saturating_sub(now_ms).max(0);
    Duration::from_millis(ms.unsigned_abs())
}

/// Owns every pending task so they can be aborted individually or all at
/// once. Cloning shares the same task table.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        // A panicking job cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `job` after `delay`. Returns the handle used to cancel it.
    pub fn schedule<F>(&self, delay: Duration, job: F) -> Uuid
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let table = self.inner.clone();

        // Spawn while holding the table so the task cannot deregister before
        // it has been registered.
        let mut tasks = self.tasks();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
            table.lock().unwrap_or_else(|e| e.into_inner()).remove(&id);
        });
        tasks.insert(id, handle);

        debug!(task = %id, delay_ms = delay.as_millis() as u64, "task scheduled");
        id
    }

    /// Abort one pending task. Returns false if it already ran or is unknown.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.tasks().remove(&id) {
            Some(handle) => {
                handle.abort();
                debug!(task = %id, "task cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.tasks().drain().collect();
        for (_, handle) in &drained {
            handle.abort();
        }
        drained.len()
    }

    pub fn pending(&self) -> usize {
        self.tasks().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_delay_until_saturates() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(delay_until(now - 60), Duration::ZERO);
        assert!(delay_until(now + 10) > Duration::from_secs(8));
        assert!(delay_until(i64::MAX / 100) > Duration::from_secs(60 * 60 * 24 * 365));
        assert!(delay_until(i64::MAX) > Duration::from_secs(60 * 60 * 24 * 365));
        assert_eq!(delay_until(i64::MIN), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_task_runs_and_deregisters() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        scheduler.schedule(Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_cancel_prevents_run() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let id = scheduler.schedule(Duration::from_millis(50), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));

        let counter = hits.clone();
        scheduler.schedule(Duration::from_millis(50), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(scheduler.cancel_all(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}

//! Trailing-edge debouncing for bursty input such as search-as-you-type.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default quiet period before a scheduled task fires
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

/// Runs only the last task scheduled within a quiet window
///
/// There is a single pending slot. Scheduling while a task is waiting
/// replaces it. Once the window elapses the task is spawned on its own, so
/// later schedules never cancel work that has already started.
///
/// # Example
///
/// ```ignore
/// let debouncer = Debouncer::new(Duration::from_millis(300));
/// debouncer.schedule(async move { store.send(ShopAction::Search { query }).await; });
/// ```
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Debouncer with the given quiet window
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// The quiet window
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Run `task` after the window unless another task is scheduled first
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(task);
        });

        if let Some(previous) = self.slot().replace(timer) {
            if !previous.is_finished() {
                tracing::trace!("Debounced task superseded");
            }
            previous.abort();
        }
    }

    /// Drop the waiting task, if any
    ///
    /// Returns whether a task was waiting.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            },
            _ => false,
        }
    }

    /// Whether a task is waiting for its window to elapse
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(timer) = self.slot().take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Log = Arc<Mutex<Vec<&'static str>>>;
    type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

    /// A shared log and a factory for tasks that append to it
    fn recorder() -> (Log, impl Fn(&'static str) -> Task) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |label: &'static str| -> Task {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                sink.lock().unwrap_or_else(PoisonError::into_inner).push(label);
            })
        };
        (log, make)
    }

    fn entries(log: &Mutex<Vec<&'static str>>) -> Vec<&'static str> {
        log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_schedule_in_window_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (log, task) = recorder();

        debouncer.schedule(task("m"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(task("ma"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(task("mat"));
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(entries(&log), ["mat"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedules_outside_window_both_run() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (log, task) = recorder();

        debouncer.schedule(task("art"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.schedule(task("math"));
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(entries(&log), ["art", "math"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_task_is_not_cancelled() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&finished);
        debouncer.schedule(async move {
            // A slow request outliving the next schedule
            tokio::time::sleep(Duration::from_millis(500)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(350)).await;

        debouncer.schedule(async {});
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let debouncer = Debouncer::default();
        let (log, task) = recorder();

        debouncer.schedule(task("science"));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(entries(&log).is_empty());
    }
}

//! Single-slot task throttle.
//!
//! Status refreshes are triggered by satellite traffic, so a malfunctioning
//! satellite could request them far faster than they complete. A
//! [`TaskSlot`] runs at most one at a time and drops requests made while one
//! is outstanding. The work is passed as a closure and only called once the
//! slot is known to be free.

use std::future::Future;

use tokio::task::JoinHandle;

/// Runs at most one background task at a time.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Option<JoinHandle<()>>,
}

impl TaskSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `make()` as a task unless one is still running.
    ///
    /// Returns `true` if a task was started. When it returns `false`, `make`
    /// was never called.
    pub fn spawn<F, Fut>(&mut self, make: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_busy() {
            return false;
        }
        self.current = Some(tokio::spawn(make()));
        true
    }

    /// Check if a task is still running.
    pub fn is_busy(&self) -> bool {
        self.current.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        if let Some(task) = self.current.take() {
            task.abort();
        }
    }
}

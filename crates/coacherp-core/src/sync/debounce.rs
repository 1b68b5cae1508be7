//! Debounced task scheduling
//!
//! A single-shot, cancellable scheduler: `schedule` arms a timer and runs
//! the task when it fires; scheduling again before then cancels the armed
//! task and restarts the window. Built on `tokio::time`, so tests drive it
//! with virtual time.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Single-shot cancellable scheduler
#[derive(Debug, Default)]
pub struct Debouncer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, cancelling any previously armed task
    ///
    /// Only the last scheduled task within a quiet window actually runs.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.handle.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancel the armed task, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Whether a task is armed and has not completed yet
    pub fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

#![forbid(unsafe_code)]

//! UI dispatchers for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use osr_backend::{UiDispatcher, UiTask};

/// Runs every task immediately on the posting thread.
#[derive(Debug, Default)]
pub struct InlineUiDispatcher {
    posted: AtomicUsize,
}

impl InlineUiDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks posted so far.
    #[must_use]
    pub fn posted(&self) -> usize {
        self.posted.load(Ordering::SeqCst)
    }
}

impl UiDispatcher for InlineUiDispatcher {
    fn post(&self, task: UiTask) {
        self.posted.fetch_add(1, Ordering::SeqCst);
        task();
    }
}

/// Holds tasks until the test pumps them, like a UI thread that has not run
/// yet.
#[derive(Default)]
pub struct QueuedUiDispatcher {
    queue: Mutex<VecDeque<UiTask>>,
}

impl std::fmt::Debug for QueuedUiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedUiDispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}

impl QueuedUiDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Run queued tasks in FIFO order until the queue is empty, including
    /// tasks posted while pumping. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queue.lock().unwrap().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl UiDispatcher for QueuedUiDispatcher {
    fn post(&self, task: UiTask) {
        self.queue.lock().unwrap().push_back(task);
    }
}

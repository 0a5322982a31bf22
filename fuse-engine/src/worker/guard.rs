use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marks `exists` true for the lifetime of the worker thread that holds
/// it, so shutdown code can poll whether a thread is still alive without
/// joining it eagerly.
pub(crate) struct WorkerGuard {
    exists: Arc<AtomicBool>,
}

impl WorkerGuard {
    pub(super) fn new(exists: Arc<AtomicBool>) -> Self {
        exists.store(true, Ordering::Relaxed);
        Self { exists }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.exists.store(false, Ordering::Relaxed);
    }
}

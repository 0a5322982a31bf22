//! Background status reporter: periodically polls an [`Engine`] and
//! invokes a callback only when the reported state actually changes,
//! the same change-detection loop used elsewhere in this codebase for
//! cheap progress polling.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::engine::{Engine, PlaybackState};

/// A point-in-time summary of transport state, suitable for printing or
/// forwarding to a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub phase: PlaybackState,
    pub current_time_ms: u64,
    pub total_duration_ms: u32,
}

impl StatusReport {
    fn sample(engine: &Engine) -> Self {
        Self {
            phase: engine.phase(),
            current_time_ms: engine.current_time_ms(),
            total_duration_ms: engine.total_duration_ms(),
        }
    }
}

/// Polls an engine on a background thread and invokes `on_change`
/// whenever the sampled [`StatusReport`] differs from the last one.
pub struct StatusReporter {
    handle: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<std::sync::atomic::AtomicBool>,
}

impl StatusReporter {
    /// Starts polling immediately, every `poll_interval`.
    pub fn start(
        engine: Arc<Engine>,
        poll_interval: Duration,
        on_change: impl Fn(StatusReport) + Send + 'static,
    ) -> Self {
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::spawn(move || {
            let mut last: Option<StatusReport> = None;
            while !stop_flag.load(std::sync::atomic::Ordering::Relaxed) {
                let report = StatusReport::sample(&engine);
                if last != Some(report) {
                    on_change(report);
                    last = Some(report);
                }
                thread::sleep(poll_interval);
            }
        });

        Self {
            handle: Mutex::new(Some(handle)),
            stop,
        }
    }

    /// Stops polling and joins the background thread. Warns (rather than
    /// panicking) if called from within the reporter's own thread.
    pub fn stop(&self) {
        self.stop.store(true, std::sync::atomic::Ordering::Relaxed);
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                warn!("status reporter stop() called from its own thread, skipping join");
                return;
            }
            let _ = handle.join();
        }
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

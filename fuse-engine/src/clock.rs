//! Injectable monotonic clock, so playback timing is testable without
//! sleeping real wall-clock time in unit tests.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of monotonic milliseconds. The engine only ever reads elapsed
/// time through this trait, never `Instant::now()` directly, so tests can
/// substitute [`FakeClock`] for deterministic schedules.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Real wall-clock time, backed by [`Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Deterministic clock for tests: advances only when told to.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    millis: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        let mut millis = self.millis.lock().unwrap();
        *millis += delta.as_millis() as u64;
    }

    pub fn set(&self, ms: u64) {
        *self.millis.lock().unwrap() = ms;
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        *self.millis.lock().unwrap()
    }
}

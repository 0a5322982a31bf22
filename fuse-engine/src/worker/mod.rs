//! One cooperative worker thread per score event. Workers wait on a
//! signal latch, then perform light → hold → extinguish against their
//! resolved actuator register, independent of every other event's worker
//! so overlapping events on the same fuse queue independently.

mod context;
mod guard;
mod runner;

pub(crate) use context::WorkerContext;
pub(crate) use guard::WorkerGuard;
pub(crate) use runner::run_worker;

use std::sync::{Arc, Condvar, Mutex};

/// Per-event wait latch: the driver sets `scheduled` and notifies; the
/// worker resets it to `false` on wake.
#[derive(Debug, Default)]
pub struct FuseSlot {
    state: Mutex<SlotState>,
    condvar: Condvar,
}

#[derive(Debug, Default)]
struct SlotState {
    scheduled: bool,
    halt: bool,
}

impl FuseSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sets the scheduled latch and wakes the worker. Called by the
    /// driver thread on a due tick.
    pub fn signal(&self) {
        let mut state = self.state.lock().unwrap();
        state.scheduled = true;
        self.condvar.notify_one();
    }

    /// Permanently wakes the worker for shutdown.
    pub fn halt(&self) {
        let mut state = self.state.lock().unwrap();
        state.halt = true;
        self.condvar.notify_one();
    }

    /// Blocks until either `scheduled` or `halt` is set, then clears
    /// `scheduled` and reports which woke it.
    fn wait(&self) -> WakeReason {
        let mut state = self.state.lock().unwrap();
        while !state.scheduled && !state.halt {
            state = self.condvar.wait(state).unwrap();
        }
        if state.halt {
            return WakeReason::Halt;
        }
        state.scheduled = false;
        WakeReason::Scheduled
    }
}

#[derive(Debug, PartialEq, Eq)]
enum WakeReason {
    Scheduled,
    Halt,
}

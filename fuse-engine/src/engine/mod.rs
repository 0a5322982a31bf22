//! The playback engine: owns the decoded score, the actuator registry,
//! the worker fleet, and the driver thread, and exposes transport
//! controls plus queryable state to arbitrary caller threads.

mod command;
mod driver;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

use crate::actuator::{ActuatorBus, ActuatorRegistry};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{ActuatorError, EngineError};
use crate::score::{self, Score};
use crate::worker::{run_worker, FuseSlot, WorkerContext};

use command::{Command, CommandMailbox};
use state::PlaybackSnapshot;

/// Re-exported so callers can match on the plain transport phase without
/// reaching into the engine's internal state machine. Mirrors
/// `PlaybackState` from the data model 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Parameters for [`Engine::init`].
pub struct EngineConfig {
    pub score_bytes: Vec<u8>,
    pub bus: Arc<dyn ActuatorBus>,
    pub fuse_duration_ms: u16,
    pub time_resolution_ms: u32,
}

/// The sequence-playback engine. Cloning is not supported; share an
/// `Engine` across threads behind an `Arc` if multiple callers need to
/// issue transport commands.
pub struct Engine {
    score: Score,
    fuse_duration_ms: u16,
    mailbox: Arc<CommandMailbox>,
    snapshot: Arc<PlaybackSnapshot>,
    last_error: Arc<Mutex<EngineError>>,
    last_actuator_error: Arc<Mutex<Option<(u8, ActuatorError)>>>,
    halt: Arc<AtomicBool>,
    stopped_notify: Arc<(Mutex<bool>, Condvar)>,
    clock: Arc<dyn Clock>,
    driver_handle: Option<JoinHandle<()>>,
    worker_handles: Vec<JoinHandle<()>>,
    worker_slots: Vec<Arc<FuseSlot>>,
    worker_alive: Vec<Arc<AtomicBool>>,
    _registry: ActuatorRegistry,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Decodes the score, opens and probes every actuator the score
    /// needs, spawns one worker per event, and starts the driver thread.
    /// Returns a fatal [`EngineError`] (never panics) if any of that
    /// fails.
    pub fn init(config: EngineConfig) -> Result<Self, EngineError> {
        Self::init_with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// As [`Engine::init`], but with an injectable clock — used by
    /// integration tests that need deterministic timing.
    pub fn init_with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        let score = score::decode(&config.score_bytes)?;
        let registry = ActuatorRegistry::open(score.device_mask(), config.bus.as_ref())?;

        let last_actuator_error = Arc::new(Mutex::new(None));
        let fuse_duration = Duration::from_millis(config.fuse_duration_ms as u64);

        let mut worker_slots = Vec::with_capacity(score.event_count());
        let mut worker_handles = Vec::with_capacity(score.event_count());
        let mut worker_alive = Vec::with_capacity(score.event_count());

        for (index, event) in score.events().iter().enumerate() {
            let slot = FuseSlot::new();
            worker_slots.push(slot.clone());

            let actuator = registry
                .get(event.device_index)
                .expect("decoder guarantees every event's device is present in the mask")
                .clone();

            let context = WorkerContext::new(
                index,
                event.device_index,
                event.fuse_index,
                slot,
                actuator,
                fuse_duration,
                last_actuator_error.clone(),
            );
            let alive = Arc::new(AtomicBool::new(false));
            worker_alive.push(alive.clone());
            worker_handles.push(thread::spawn(move || run_worker(context, alive)));
        }

        let mailbox = Arc::new(CommandMailbox::new());
        let snapshot = Arc::new(PlaybackSnapshot::new());
        let last_error = Arc::new(Mutex::new(EngineError::NoError));
        let halt = Arc::new(AtomicBool::new(false));
        let stopped_notify = Arc::new((Mutex::new(true), Condvar::new()));

        let driver_ctx = driver::DriverContext {
            mailbox: mailbox.clone(),
            events: Arc::new(score.events().to_vec()),
            slots: worker_slots.clone(),
            snapshot: snapshot.clone(),
            last_error: last_error.clone(),
            halt: halt.clone(),
            clock: clock.clone(),
            time_resolution: Duration::from_millis(config.time_resolution_ms as u64),
            stopped_notify: stopped_notify.clone(),
        };
        let driver_handle = thread::spawn(move || driver::run_driver(driver_ctx));

        info!(
            "engine initialized: {} events across {} devices",
            score.event_count(),
            score.device_mask().count_ones()
        );

        Ok(Self {
            score,
            fuse_duration_ms: config.fuse_duration_ms,
            mailbox,
            snapshot,
            last_error,
            last_actuator_error,
            halt,
            stopped_notify,
            clock,
            driver_handle: Some(driver_handle),
            worker_handles,
            worker_slots,
            worker_alive,
            _registry: registry,
        })
    }

    /// Number of worker threads currently parked or igniting, as opposed
    /// to ones that have already observed halt and exited. Useful as a
    /// diagnostic during shutdown; not part of the transport contract.
    pub fn live_worker_count(&self) -> usize {
        self.worker_alive
            .iter()
            .filter(|alive| alive.load(Ordering::Relaxed))
            .count()
    }

    /// Precondition `!is_playing`; returns `false` with `AlreadyPlaying`
    /// latched otherwise.
    pub fn play(&self, barrier: Option<Arc<Barrier>>) -> bool {
        self.submit_conditional(Command::Play, barrier, |s| !s.is_playing())
    }

    /// Precondition `is_playing`; returns `false` with `AlreadyPaused`
    /// latched otherwise.
    pub fn pause(&self, barrier: Option<Arc<Barrier>>) -> bool {
        self.submit_conditional(Command::Pause, barrier, |s| s.is_playing())
    }

    /// Unconditional.
    pub fn stop(&self, barrier: Option<Arc<Barrier>>) {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        self.mailbox.submit(Command::Stop, barrier);
    }

    /// Unconditional; latches `JumpedBeyondEnd` if `ms` exceeds
    /// `total_duration_ms` but still applies the jump.
    pub fn jump(&self, barrier: Option<Arc<Barrier>>, ms: u32) {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        self.mailbox.submit(Command::Jump(ms), barrier);
    }

    fn submit_conditional(
        &self,
        command: Command,
        barrier: Option<Arc<Barrier>>,
        precondition: impl Fn(&PlaybackSnapshot) -> bool,
    ) -> bool {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        if !precondition(&self.snapshot) {
            let warning = match command {
                Command::Play => EngineError::AlreadyPlaying,
                Command::Pause => EngineError::AlreadyPaused,
                _ => unreachable!("only play/pause carry a precondition"),
            };
            *self.last_error.lock().unwrap() = warning;
            return false;
        }
        self.mailbox.submit(command, barrier);
        true
    }

    pub fn is_playing(&self) -> bool {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        self.snapshot.is_playing()
    }

    pub fn is_paused(&self) -> bool {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        self.snapshot.is_paused()
    }

    /// Convenience query collapsing `is_playing`/`is_paused` into a
    /// single three-way phase, for callers (like `fuse-cli status`) that
    /// want a `match` instead of two booleans.
    pub fn phase(&self) -> PlaybackState {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        if self.snapshot.is_playing() {
            PlaybackState::Playing
        } else if self.snapshot.is_paused() {
            PlaybackState::Paused
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn current_time_ms(&self) -> u64 {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        self.snapshot.current_time_ms(self.clock.now_ms())
    }

    /// `events[last].timestamp_ms + fuse_duration_ms`, matching the
    /// original's definition exactly (the score alone only knows the
    /// last event's timestamp; the hold time is an engine-level config).
    pub fn total_duration_ms(&self) -> u32 {
        *self.last_error.lock().unwrap() = EngineError::NoError;
        self.score.total_duration_ms() + self.fuse_duration_ms as u32
    }

    /// Most recent latched error or warning. If a worker thread hit an
    /// I2C failure since the last query, that takes priority and is
    /// surfaced exactly once (spec: "surfaced on the next caller query").
    pub fn last_error(&self) -> EngineError {
        if let Some((device_index, source)) = self.last_actuator_error.lock().unwrap().take() {
            return EngineError::ActuatorBusError { device_index, source };
        }
        self.last_error.lock().unwrap().clone()
    }

    /// Blocks the calling thread until the engine reaches the Stopped
    /// state (either via an explicit `stop` or auto-stop at score end).
    /// Returns immediately if already stopped. This is ambient
    /// enrichment (the original only supports busy-polling `isPlaying`).
    pub fn wait_until_stopped(&self) {
        let (lock, condvar) = &*self.stopped_notify;
        let mut stopped = lock.lock().unwrap();
        while !*stopped {
            stopped = condvar.wait(stopped).unwrap();
        }
    }

    /// Explicit, observable teardown: halts workers, joins every thread,
    /// releases actuator handles. Equivalent to dropping the engine, but
    /// lets a caller confirm shutdown completed rather than relying on
    /// `Drop`'s best-effort join.
    pub fn shutdown(mut self) {
        self.halt_and_join();
    }

    fn halt_and_join(&mut self) {
        self.halt.store(true, Ordering::Relaxed);
        for slot in &self.worker_slots {
            slot.halt();
        }
        if let Some(handle) = self.driver_handle.take() {
            let _ = handle.join();
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.halt_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::loopback::LoopbackBus;
    use crate::clock::FakeClock;

    fn score_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"FUSE");
        bytes.push(2);
        bytes.extend_from_slice(&0x0001u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(0);
        bytes.push(0);
        bytes.extend_from_slice(&[0xFF, 0xFF]);
        bytes.extend_from_slice(&500u32.to_le_bytes());
        bytes.push(0);
        bytes.push(3);
        bytes.extend_from_slice(&[0xFF, 0xFF]);
        bytes
    }

    #[test]
    fn rejects_invalid_magic() {
        let mut bytes = score_bytes();
        bytes[0] = b'X';
        let config = EngineConfig {
            score_bytes: bytes,
            bus: Arc::new(LoopbackBus::new()),
            fuse_duration_ms: 200,
            time_resolution_ms: 10,
        };
        let err = Engine::init(config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMagic));
    }

    #[test]
    fn play_pause_play_round_trip_returns_bool() {
        let clock = Arc::new(FakeClock::new());
        let config = EngineConfig {
            score_bytes: score_bytes(),
            bus: Arc::new(LoopbackBus::new()),
            fuse_duration_ms: 50,
            time_resolution_ms: 5,
        };
        let engine = Engine::init_with_clock(config, clock).unwrap();
        assert!(engine.play(None));
        assert!(!engine.play(None));
        assert!(matches!(engine.last_error(), EngineError::AlreadyPlaying));
        assert!(engine.pause(None));
        assert!(!engine.pause(None));
        assert!(matches!(engine.last_error(), EngineError::AlreadyPaused));
    }

    #[test]
    fn total_duration_includes_fuse_hold_time() {
        let config = EngineConfig {
            score_bytes: score_bytes(),
            bus: Arc::new(LoopbackBus::new()),
            fuse_duration_ms: 200,
            time_resolution_ms: 10,
        };
        let engine = Engine::init(config).unwrap();
        assert_eq!(engine.total_duration_ms(), 700);
    }
}

//! Transport state machine, applied exclusively by the Engine Driver
//! thread. Never wrapped in a `Mutex`: only the driver ever touches it,
//! callers observe snapshots published through atomics on [`Engine`]
//! after each transition.
//!
//! [`Engine`]: crate::engine::Engine

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::error::EngineError;
use crate::score::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Playing,
    Paused,
}

impl Phase {
    fn to_code(self) -> u8 {
        match self {
            Phase::Stopped => 0,
            Phase::Playing => 1,
            Phase::Paused => 2,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            1 => Phase::Playing,
            2 => Phase::Paused,
            _ => Phase::Stopped,
        }
    }
}

/// Lock-free snapshot of the fields a caller thread needs to answer
/// `is_playing`/`is_paused`/`current_time_ms`, published by the driver
/// after every transition so callers never touch [`PlaybackState`]
/// directly.
#[derive(Debug)]
pub(crate) struct PlaybackSnapshot {
    phase: AtomicU8,
    start_ms: AtomicU64,
    pause_started_ms: AtomicU64,
}

impl PlaybackSnapshot {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Stopped.to_code()),
            start_ms: AtomicU64::new(0),
            pause_started_ms: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, state: &PlaybackState) {
        self.start_ms.store(state.start_ms, Ordering::Relaxed);
        self.pause_started_ms.store(state.pause_started_ms, Ordering::Relaxed);
        self.phase.store(state.phase.to_code(), Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        Phase::from_code(self.phase.load(Ordering::Acquire)) == Phase::Playing
    }

    pub fn is_paused(&self) -> bool {
        Phase::from_code(self.phase.load(Ordering::Acquire)) == Phase::Paused
    }

    pub fn current_time_ms(&self, now_ms: u64) -> u64 {
        match Phase::from_code(self.phase.load(Ordering::Acquire)) {
            Phase::Playing => now_ms.saturating_sub(self.start_ms.load(Ordering::Relaxed)),
            Phase::Paused => self
                .pause_started_ms
                .load(Ordering::Relaxed)
                .saturating_sub(self.start_ms.load(Ordering::Relaxed)),
            Phase::Stopped => 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct PlaybackState {
    phase: Phase,
    start_ms: u64,
    pause_started_ms: u64,
    next_event_index: usize,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Stopped,
            start_ms: 0,
            pause_started_ms: 0,
            next_event_index: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn next_event_index(&self) -> usize {
        self.next_event_index
    }

    /// `Ok(())` applies the transition; `Err` latches a warning and
    /// leaves state unchanged.
    pub fn apply_play(&mut self, now_ms: u64) -> Result<(), EngineError> {
        match self.phase {
            Phase::Stopped => {
                self.start_ms = now_ms;
                self.phase = Phase::Playing;
                Ok(())
            }
            Phase::Paused => {
                self.start_ms += now_ms.saturating_sub(self.pause_started_ms);
                self.phase = Phase::Playing;
                Ok(())
            }
            Phase::Playing => Err(EngineError::AlreadyPlaying),
        }
    }

    pub fn apply_pause(&mut self, now_ms: u64) -> Result<(), EngineError> {
        match self.phase {
            Phase::Playing => {
                self.pause_started_ms = now_ms;
                self.phase = Phase::Paused;
                Ok(())
            }
            Phase::Paused | Phase::Stopped => Err(EngineError::AlreadyPaused),
        }
    }

    /// Unconditional; resets to score-time zero.
    pub fn apply_stop(&mut self, now_ms: u64) {
        self.start_ms = now_ms;
        self.pause_started_ms = now_ms;
        self.next_event_index = 0;
        self.phase = Phase::Stopped;
    }

    /// Unconditional; jumps score-time to `target_ms` and repositions
    /// `next_event_index` to the smallest index whose timestamp is `>=
    /// target_ms`. Applies even when `target_ms` exceeds
    /// `total_duration_ms` (the caller latches `JumpedBeyondEnd`).
    pub fn apply_jump(&mut self, now_ms: u64, target_ms: u32, events: &[Event]) {
        self.start_ms = now_ms.saturating_sub(target_ms as u64);
        self.next_event_index = events
            .iter()
            .position(|event| event.timestamp_ms >= target_ms)
            .unwrap_or(events.len());
        if self.phase == Phase::Paused {
            self.pause_started_ms = now_ms;
        }
    }

    /// Dispatches every event now due, advancing `next_event_index`.
    /// Returns the indices to signal, in order, plus whether the score
    /// is now exhausted (the driver auto-stops on `true`).
    pub fn tick(&mut self, now_ms: u64, events: &[Event]) -> (Vec<usize>, bool) {
        if self.phase != Phase::Playing {
            return (Vec::new(), false);
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let mut due = Vec::new();
        while self.next_event_index < events.len()
            && events[self.next_event_index].timestamp_ms as u64 <= elapsed
        {
            due.push(self.next_event_index);
            self.next_event_index += 1;
        }
        let exhausted = self.next_event_index == events.len();
        (due, exhausted)
    }

    /// `now − startMs` while playing; frozen at the moment pause began
    /// while paused; `0` while stopped.
    pub fn current_time_ms(&self, now_ms: u64) -> u64 {
        match self.phase {
            Phase::Playing => now_ms.saturating_sub(self.start_ms),
            Phase::Paused => self.pause_started_ms.saturating_sub(self.start_ms),
            Phase::Stopped => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events() -> Vec<Event> {
        vec![
            Event { timestamp_ms: 0, device_index: 0, fuse_index: 0 },
            Event { timestamp_ms: 500, device_index: 0, fuse_index: 3 },
        ]
    }

    #[test]
    fn play_from_stopped_sets_start_ms_to_now() {
        let mut state = PlaybackState::new();
        state.apply_play(1000).unwrap();
        assert!(state.is_playing());
        assert_eq!(state.current_time_ms(1000), 0);
    }

    #[test]
    fn pause_then_play_reclaims_paused_span() {
        let mut state = PlaybackState::new();
        state.apply_play(0).unwrap();
        state.apply_pause(100).unwrap();
        assert_eq!(state.current_time_ms(500), 100);
        state.apply_play(500).unwrap();
        assert_eq!(state.current_time_ms(500), 100);
        assert_eq!(state.current_time_ms(600), 200);
    }

    #[test]
    fn play_while_playing_is_rejected() {
        let mut state = PlaybackState::new();
        state.apply_play(0).unwrap();
        assert!(matches!(state.apply_play(10), Err(EngineError::AlreadyPlaying)));
    }

    #[test]
    fn pause_while_stopped_is_rejected() {
        let mut state = PlaybackState::new();
        assert!(matches!(state.apply_pause(0), Err(EngineError::AlreadyPaused)));
    }

    #[test]
    fn tick_dispatches_prefix_and_reports_exhaustion() {
        let mut state = PlaybackState::new();
        let events = events();
        state.apply_play(0).unwrap();
        let (due, exhausted) = state.tick(0, &events);
        assert_eq!(due, vec![0]);
        assert!(!exhausted);
        let (due, exhausted) = state.tick(500, &events);
        assert_eq!(due, vec![1]);
        assert!(exhausted);
    }

    #[test]
    fn jump_repositions_next_event_index() {
        let mut state = PlaybackState::new();
        let events = events();
        state.apply_play(0).unwrap();
        state.apply_jump(1000, 500, &events);
        assert_eq!(state.next_event_index(), 1);
        state.apply_jump(2000, 10_000, &events);
        assert_eq!(state.next_event_index(), 2);
    }

    #[test]
    fn stop_resets_to_beginning() {
        let mut state = PlaybackState::new();
        let events = events();
        state.apply_play(0).unwrap();
        state.tick(500, &events);
        state.apply_stop(600);
        assert!(!state.is_playing());
        assert_eq!(state.next_event_index(), 0);
        assert_eq!(state.current_time_ms(700), 0);
    }

    #[test]
    fn snapshot_mirrors_published_state() {
        let mut state = PlaybackState::new();
        let snapshot = PlaybackSnapshot::new();
        state.apply_play(0).unwrap();
        snapshot.publish(&state);
        assert!(snapshot.is_playing());
        assert_eq!(snapshot.current_time_ms(300), 300);
    }
}

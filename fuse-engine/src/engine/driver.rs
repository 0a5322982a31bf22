//! The Engine Driver: a single dedicated thread that polls the command
//! mailbox, applies state transitions, sleeps one quantum, and ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::clock::Clock;
use crate::engine::command::{rendezvous, Command, CommandMailbox};
use crate::engine::state::{PlaybackSnapshot, PlaybackState};
use crate::error::EngineError;
use crate::score::Event;
use crate::worker::FuseSlot;

pub(crate) struct DriverContext {
    pub mailbox: Arc<CommandMailbox>,
    pub events: Arc<Vec<Event>>,
    pub slots: Vec<Arc<FuseSlot>>,
    pub snapshot: Arc<PlaybackSnapshot>,
    pub last_error: Arc<Mutex<EngineError>>,
    pub halt: Arc<AtomicBool>,
    pub clock: Arc<dyn Clock>,
    pub time_resolution: Duration,
    pub stopped_notify: Arc<(Mutex<bool>, Condvar)>,
}

pub(crate) fn run_driver(ctx: DriverContext) {
    let mut state = PlaybackState::new();
    ctx.snapshot.publish(&state);

    loop {
        if let Some(pending) = ctx.mailbox.take() {
            apply_command(&mut state, pending.command, &ctx);
            ctx.snapshot.publish(&state);
            rendezvous(pending);
            continue;
        }

        thread::sleep(ctx.time_resolution);

        if !state.is_paused() {
            let (due, exhausted) = state.tick(ctx.clock.now_ms(), &ctx.events);
            for index in due {
                ctx.slots[index].signal();
            }
            if exhausted && state.is_playing() {
                state.apply_stop(ctx.clock.now_ms());
                ctx.snapshot.publish(&state);
                notify_stopped(&ctx);
                info!("playback finished, auto-stopping");
            }
        }

        if ctx.halt.load(Ordering::Relaxed) {
            break;
        }
    }

    for slot in &ctx.slots {
        slot.halt();
    }
}

fn apply_command(state: &mut PlaybackState, command: Command, ctx: &DriverContext) {
    let now_ms = ctx.clock.now_ms();
    match command {
        Command::Play => match state.apply_play(now_ms) {
            Ok(()) => {
                *ctx.stopped_notify.0.lock().unwrap() = false;
                info!("playback started");
            }
            Err(err) => latch_warning(ctx, err),
        },
        Command::Pause => match state.apply_pause(now_ms) {
            Ok(()) => info!("playback paused"),
            Err(err) => latch_warning(ctx, err),
        },
        Command::Stop => {
            state.apply_stop(now_ms);
            notify_stopped(ctx);
            info!("playback stopped");
        }
        Command::Jump(target_ms) => {
            let total_duration_ms = ctx.events.last().map(|e| e.timestamp_ms).unwrap_or(0);
            state.apply_jump(now_ms, target_ms, &ctx.events);
            if target_ms > total_duration_ms {
                latch_warning(ctx, EngineError::JumpedBeyondEnd);
            }
            info!("jumped to {} ms", target_ms);
        }
    }
}

fn latch_warning(ctx: &DriverContext, err: EngineError) {
    warn!("{}", err);
    *ctx.last_error.lock().unwrap() = err;
}

fn notify_stopped(ctx: &DriverContext) {
    let (lock, condvar) = &*ctx.stopped_notify;
    *lock.lock().unwrap() = true;
    condvar.notify_all();
}

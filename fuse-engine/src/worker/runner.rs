use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{trace, warn};

use crate::worker::context::WorkerContext;
use crate::worker::guard::WorkerGuard;
use crate::worker::{FuseSlot, WakeReason};

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: [u64; 3] = [10, 20, 40];

/// Runs the cooperative wait/ignite loop for a single event's worker.
/// Blocks in `FuseSlot::wait` until the driver thread schedules this
/// event's index or shutdown sets the slot's halt flag.
pub(crate) fn run_worker(context: WorkerContext, alive: Arc<AtomicBool>) {
    let _guard = WorkerGuard::new(alive);

    loop {
        match wait(&context.slot) {
            WakeReason::Halt => {
                trace!("worker {} halting", context.event_index);
                return;
            }
            WakeReason::Scheduled => ignite(&context),
        }
    }
}

fn wait(slot: &FuseSlot) -> WakeReason {
    slot.wait()
}

fn ignite(context: &WorkerContext) {
    if !read_modify_write(context, true) {
        return;
    }
    thread::sleep(context.fuse_duration);
    read_modify_write(context, false);
}

/// Reads `context.register`, sets or clears `context.mask` within it, and
/// writes the result back, preserving neighboring fuses' bits. Retries a
/// bounded number of times on transient I2C failure before latching the
/// error and giving up on this half of the ignition.
fn read_modify_write(context: &WorkerContext, light: bool) -> bool {
    for attempt in 0..RETRY_ATTEMPTS {
        let outcome = context
            .actuator
            .read_register(context.register)
            .and_then(|current| {
                let updated = if light {
                    current | context.mask
                } else {
                    current & !context.mask
                };
                context.actuator.write_register(context.register, updated)
            });

        match outcome {
            Ok(()) => return true,
            Err(err) if attempt + 1 < RETRY_ATTEMPTS => {
                warn!(
                    "worker {} actuator error on attempt {}: {}",
                    context.event_index,
                    attempt + 1,
                    err
                );
                thread::sleep(Duration::from_millis(RETRY_BACKOFF_MS[attempt as usize]));
            }
            Err(err) => {
                warn!(
                    "worker {} giving up after {} attempts: {}",
                    context.event_index, RETRY_ATTEMPTS, err
                );
                *context.last_actuator_error.lock().unwrap() = Some((context.device_index, err));
                return false;
            }
        }
    }
    false
}

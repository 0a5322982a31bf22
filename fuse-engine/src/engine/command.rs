//! Single-slot command mailbox: the asynchronous handoff between caller
//! threads and the Engine Driver thread, replacing boolean pending-flags
//! with one `Option<PendingCommand>` slot so at most one command is ever
//! in flight and command-priority ordering cannot arise.

use std::sync::{Arc, Barrier, Mutex};

/// A transport request staged for the driver thread.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Command {
    Play,
    Pause,
    Stop,
    Jump(u32),
}

pub(crate) struct PendingCommand {
    pub command: Command,
    pub external: Option<Arc<Barrier>>,
    pub internal: Arc<Barrier>,
}

/// Serializes commands against each other (the Command Lock) and carries
/// at most one pending command to the driver thread at a time.
pub(crate) struct CommandMailbox {
    lock: Mutex<()>,
    slot: Mutex<Option<PendingCommand>>,
}

impl CommandMailbox {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            slot: Mutex::new(None),
        }
    }

    /// Acquires the Command Lock for the duration of one transport call,
    /// stages `command`, releases the driver, and blocks until the driver
    /// has applied it (and rendezvoused with `external`, if supplied).
    pub fn submit(&self, command: Command, external: Option<Arc<Barrier>>) {
        let _guard = self.lock.lock().unwrap();
        let internal = Arc::new(Barrier::new(2));
        *self.slot.lock().unwrap() = Some(PendingCommand {
            command,
            external,
            internal: internal.clone(),
        });
        internal.wait();
    }

    /// Called once per driver quantum: takes the pending command, if any,
    /// leaving the slot empty.
    pub fn take(&self) -> Option<PendingCommand> {
        self.slot.lock().unwrap().take()
    }
}

/// Releases the caller (and, if present, a third-party observer) after
/// the driver has applied a command's state transition.
pub(crate) fn rendezvous(pending: PendingCommand) {
    pending.internal.wait();
    if let Some(external) = pending.external {
        external.wait();
    }
}

//! In-memory actuator used by tests and by `fuse-cli` when no hardware is
//! attached. Keeps an internal register file plus an append-only write
//! log so scenario tests can assert on ordered `write(reg, value)` calls.

use std::sync::{Arc, Mutex};

use crate::actuator::{ActuatorBus, FuseActuator};
use crate::error::ActuatorError;

/// One recorded register write, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub register: u8,
    pub value: u8,
}

#[derive(Debug)]
struct Inner {
    registers: Mutex<[u8; 256]>,
    log: Mutex<Vec<WriteRecord>>,
}

/// A loopback device: reads return whatever was last written (0 initially),
/// writes succeed unconditionally and are appended to the shared log.
#[derive(Debug, Clone)]
pub struct LoopbackActuator {
    inner: Arc<Inner>,
}

impl LoopbackActuator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registers: Mutex::new([0u8; 256]),
                log: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of every write performed against this device, in order.
    pub fn write_log(&self) -> Vec<WriteRecord> {
        self.inner.log.lock().unwrap().clone()
    }
}

impl Default for LoopbackActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl FuseActuator for LoopbackActuator {
    fn read_register(&self, reg: u8) -> Result<u8, ActuatorError> {
        Ok(self.inner.registers.lock().unwrap()[reg as usize])
    }

    fn write_register(&self, reg: u8, value: u8) -> Result<(), ActuatorError> {
        self.inner.registers.lock().unwrap()[reg as usize] = value;
        self.inner
            .log
            .lock()
            .unwrap()
            .push(WriteRecord { register: reg, value });
        Ok(())
    }
}

/// Factory that hands out a fresh, independent [`LoopbackActuator`] per
/// device address and lets callers retrieve them afterward for assertions.
#[derive(Debug, Clone, Default)]
pub struct LoopbackBus {
    devices: Arc<Mutex<std::collections::HashMap<u8, LoopbackActuator>>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actuator opened for `address`, if any has been opened yet.
    pub fn device(&self, address: u8) -> Option<LoopbackActuator> {
        self.devices.lock().unwrap().get(&address).cloned()
    }
}

impl ActuatorBus for LoopbackBus {
    fn open_device(&self, address: u8) -> Result<Arc<dyn FuseActuator>, ActuatorError> {
        let mut devices = self.devices.lock().unwrap();
        let actuator = devices.entry(address).or_insert_with(LoopbackActuator::new).clone();
        Ok(Arc::new(actuator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_modify_write_preserves_neighbors() {
        let actuator = LoopbackActuator::new();
        actuator.write_register(0x14, 0b0000_1100).unwrap();
        let current = actuator.read_register(0x14).unwrap();
        actuator.write_register(0x14, current | 0b0000_0011).unwrap();
        assert_eq!(actuator.read_register(0x14).unwrap(), 0b0000_1111);
    }

    #[test]
    fn write_log_records_in_order() {
        let actuator = LoopbackActuator::new();
        actuator.write_register(0x14, 1).unwrap();
        actuator.write_register(0x15, 2).unwrap();
        let log = actuator.write_log();
        assert_eq!(log, vec![
            WriteRecord { register: 0x14, value: 1 },
            WriteRecord { register: 0x15, value: 2 },
        ]);
    }
}

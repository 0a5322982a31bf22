//! Maps a score's device-index bitmask to probed, concrete actuator
//! handles, indexed by device index for O(1) lookup from worker threads.

use std::sync::Arc;

use log::{error, info};

use crate::actuator::{ActuatorBus, FuseActuator, BASE_ADDRESS};
use crate::error::EngineError;

const MAX_DEVICES: usize = 16;

/// Owns one probed actuator handle per set bit of a score's device mask.
#[derive(Debug)]
pub struct ActuatorRegistry {
    devices: Vec<Option<Arc<dyn FuseActuator>>>,
}

impl ActuatorRegistry {
    /// Opens and probes an actuator for every set bit of `mask`, in device
    /// index order. Fails fast on the first unreachable or unopenable
    /// device.
    pub fn open(mask: u16, bus: &dyn ActuatorBus) -> Result<Self, EngineError> {
        let mut devices: Vec<Option<Arc<dyn FuseActuator>>> = vec![None; MAX_DEVICES];

        for index in 0..MAX_DEVICES as u8 {
            if mask & (1 << index) == 0 {
                continue;
            }
            let address = BASE_ADDRESS | index;
            let actuator = bus.open_device(address).map_err(|_| {
                error!("failed to open actuator for device {}", index);
                EngineError::ActuatorInitFailed { device_index: index }
            })?;
            if !actuator.probe() {
                error!("device {} did not respond to probe", index);
                return Err(EngineError::ActuatorUnreachable { device_index: index });
            }
            info!("opened actuator for device {} at address {:#04x}", index, address);
            devices[index as usize] = Some(actuator);
        }

        Ok(Self { devices })
    }

    /// The actuator handle for `device_index`, if that device is part of
    /// this score's device mask.
    pub fn get(&self, device_index: u8) -> Option<&Arc<dyn FuseActuator>> {
        self.devices.get(device_index as usize).and_then(|slot| slot.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::loopback::LoopbackBus;

    #[test]
    fn opens_only_masked_devices() {
        let bus = LoopbackBus::new();
        let registry = ActuatorRegistry::open(0b0101, &bus).unwrap();
        assert!(registry.get(0).is_some());
        assert!(registry.get(1).is_none());
        assert!(registry.get(2).is_some());
        assert!(registry.get(3).is_none());
    }
}

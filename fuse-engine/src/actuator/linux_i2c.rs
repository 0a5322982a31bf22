//! Real Linux I2C transport, behind the `linux-i2c` feature. Opens the bus
//! character device fresh on every register access, matching the
//! open-per-call strategy of the bus driver this engine was distilled to
//! sit behind (`/dev/i2c-N`, `ioctl(I2C_SLAVE)`).

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::sync::Arc;

use crate::actuator::{ActuatorBus, FuseActuator};
use crate::error::ActuatorError;

const I2C_SLAVE: u64 = 0x0703;

/// Opens `bus_path` and addresses `address` anew on every register access.
#[derive(Debug, Clone)]
pub struct LinuxI2cActuator {
    bus_path: String,
    address: u8,
}

impl LinuxI2cActuator {
    pub fn new(bus_path: impl Into<String>, address: u8) -> Self {
        Self {
            bus_path: bus_path.into(),
            address,
        }
    }

    fn open(&self) -> Result<File, ActuatorError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.bus_path)?;

        let result = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE, self.address as libc::c_ulong) };
        if result < 0 {
            return Err(ActuatorError::Io(std::io::Error::last_os_error().to_string()));
        }
        Ok(file)
    }
}

impl FuseActuator for LinuxI2cActuator {
    fn read_register(&self, reg: u8) -> Result<u8, ActuatorError> {
        let mut file = self.open()?;
        file.write_all(&[reg])?;
        let mut buf = [0u8; 1];
        file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_register(&self, reg: u8, value: u8) -> Result<(), ActuatorError> {
        let mut file = self.open()?;
        file.write_all(&[reg, value])?;
        Ok(())
    }
}

/// Factory opening [`LinuxI2cActuator`] handles against a fixed bus path,
/// e.g. `/dev/i2c-1`.
#[derive(Debug, Clone)]
pub struct LinuxI2cBus {
    bus_path: String,
}

impl LinuxI2cBus {
    pub fn new(bus_path: impl Into<String>) -> Self {
        Self {
            bus_path: bus_path.into(),
        }
    }
}

impl ActuatorBus for LinuxI2cBus {
    fn open_device(&self, address: u8) -> Result<Arc<dyn FuseActuator>, ActuatorError> {
        // Validate the path is representable as a C string up front so a
        // bad bus path fails fast rather than on the first register access.
        CString::new(self.bus_path.clone()).map_err(|err| ActuatorError::Io(err.to_string()))?;
        Ok(Arc::new(LinuxI2cActuator::new(self.bus_path.clone(), address)))
    }
}

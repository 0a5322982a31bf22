//! Typed, leveled error surface for the fuse playback engine.

use std::fmt::{Display, Formatter};

/// Severity of a latched [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
}

/// Error raised by the actuator capability (I2C bus or loopback).
#[derive(Debug, Clone)]
pub enum ActuatorError {
    Io(String),
    Unreachable,
}

impl Display for ActuatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "i2c io error: {}", err),
            Self::Unreachable => write!(f, "device did not respond to probe"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<std::io::Error> for ActuatorError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Taxonomy of errors and warnings latched on the engine's error surface.
///
/// Every public transport operation resets this to [`EngineError::NoError`]
/// before it may set a new value.
#[derive(Debug, Clone)]
pub enum EngineError {
    NoError,

    // warnings
    AlreadyPlaying,
    AlreadyPaused,
    JumpedBeyondEnd,

    // errors
    InvalidMagic,
    TruncatedScore,
    MalformedScore,
    ActuatorInitFailed { device_index: u8 },
    ActuatorUnreachable { device_index: u8 },
    ActuatorBusError { device_index: u8, source: ActuatorError },
    AllocationFailed,
}

impl EngineError {
    /// Severity of this error, for callers that want a `{kind, level}`
    /// shape rather than matching on the enum directly.
    pub fn level(&self) -> ErrorLevel {
        match self {
            Self::NoError => ErrorLevel::Info,
            Self::AlreadyPlaying | Self::AlreadyPaused | Self::JumpedBeyondEnd => {
                ErrorLevel::Warning
            }
            _ => ErrorLevel::Error,
        }
    }

    /// `true` for init-time errors that leave the engine permanently unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic
                | Self::TruncatedScore
                | Self::MalformedScore
                | Self::ActuatorInitFailed { .. }
                | Self::ActuatorUnreachable { .. }
                | Self::AllocationFailed
        )
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "no error"),
            Self::AlreadyPlaying => write!(f, "fuses are already playing"),
            Self::AlreadyPaused => write!(f, "fuses are already paused"),
            Self::JumpedBeyondEnd => write!(f, "jumped beyond end of fuses"),
            Self::InvalidMagic => write!(f, "FUSE magic is invalid"),
            Self::TruncatedScore => write!(f, "score buffer is shorter than declared"),
            Self::MalformedScore => write!(f, "score is malformed"),
            Self::ActuatorInitFailed { device_index } => {
                write!(f, "actuator init failed for device {}", device_index)
            }
            Self::ActuatorUnreachable { device_index } => {
                write!(f, "actuator unreachable for device {}", device_index)
            }
            Self::ActuatorBusError { device_index, source } => {
                write!(f, "actuator bus error on device {}: {}", device_index, source)
            }
            Self::AllocationFailed => write!(f, "memory allocation failed"),
        }
    }
}

impl std::error::Error for EngineError {}

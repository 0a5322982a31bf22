//! # fuse-engine
//!
//! Core sequence-playback engine for I2C-driven pyrotechnic fuse arrays.
//! Loads a binary score, drives a monotonic playback clock on a background
//! thread, and fires one worker per scheduled event against a pluggable
//! [`actuator::FuseActuator`] capability (loopback for tests, Linux I2C for
//! real hardware behind the `linux-i2c` feature).

pub mod actuator;
pub mod clock;
pub mod engine;
pub mod error;
pub mod score;
pub mod status;
pub(crate) mod worker;

pub use engine::{Engine, EngineConfig, PlaybackState};
pub use error::{EngineError, ErrorLevel};
pub use score::{Event, Score};

//! Transport commands driven from the interactive REPL, thin wrappers
//! over `fuse_engine::Engine` mirroring the shape of a media player's
//! play/pause/stop/seek surface.

use fuse_engine::{Engine, EngineError};
use log::{error, info, warn};

/// One line of REPL input, parsed into a transport action.
pub enum ReplCommand {
    Play,
    Pause,
    Stop,
    Jump(u32),
    Status,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.trim().split_whitespace();
        match parts.next() {
            Some("play") => Self::Play,
            Some("pause") => Self::Pause,
            Some("stop") => Self::Stop,
            Some("jump") => match parts.next().and_then(|ms| ms.parse().ok()) {
                Some(ms) => Self::Jump(ms),
                None => Self::Unknown(line.to_string()),
            },
            Some("status") => Self::Status,
            Some("quit") | Some("exit") => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Logs a latched error or warning at a level matching its severity:
/// fatal errors (the engine is now unusable) are louder than transient
/// warnings and recoverable actuator hiccups.
fn report(err: EngineError) {
    if matches!(err, EngineError::NoError) {
        return;
    }
    if err.is_fatal() {
        error!("{}", err);
    } else {
        warn!("{}", err);
    }
}

pub fn play(engine: &Engine) {
    if engine.play(None) {
        info!("playing");
    } else {
        report(engine.last_error());
    }
}

pub fn pause(engine: &Engine) {
    if engine.pause(None) {
        info!("paused");
    } else {
        report(engine.last_error());
    }
}

pub fn stop(engine: &Engine) {
    engine.stop(None);
    info!("stopped");
}

pub fn jump(engine: &Engine, ms: u32) {
    engine.jump(None, ms);
    report(engine.last_error());
}

pub fn print_status(engine: &Engine) {
    report(engine.last_error());
    println!(
        "{:?}  {}/{} ms",
        engine.phase(),
        engine.current_time_ms(),
        engine.total_duration_ms()
    );
}

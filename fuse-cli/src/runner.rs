//! Runner for CLI execution: loads a score, wires an actuator bus, and
//! drives the engine either as a one-shot command or an interactive
//! REPL.

use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use fuse_engine::actuator::loopback::LoopbackBus;
use fuse_engine::actuator::ActuatorBus;
use fuse_engine::status::StatusReporter;
use fuse_engine::{Engine, EngineConfig};
use log::{error, info};

use crate::controls::{self, ReplCommand};

/// Primary entry for CLI execution. Returns the process exit code.
pub fn run(args: &ArgMatches) -> i32 {
    let score_path = args.get_one::<String>("SCORE").expect("required by clap");
    let score_bytes = match fs::read(score_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("failed to read score file {}: {}", score_path, err);
            return -1;
        }
    };

    let bus = build_bus(args);
    let fuse_duration_ms: u16 = parse_or_exit(args, "fuse-duration-ms");
    let time_resolution_ms: u32 = parse_or_exit(args, "time-resolution-ms");

    let engine = match Engine::init(EngineConfig {
        score_bytes,
        bus,
        fuse_duration_ms,
        time_resolution_ms,
    }) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            error!("failed to initialize engine: {}", err);
            return -1;
        }
    };

    if let Some(ms) = args.get_one::<String>("jump") {
        match ms.parse() {
            Ok(ms) => controls::jump(&engine, ms),
            Err(_) => {
                error!("invalid --jump value: {}", ms);
                return -1;
            }
        }
    }

    if args.get_flag("interactive") {
        run_interactive(&engine);
        return 0;
    }

    if args.get_flag("play") {
        let reporter = (!args.get_flag("quiet")).then(|| {
            StatusReporter::start(engine.clone(), Duration::from_millis(100), |report| {
                info!(
                    "{:?}  {}/{} ms",
                    report.phase, report.current_time_ms, report.total_duration_ms
                );
            })
        });

        controls::play(&engine);
        engine.wait_until_stopped();
        drop(reporter);

        if !args.get_flag("quiet") {
            controls::print_status(&engine);
        }
    }

    0
}

fn build_bus(args: &ArgMatches) -> Arc<dyn ActuatorBus> {
    match args.get_one::<String>("bus") {
        Some(path) => build_linux_i2c_bus(path),
        None => Arc::new(LoopbackBus::new()),
    }
}

#[cfg(feature = "linux-i2c")]
fn build_linux_i2c_bus(path: &str) -> Arc<dyn ActuatorBus> {
    Arc::new(fuse_engine::actuator::linux_i2c::LinuxI2cBus::new(path))
}

#[cfg(not(feature = "linux-i2c"))]
fn build_linux_i2c_bus(path: &str) -> Arc<dyn ActuatorBus> {
    error!(
        "--bus {} requires building fuse-cli with the linux-i2c feature; falling back to loopback",
        path
    );
    Arc::new(LoopbackBus::new())
}

fn parse_or_exit<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> T {
    let raw = args.get_one::<String>(name).expect("has a default value");
    raw.parse().unwrap_or_else(|_| {
        error!("invalid value for --{}: {}", name, raw);
        std::process::exit(-1);
    })
}

fn run_interactive(engine: &Engine) {
    info!("interactive mode: play | pause | stop | jump <ms> | status | quit");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("fuse> ");
        let _ = stdout.flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        match ReplCommand::parse(&line) {
            ReplCommand::Play => controls::play(engine),
            ReplCommand::Pause => controls::pause(engine),
            ReplCommand::Stop => controls::stop(engine),
            ReplCommand::Jump(ms) => controls::jump(engine, ms),
            ReplCommand::Status => controls::print_status(engine),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(line) => {
                if !line.trim().is_empty() {
                    println!("unrecognized command: {}", line.trim());
                }
            }
        }
    }
}


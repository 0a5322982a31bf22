//! CLI argument definitions for `fuse`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("fuse")
        .version("0.3.1")
        .author("Fuse Engine Contributors")
        .about("Play and inspect pyrotechnic fuse sequences")
        .arg(
            Arg::new("SCORE")
                .help("Path to a binary score file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("bus")
                .long("bus")
                .value_name("PATH")
                .help("Linux I2C device path, e.g. /dev/i2c-1 (requires the linux-i2c feature); defaults to an in-memory loopback bus"),
        )
        .arg(
            Arg::new("fuse-duration-ms")
                .long("fuse-duration-ms")
                .value_name("MS")
                .default_value("200")
                .help("Hold time a fuse remains lit before extinguishing"),
        )
        .arg(
            Arg::new("time-resolution-ms")
                .long("time-resolution-ms")
                .value_name("MS")
                .default_value("10")
                .help("Engine driver quantum"),
        )
        .arg(
            Arg::new("play")
                .long("play")
                .action(ArgAction::SetTrue)
                .help("Start playback, wait for it to finish, then exit"),
        )
        .arg(
            Arg::new("jump")
                .long("jump")
                .value_name("MS")
                .help("Jump to the given score-time offset before playing"),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .short('i')
                .action(ArgAction::SetTrue)
                .help("Read play/pause/stop/jump/status/quit commands from stdin"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Suppress status output"),
        )
}

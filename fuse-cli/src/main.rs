//! # fuse
//!
//! Command-line transport control for a pyrotechnic fuse sequence.

mod cli;
mod controls;
mod logging;
mod runner;

fn main() {
    let args = cli::args::build_cli().get_matches();
    logging::init();

    let code = runner::run(&args);

    std::process::exit(code)
}

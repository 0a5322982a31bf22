//! Logger initialization. No TUI log buffer to feed here, so this is a
//! thin wrapper around `env_logger` rather than the custom `log::Log`
//! capture/replay machinery a full-screen player needs.

use env_logger::Env;

/// Installs a stderr logger whose level is controlled by `RUST_LOG`,
/// defaulting to `info`.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

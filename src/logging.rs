//! Tracing bootstrap
//!
//! The core only emits `tracing` events. Applications that do not install
//! their own subscriber can call [`init`] once at startup.

use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `filter`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// [`init`] with the `logging.filter` directive from `settings`
pub fn init_from(settings: &Settings) -> bool {
    init(&settings.logging.filter)
}

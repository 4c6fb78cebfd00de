//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honors `RUST_LOG` and falls back to `info` when it is unset.
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system with a fallback filter
///
/// `RUST_LOG` still takes precedence; `level` is only used when it is unset.
/// Calling this more than once is harmless, later calls are ignored.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, ignoring '{}'", level);
    }
}

//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging with a fallback level used when `RUST_LOG` is unset.
///
/// `level` uses the `env_logger` filter syntax (`"info"`, `"behaviour_runtime=debug"`).
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::trace!("Logger already initialized, ignoring level {}", level);
    }
}

//! Tracing subscriber setup for the CLI.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `logging.level`; `debug` forces the `debug` level.
/// Calling this twice is harmless, the second install is ignored.
pub fn init(config: &LoggingConfig, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

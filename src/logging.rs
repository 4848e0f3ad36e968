//! Console logging for binaries embedding the capture pipeline.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the host.
//! Verbosity is read from `RUST_LOG`, falling back to the given directive.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive() -> &'static str {
    "geo_capture=info"
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs a global subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_logging(default: &str) -> Result<(), TryInitError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter(default))
        .with(stderr_layer)
        .try_init()
}

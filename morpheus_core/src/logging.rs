//! Logging setup for the library and the CLI.
//!
//! Library code only emits `tracing` events. Binaries call [`setup`] once to
//! get them printed.

// Re-exports for convenience
pub use tracing::metadata::LevelFilter;
pub use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVES: &str = "morpheus_core=trace,morpheus=trace";

/// Set up basic logging. `level` caps what reaches stdout and defaults to
/// `INFO`.
pub fn setup(level: Option<LevelFilter>) {
    // The user can specify a log level via an env var
    // (such as for testing).
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_DIRECTIVES.into());
    let logging_layers = vec![
        EnvFilter::new(env).boxed(),
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(level.unwrap_or(LevelFilter::INFO))
            .boxed(),
    ];

    // try_init so a second call (e.g. from tests) is harmless
    if tracing_subscriber::registry()
        .with(logging_layers)
        .try_init()
        .is_ok()
    {
        debug!("logging set up");
    }
}

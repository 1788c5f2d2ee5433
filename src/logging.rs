//! Tracing setup for the command-line binary.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence when set. Otherwise the crate logs at `info`,
/// or at `debug` when `verbose` is true. Calling this more than once is a no-op.
pub fn init(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let default_level = if verbose { "pocketbook=debug" } else { "pocketbook=info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

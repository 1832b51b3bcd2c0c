//! Log output setup for the CLI.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber on stderr so stdout stays machine-readable.
///
/// `RUST_LOG` overrides `default_filter`. A second call keeps the first
/// subscriber.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
}

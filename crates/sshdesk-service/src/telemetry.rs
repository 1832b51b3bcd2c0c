//! Log output setup for the service binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence; `default_filter` applies when it is unset
/// or unparsable. A second call keeps the first subscriber.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true),
        )
        .with(filter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
}

use std::io::{self, IsTerminal};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Filtering comes from `RUST_LOG` (default "info"). Output is human-readable on a terminal
/// and flattened JSON otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);

    if io::stdout().is_terminal() {
        builder.init();
    } else {
        builder.json().flatten_event(true).init();
    }
}

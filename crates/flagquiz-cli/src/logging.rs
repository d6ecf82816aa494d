//! Log output for the CLI.
//!
//! Logs go to stderr so stdout stays machine-readable. `FLAGQUIZ_LOG` takes
//! precedence over `-v` when set.

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FLAGQUIZ_LOG";

/// Tracing directive for a `-v` count.
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Tracing setup for the binaries. Library code only emits events.

use crate::config::LOG_FILTER_ENV;
use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber. `MAPREG_LOG` takes precedence; without
/// it, `verbose` selects `mapreg=debug` and the default is `warn`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| default_filter(verbose));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("mapreg=debug,warn")
    } else {
        EnvFilter::new("warn")
    }
}

//! Logging bootstrap.
//!
//! The library only emits `tracing` events; binaries call [`init_logging`]
//! once to print them. Output goes to stderr so JSON on stdout stays clean.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber at `level` (e.g. "warn", "debug").
///
/// `RUST_LOG` takes precedence when set. Later calls are ignored.
pub fn init_logging(level: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug");
        init_logging("not a level ((");
        tracing::debug!("still fine");
    }
}

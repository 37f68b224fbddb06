//! Tracing subscriber setup for the command-line entry point.
//!
//! The library only emits `tracing` events; installing a subscriber is up
//! to the binary.  `PHPANTOM_LOG` takes an `EnvFilter` directive string and
//! overrides the verbosity flag.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "PHPANTOM_LOG";

/// Filter directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install a stderr fmt subscriber.  Calling it twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_ok() {
        tracing::debug!("tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "trace");
    }
}

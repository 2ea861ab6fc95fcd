//! Structured logging to stderr via `tracing-subscriber`.
//!
//! Filter precedence: `FTREE_LOG`, then the level passed in (CLI flag or
//! config), then [`DEFAULT_LOG_LEVEL`].

use tracing_subscriber::EnvFilter;

pub use crate::config::DEFAULT_LOG_LEVEL;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "FTREE_LOG";

/// Build the filter, falling back to the default on an unparsable level.
pub fn env_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_uses_given_level() {
        if std::env::var(LOG_ENV).is_ok() {
            return;
        }
        assert!(env_filter("debug").to_string().contains("debug"));
    }

    #[test]
    fn env_filter_falls_back_on_invalid_level() {
        if std::env::var(LOG_ENV).is_ok() {
            return;
        }
        let filter = env_filter("filetree=loud");
        assert!(!filter.to_string().contains("loud"));
    }

    #[test]
    fn init_logging_twice_is_harmless() {
        init_logging("warn");
        init_logging("debug");
    }
}

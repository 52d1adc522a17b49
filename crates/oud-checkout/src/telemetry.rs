//! # Telemetry
//!
//! Structured logging setup for a terminal process.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - everything at debug
//! - `RUST_LOG=oud=trace` - trace for the oud crates only
//! - Default: [`DEFAULT_FILTER`], or `[logging] filter` from `pos.toml`

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info,oud=debug,sqlx=warn";

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins over `filter`; an unparseable `filter` falls back to
/// [`DEFAULT_FILTER`]. Returns `false` if a subscriber was already
/// installed, so calling it twice (tests, embedded use) is harmless.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init_tracing(Some("warn"));
        assert!(!init_tracing(Some("warn")));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}

//! Timeout and interval defaults used across the crate.

use std::time::Duration;

/// Default read timeout in milliseconds used by transports when a caller
/// doesn't provide an explicit timeout.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default interval between two polling ticks.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Convenience: default read timeout as Duration.
pub fn default_read_timeout() -> Duration {
    ms(DEFAULT_READ_TIMEOUT_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_to_duration() {
        assert_eq!(ms(500).as_millis(), 500);
    }

    #[test]
    fn poll_interval_shorter_than_read_timeout() {
        assert!(ms(DEFAULT_POLL_INTERVAL_MS) < default_read_timeout());
    }
}

//! Client configuration.

use std::time::Duration;

/// Delay between a failed open and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration for the HTD client.
#[derive(Debug, Clone)]
pub struct HtdConfig {
    /// Fixed delay before retrying a failed open. Retries never stop.
    pub retry_delay: Duration,
    /// Events buffered per subscriber before it starts skipping.
    pub event_capacity: usize,
    /// Drop inbound packets whose trailing checksum does not match.
    pub verify_checksums: bool,
}

impl Default for HtdConfig {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            verify_checksums: false,
        }
    }
}

impl HtdConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry delay.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the per-subscriber event capacity.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Enables or disables inbound checksum verification.
    #[must_use]
    pub const fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }
}

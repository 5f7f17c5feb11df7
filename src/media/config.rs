//! Media manager configuration

use crate::internal::constants::{DEFAULT_WRITE_POLL_INTERVAL_US, DEFAULT_WRITE_POLL_LIMIT};

/// Media manager configuration
///
/// Only the blocking read-modify-write path is tunable; pool sizes are const
/// generics of [`MediaManager`](super::MediaManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MediaManagerConfig {
    /// Polls allowed for one command before giving up
    pub write_poll_limit: u32,
    /// Delay between polls in microseconds
    pub write_poll_interval_us: u32,
}

impl Default for MediaManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaManagerConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            write_poll_limit: DEFAULT_WRITE_POLL_LIMIT,
            write_poll_interval_us: DEFAULT_WRITE_POLL_INTERVAL_US,
        }
    }

    /// Set the poll budget of one blocking command
    #[must_use]
    pub const fn with_write_poll_limit(mut self, limit: u32) -> Self {
        self.write_poll_limit = limit;
        self
    }

    /// Set the delay between polls
    #[must_use]
    pub const fn with_write_poll_interval_us(mut self, us: u32) -> Self {
        self.write_poll_interval_us = us;
        self
    }
}

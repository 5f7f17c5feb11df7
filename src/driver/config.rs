//! Configuration types for the ENC28J60 receive engine

use crate::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_RX_END, DEFAULT_RX_START, DEFAULT_TX_START, ENC_MEMORY_END, MAX_FRAME_SIZE,
    MIN_RX_BYTE_COUNT, RX_RETRY_LIMIT,
};

/// Receive engine configuration
///
/// Describes how the controller's 8 KB buffer memory is split between the RX
/// ring and the TX region, plus the receive validation limits.
///
/// # Example
///
/// ```ignore
/// let config = RxConfig::new()
///     .with_rx_ring(0x0000, 0x17FF)
///     .with_tx_start(0x1800);
/// config.validate()?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxConfig {
    /// First byte of the RX ring (even)
    pub rx_start: u16,
    /// Last byte of the RX ring (odd, inclusive)
    pub rx_end: u16,
    /// First byte of the TX region; the read cursor never reaches it
    pub tx_start: u16,
    /// Invalid status vectors tolerated before a hard reset
    pub retry_limit: u8,
    /// Largest byte count accepted from a status vector
    pub max_frame_size: u16,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RxConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx_start: DEFAULT_RX_START,
            rx_end: DEFAULT_RX_END,
            tx_start: DEFAULT_TX_START,
            retry_limit: RX_RETRY_LIMIT,
            max_frame_size: MAX_FRAME_SIZE as u16,
        }
    }

    /// Set the RX ring boundaries
    #[must_use]
    pub const fn with_rx_ring(mut self, start: u16, end: u16) -> Self {
        self.rx_start = start;
        self.rx_end = end;
        self
    }

    /// Set the start of the TX region
    #[must_use]
    pub const fn with_tx_start(mut self, tx_start: u16) -> Self {
        self.tx_start = tx_start;
        self
    }

    /// Set the retry limit for invalid status vectors
    #[must_use]
    pub const fn with_retry_limit(mut self, limit: u8) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Set the largest accepted frame size
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: u16) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rx_start >= self.rx_end
            || self.rx_end >= self.tx_start
            || self.tx_start > ENC_MEMORY_END
        {
            return Err(ConfigError::InvalidRingLayout);
        }
        if self.rx_start % 2 != 0 || self.rx_end % 2 == 0 {
            return Err(ConfigError::MisalignedRing);
        }
        if self.retry_limit == 0 {
            return Err(ConfigError::InvalidRetryLimit);
        }
        if usize::from(self.max_frame_size) < MIN_RX_BYTE_COUNT {
            return Err(ConfigError::InvalidFrameSize);
        }
        Ok(())
    }

    /// Check that frames of `max_frame_size` fit a packet buffer of `buf_size`
    /// bytes including the leading headroom byte.
    pub fn validate_buffer(&self, buf_size: usize) -> ConfigResult<()> {
        if usize::from(self.max_frame_size) + 1 > buf_size {
            return Err(ConfigError::InvalidFrameSize);
        }
        Ok(())
    }
}

//! Error types for the PIC32 ENC28J60 and media manager drivers
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Ring layout and configuration failures
//! - [`RxError`]: Packet pickup/acknowledge misuse on the receive path
//! - [`MediaError`]: Media manager registration and transfer failures
//!
//! The unified [`Error`] enum wraps all domain errors.
//!
//! Bus errors and corrupt frames on the receive path are not errors in this
//! sense: the state machines retry them internally and expose what happened
//! through counters and state accessors.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// These errors occur when validating a driver configuration before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// RX ring boundaries are inverted, overlap the TX region or exceed buffer memory
    InvalidRingLayout,
    /// RX ring start must be even and RX ring end must be odd
    MisalignedRing,
    /// Retry limit must be at least one
    InvalidRetryLimit,
    /// Maximum frame size does not fit the packet buffers
    InvalidFrameSize,
    /// Packet pool must hold between 1 and 255 buffers
    InvalidPoolSize,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidRingLayout => "invalid RX ring layout",
            ConfigError::MisalignedRing => "misaligned RX ring boundaries",
            ConfigError::InvalidRetryLimit => "invalid retry limit",
            ConfigError::InvalidFrameSize => "invalid maximum frame size",
            ConfigError::InvalidPoolSize => "invalid packet pool size",
        }
    }
}

// =============================================================================
// RX Errors
// =============================================================================

/// Receive path errors
///
/// Returned by the consumer-facing pickup/acknowledge API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// Packet handle does not belong to this driver's pool
    InvalidPacket,
    /// The packet was already acknowledged
    AlreadyFree,
    /// The packet is still owned by the receive path, not by the consumer
    NotHeld,
}

impl core::fmt::Display for RxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RxError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RxError::InvalidPacket => "invalid packet handle",
            RxError::AlreadyFree => "packet already on free list",
            RxError::NotHeld => "packet not held by the consumer",
        }
    }
}

// =============================================================================
// Media Errors
// =============================================================================

/// Media manager errors
///
/// Invalid caller input is reported immediately and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediaError {
    /// Disk number is out of range
    InvalidDisk,
    /// Media handle does not refer to a registered media object
    InvalidHandle,
    /// No free media object left in the pool
    PoolExhausted,
    /// The media driver has not been opened yet
    NotOpen,
    /// The media driver refused to queue the command
    CommandRejected,
    /// A queued command completed with an error
    CommandFailed,
    /// Device block size cannot be served by the manager buffers
    UnsupportedBlockSize,
    /// Command did not complete within the poll budget
    Timeout,
}

impl core::fmt::Display for MediaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MediaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MediaError::InvalidDisk => "invalid disk number",
            MediaError::InvalidHandle => "invalid media handle",
            MediaError::PoolExhausted => "media pool exhausted",
            MediaError::NotOpen => "media driver not open",
            MediaError::CommandRejected => "command rejected by media driver",
            MediaError::CommandFailed => "media command failed",
            MediaError::UnsupportedBlockSize => "unsupported block size",
            MediaError::Timeout => "media command timed out",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Config(ConfigError::InvalidRingLayout)) => { /* ... */ }
///     Err(Error::Media(MediaError::PoolExhausted)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Receive path error
    Rx(RxError),
    /// Media manager error
    Media(MediaError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Rx(e) => write!(f, "rx: {}", e.as_str()),
            Error::Media(e) => write!(f, "media: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RxError> for Error {
    fn from(e: RxError) -> Self {
        Error::Rx(e)
    }
}

impl From<MediaError> for Error {
    fn from(e: MediaError) -> Self {
        Error::Media(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for receive path operations
pub type RxResult<T> = core::result::Result<T, RxError>;

/// Result type alias for media manager operations
pub type MediaResult<T> = core::result::Result<T, MediaError>;

// =============================================================================
// Unit Tests
// =============================================================================

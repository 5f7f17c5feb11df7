//! Bus operation layer
//!
//! The receive engine never talks to the serial bus directly. It issues
//! non-blocking operations through [`BusOps`] and polls their outcome with
//! [`BusOps::poll_result`]. A `None` from a start call means the bus is busy
//! and the same call should be retried on the next poll.
//!
//! Implementations typically queue SPI transactions and complete them from a
//! DMA or SPI interrupt; the interrupt only records the result that
//! `poll_result` later reports.

use core::num::NonZeroU32;

use crate::internal::enc28j60_regs::sfr;

// =============================================================================
// Operation Token
// =============================================================================

/// Handle of an outstanding bus operation.
///
/// Tokens are never zero so that "no token" fits in an `Option` for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpToken(NonZeroU32);

impl OpToken {
    /// Create a token from a raw non-zero value
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Raw token value
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Result of polling an outstanding operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusResult {
    /// Still in flight
    Pending,
    /// Completed successfully
    Success,
    /// Completed with an error; the operation must be re-issued
    Error,
}

impl BusResult {
    /// Whether the operation has finished, successfully or not
    #[inline]
    pub const fn is_done(self) -> bool {
        !matches!(self, BusResult::Pending)
    }
}

// =============================================================================
// Register Targets
// =============================================================================

/// 16-bit register pairs written by the receive path.
///
/// The low byte is written first, then the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sfr16 {
    /// ERDPT: buffer memory read pointer
    ReadPointer,
    /// ERXRDPT: RX ring read pointer (hardware write protection boundary)
    RxReadPointer,
}

impl Sfr16 {
    /// Address of the low byte register
    #[inline]
    pub const fn low_addr(self) -> u8 {
        match self {
            Sfr16::ReadPointer => sfr::ERDPTL,
            Sfr16::RxReadPointer => sfr::ERXRDPTL,
        }
    }
}

// =============================================================================
// Bus Operations Trait
// =============================================================================

/// Non-blocking bus primitives consumed by the receive engine.
///
/// # Buffer contract
///
/// `start_data_read` receives a destination whose first byte is headroom: a
/// read of `n` bytes is passed a slice of `n + 1` bytes and the payload lands
/// in `dst[1..]`. The implementation may overwrite `dst[0]` (for example with
/// the echoed SPI opcode). The borrow ends when the call returns, so the
/// implementation transfers into `dst` before returning (from its own staging
/// buffer or a synchronous FIFO drain) and reports the outcome later through
/// [`BusOps::poll_result`]. The bytes are only meaningful once the token
/// reports [`BusResult::Success`].
pub trait BusOps {
    /// Start a 16-bit register write
    fn start_sfr_write16(&mut self, reg: Sfr16, value: u16) -> Option<OpToken>;

    /// Start a buffer memory read at the current read pointer
    fn start_data_read(&mut self, dst: &mut [u8]) -> Option<OpToken>;

    /// Start a decrement of the hardware packet counter (ECON2.PKTDEC)
    fn start_packet_decrement(&mut self) -> Option<OpToken>;

    /// Poll the result of an outstanding operation
    fn poll_result(&mut self, op: OpToken) -> BusResult;
}

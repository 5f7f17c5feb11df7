//! ISR-safe driver wrapper using critical sections.
//!
//! Provides [`SharedEnc28j60`] so the super-loop and interrupt handlers can
//! both reach the receive driver, typically the loop running
//! [`Enc28j60::rx_tasks`] and an ISR acknowledging consumed packets.

use super::primitives::CriticalSectionCell;
use crate::driver::enc28j60::Enc28j60;
use crate::internal::constants::{
    DEFAULT_PACKET_BUFFER_SIZE, DEFAULT_RX_DESCRIPTORS, DEFAULT_RX_PACKETS,
};

/// ISR-safe ENC28J60 wrapper.
///
/// The wrapper starts empty so it can live in a `static`; the driver is
/// moved in with [`SharedEnc28j60::install`] once the bus is up. All access
/// goes through `critical_section::with()`, disabling interrupts for the
/// duration of the closure.
///
/// # Example
///
/// ```ignore
/// static MAC: SharedEnc28j60<SpiBus> = SharedEnc28j60::new();
///
/// MAC.install(Enc28j60::new(bus, RxConfig::new())?);
///
/// // super-loop
/// MAC.with(|mac| mac.rx_tasks());
///
/// // interrupt handler
/// MAC.with(|mac| mac.ack(pkt).ok());
/// ```
pub struct SharedEnc28j60<
    B,
    const PKTS: usize = DEFAULT_RX_PACKETS,
    const BUF: usize = DEFAULT_PACKET_BUFFER_SIZE,
    const DESC: usize = DEFAULT_RX_DESCRIPTORS,
> {
    inner: CriticalSectionCell<Option<Enc28j60<B, PKTS, BUF, DESC>>>,
}

impl<B, const PKTS: usize, const BUF: usize, const DESC: usize>
    SharedEnc28j60<B, PKTS, BUF, DESC>
{
    /// Create an empty wrapper (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
        }
    }

    /// Move a driver in, returning the one it replaces.
    pub fn install(
        &self,
        mac: Enc28j60<B, PKTS, BUF, DESC>,
    ) -> Option<Enc28j60<B, PKTS, BUF, DESC>> {
        self.inner.with(|slot| slot.replace(mac))
    }

    /// Move the driver out again.
    pub fn take(&self) -> Option<Enc28j60<B, PKTS, BUF, DESC>> {
        self.inner.with(Option::take)
    }

    /// Execute a closure with exclusive access to the driver.
    ///
    /// Returns `None` if no driver is installed. Interrupts are disabled for
    /// the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Enc28j60<B, PKTS, BUF, DESC>) -> R,
    {
        self.inner.with(|slot| slot.as_mut().map(f))
    }

    /// Try to execute a closure, returning `None` if the driver is already
    /// borrowed or not installed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Enc28j60<B, PKTS, BUF, DESC>) -> R,
    {
        self.inner.try_with(|slot| slot.as_mut().map(f)).flatten()
    }

    /// Driver access without a critical section (requires `&mut self`).
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut Enc28j60<B, PKTS, BUF, DESC>> {
        self.inner.get_mut().as_mut()
    }
}

impl<B, const PKTS: usize, const BUF: usize, const DESC: usize> Default
    for SharedEnc28j60<B, PKTS, BUF, DESC>
{
    fn default() -> Self {
        Self::new()
    }
}

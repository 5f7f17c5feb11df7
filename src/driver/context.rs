//! Driver context shared by all receive descriptors.

use crate::driver::config::RxConfig;
use crate::driver::events::EventFlags;
use crate::driver::packet::{BufferOwner, MacPacket, PacketHandle};
use crate::error::{RxError, RxResult};
use crate::internal::constants::RSV_SIZE;
use crate::sync::{CriticalSectionCell, ProtectedList};

/// Outer reset state of the receive path.
///
/// Descriptor tasks only run in [`RxResetState::Running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxResetState {
    /// A reset was requested; ERXRDPT must be reprogrammed
    Starting,
    /// ERXRDPT write is outstanding
    WaitingForWrite,
    /// Normal reception
    Running,
}

/// Aggregate receive statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxCounters {
    /// Frames delivered to the ready list
    pub rx_ok_packets: u32,
    /// Status vectors rejected by validation
    pub rsv_errors: u32,
    /// Bus operations that completed with an error
    pub bus_errors: u32,
    /// Hard resets of the ring cursor
    pub hard_resets: u32,
}

/// State owned by the driver and shared by every receive descriptor.
pub struct RxContext<const PKTS: usize, const BUF: usize> {
    pub(crate) config: RxConfig,
    /// Ring address of the next status vector to read
    pub(crate) rx_ptr: u16,
    pub(crate) reset_state: RxResetState,
    /// The controller reports at least one unread frame
    pub(crate) rx_pending: bool,
    /// EPKTCNT was decremented and must be re-read by the counter glue
    pub(crate) counter_sync: bool,
    pub(crate) counters: RxCounters,
    pub(crate) free: ProtectedList<PacketHandle, PKTS>,
    pub(crate) ready: ProtectedList<PacketHandle, PKTS>,
    pub(crate) events: EventFlags,
    pub(crate) packets: [MacPacket<BUF>; PKTS],
    /// Owner of each buffer; list moves update it in the same critical section
    owners: CriticalSectionCell<[BufferOwner; PKTS]>,
    /// Status vector landing area (one headroom byte + vector)
    pub(crate) rsv_scratch: [u8; RSV_SIZE + 1],
}

impl<const PKTS: usize, const BUF: usize> RxContext<PKTS, BUF> {
    /// Create a context with every buffer on the free list
    pub fn new(config: RxConfig) -> Self {
        let ctx = Self {
            config,
            rx_ptr: config.rx_start,
            reset_state: RxResetState::Starting,
            rx_pending: false,
            counter_sync: false,
            counters: RxCounters::default(),
            free: ProtectedList::new(),
            ready: ProtectedList::new(),
            events: EventFlags::new(),
            packets: [const { MacPacket::new() }; PKTS],
            owners: CriticalSectionCell::new([BufferOwner::Free; PKTS]),
            rsv_scratch: [0; RSV_SIZE + 1],
        };
        for index in 0..PKTS {
            // Capacity equals the pool size
            let _ = ctx.free.tail_add(PacketHandle(index as u8));
        }
        ctx
    }

    /// Return a delivered buffer to the free list.
    ///
    /// Only a buffer handed out by packet pickup can be acknowledged.
    /// Safe to call from interrupt context.
    pub fn ack(&self, pkt: PacketHandle) -> RxResult<()> {
        let index = pkt.index();
        if index >= PKTS {
            return Err(RxError::InvalidPacket);
        }
        self.owners.with(|owners| {
            let owner = owners[index];
            match owner {
                BufferOwner::Consumer => {
                    self.free.tail_add(pkt).map_err(|_| RxError::AlreadyFree)?;
                    owners[index] = BufferOwner::Free;
                    Ok(())
                }
                BufferOwner::Free => Err(RxError::AlreadyFree),
                BufferOwner::InFlight | BufferOwner::Ready => Err(RxError::NotHeld),
            }
        })
    }

    /// Current owner of a buffer
    pub fn owner(&self, pkt: PacketHandle) -> Option<BufferOwner> {
        self.owners.with_ref(|owners| owners.get(pkt.index()).copied())
    }

    /// Take a free buffer for a receive descriptor
    pub(crate) fn take_free(&self) -> Option<PacketHandle> {
        self.owners.with(|owners| {
            let pkt = self.free.head_remove()?;
            owners[pkt.index()] = BufferOwner::InFlight;
            Some(pkt)
        })
    }

    /// Queue a filled buffer for pickup. Falls back to the free list and
    /// returns `false` if the ready list is full.
    pub(crate) fn push_ready(&self, pkt: PacketHandle) -> bool {
        let queued = self.owners.with(|owners| {
            let queued = self.ready.tail_add(pkt).is_ok();
            if queued {
                owners[pkt.index()] = BufferOwner::Ready;
            }
            queued
        });
        if !queued {
            self.release(pkt);
        }
        queued
    }

    /// Hand the oldest ready buffer to the consumer
    pub(crate) fn take_ready(&self) -> Option<PacketHandle> {
        self.owners.with(|owners| {
            let pkt = self.ready.head_remove()?;
            owners[pkt.index()] = BufferOwner::Consumer;
            Some(pkt)
        })
    }

    /// Put a buffer back on the free list without validation
    pub(crate) fn release(&self, pkt: PacketHandle) {
        self.owners.with(|owners| {
            owners[pkt.index()] = BufferOwner::Free;
            if self.free.tail_add(pkt).is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("rx: free list full, dropping handle {}", pkt.index());
            }
        });
    }

    /// Current ring read cursor
    pub fn rx_ptr(&self) -> u16 {
        self.rx_ptr
    }

    /// Outer reset state
    pub fn reset_state(&self) -> RxResetState {
        self.reset_state
    }

    /// Receive statistics
    pub fn counters(&self) -> RxCounters {
        self.counters
    }

    /// Whether a frame is reported pending by the controller
    pub fn rx_pending(&self) -> bool {
        self.rx_pending
    }

    /// Whether EPKTCNT must be re-read
    pub fn needs_counter_sync(&self) -> bool {
        self.counter_sync
    }

    /// Configuration in use
    pub fn config(&self) -> &RxConfig {
        &self.config
    }
}

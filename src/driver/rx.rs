//! Receive packet state machine
//!
//! One [`RxPacket`] descriptor walks a packet buffer through the ENC28J60 RX
//! ring: position ERDPT, read and validate the receive status vector, read
//! the frame, decrement EPKTCNT and release ring space through ERXRDPT.
//!
//! Every step issues at most one bus operation and the next call polls it.
//! Steps that can continue immediately after a completed wait do so inside
//! the same [`RxPacket::task`] call.
//!
//! ```text
//! Empty -> SetReadPointer -> WaitReadPointer -> ReadStatusVector -> WaitStatusVector
//!            ^   (invalid RSV, retry + 1)                               |
//!            +----------------------------------------------------------+
//!                                                                       v
//! Empty <- ResetWait <- ResetReadCursor <- WaitForDecrement <- ... <- ReadPacket
//! ```

use crate::bus::{BusOps, BusResult, OpToken, Sfr16};
use crate::driver::config::RxConfig;
use crate::driver::context::{RxContext, RxResetState};
use crate::driver::events::MacEvents;
use crate::driver::packet::{PacketFlags, PacketHandle};
use crate::driver::rsv::ReceiveStatusVector;
use crate::internal::constants::{CRC_SIZE, ETH_HEADER_SIZE, RSV_SIZE, RX_SEG_LOAD_OFFSET};

/// Descriptor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Idle, no buffer attached
    Empty,
    /// Write ERDPT with the ring cursor
    SetReadPointer,
    /// Wait for the ERDPT write
    WaitReadPointer,
    /// Read the receive status vector
    ReadStatusVector,
    /// Wait for the status vector and validate it
    WaitStatusVector,
    /// Read the frame into the packet buffer
    ReadPacket,
    /// Wait for the frame read
    WaitForRead,
    /// Decrement the hardware packet counter
    PacketDecrement,
    /// Wait for the decrement
    WaitForDecrement,
    /// Write ERXRDPT to release ring space
    ResetReadCursor,
    /// Wait for the ERXRDPT write and deliver the frame
    ResetWait,
}

/// Whether the task loop keeps going within the current call
enum Flow {
    Continue,
    Yield,
}

/// One receive descriptor
#[derive(Debug)]
pub struct RxPacket {
    state: RxState,
    retry: u8,
    rsv: ReceiveStatusVector,
    packet: Option<PacketHandle>,
    operation: Option<OpToken>,
}

impl Default for RxPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl RxPacket {
    /// Create an idle descriptor
    pub const fn new() -> Self {
        Self {
            state: RxState::Empty,
            retry: 0,
            rsv: ReceiveStatusVector::EMPTY,
            packet: None,
            operation: None,
        }
    }

    /// Reset to idle with a zeroed status vector.
    ///
    /// Returns the buffer the descriptor was holding, if any; the caller
    /// decides where it goes.
    pub fn enter(&mut self) -> Option<PacketHandle> {
        self.state = RxState::Empty;
        self.rsv = ReceiveStatusVector::EMPTY;
        self.retry = 0;
        self.operation = None;
        self.packet.take()
    }

    /// Leave the descriptor as is; it is reused, never freed.
    pub fn exit(&mut self) {}

    /// Attach a buffer and start reading the next frame
    pub fn arm(&mut self, pkt: PacketHandle) {
        self.packet = Some(pkt);
        self.state = RxState::SetReadPointer;
    }

    /// Current state
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Consecutive invalid status vectors seen
    pub fn retry(&self) -> u8 {
        self.retry
    }

    /// Status vector of the frame in flight
    pub fn rsv(&self) -> &ReceiveStatusVector {
        &self.rsv
    }

    /// Buffer attached to the descriptor
    pub fn packet(&self) -> Option<PacketHandle> {
        self.packet
    }

    /// Whether a bus operation is outstanding
    pub fn is_busy(&self) -> bool {
        self.operation.is_some()
    }

    /// Advance the state machine.
    ///
    /// Does nothing unless the receive path is [`RxResetState::Running`].
    pub fn task<B: BusOps, const PKTS: usize, const BUF: usize>(
        &mut self,
        ctx: &mut RxContext<PKTS, BUF>,
        bus: &mut B,
    ) {
        if ctx.reset_state != RxResetState::Running {
            return;
        }
        while let Flow::Continue = self.step(ctx, bus) {}
    }

    fn step<B: BusOps, const PKTS: usize, const BUF: usize>(
        &mut self,
        ctx: &mut RxContext<PKTS, BUF>,
        bus: &mut B,
    ) -> Flow {
        match self.state {
            RxState::Empty => Flow::Yield,

            RxState::SetReadPointer => {
                if self.retry >= ctx.config.retry_limit {
                    self.hard_reset(ctx);
                    return Flow::Yield;
                }
                // Ring cursor ran into the TX region; wait for a reset
                if ctx.rx_ptr >= ctx.config.tx_start {
                    return Flow::Yield;
                }
                let op = bus.start_sfr_write16(Sfr16::ReadPointer, ctx.rx_ptr);
                self.issued(op, RxState::WaitReadPointer)
            }

            RxState::WaitReadPointer => match self.poll(ctx, bus) {
                BusResult::Success => self.advance(RxState::ReadStatusVector),
                BusResult::Error => self.advance(RxState::SetReadPointer),
                BusResult::Pending => Flow::Yield,
            },

            RxState::ReadStatusVector => {
                let op = bus.start_data_read(&mut ctx.rsv_scratch);
                self.issued(op, RxState::WaitStatusVector)
            }

            RxState::WaitStatusVector => match self.poll(ctx, bus) {
                BusResult::Pending => Flow::Yield,
                BusResult::Error => self.advance(RxState::ReadStatusVector),
                BusResult::Success => self.accept_rsv(ctx),
            },

            RxState::ReadPacket => {
                let Some(pkt) = self.packet else {
                    return self.advance(RxState::Empty);
                };
                let len = usize::from(self.rsv.rx_byte_count);
                let target = ctx.packets[pkt.index()].read_target(len);
                let op = bus.start_data_read(target);
                self.issued(op, RxState::WaitForRead)
            }

            RxState::WaitForRead => match self.poll(ctx, bus) {
                BusResult::Pending => Flow::Yield,
                BusResult::Error => self.advance(RxState::ReadPacket),
                BusResult::Success => {
                    ctx.rx_ptr = self.rsv.next_packet;
                    if let Some(pkt) = self.packet {
                        let payload = usize::from(self.rsv.rx_byte_count)
                            - CRC_SIZE
                            - ETH_HEADER_SIZE;
                        ctx.packets[pkt.index()].finish_read(payload as u16);
                    }
                    self.state = RxState::PacketDecrement;
                    Flow::Continue
                }
            },

            RxState::PacketDecrement => {
                let op = bus.start_packet_decrement();
                self.issued(op, RxState::WaitForDecrement)
            }

            RxState::WaitForDecrement => match self.poll(ctx, bus) {
                BusResult::Pending => Flow::Yield,
                BusResult::Error => self.advance(RxState::PacketDecrement),
                BusResult::Success => {
                    ctx.counter_sync = true;
                    ctx.rx_pending = false;
                    self.state = RxState::ResetReadCursor;
                    Flow::Continue
                }
            },

            RxState::ResetReadCursor => {
                let value = rx_read_pointer_for(self.rsv.next_packet, &ctx.config);
                let op = bus.start_sfr_write16(Sfr16::RxReadPointer, value);
                self.issued(op, RxState::ResetWait)
            }

            RxState::ResetWait => match self.poll(ctx, bus) {
                BusResult::Pending => Flow::Yield,
                BusResult::Error => self.advance(RxState::ResetReadCursor),
                BusResult::Success => {
                    self.deliver(ctx);
                    Flow::Yield
                }
            },
        }
    }

    fn advance(&mut self, next: RxState) -> Flow {
        self.state = next;
        Flow::Yield
    }

    /// Record the token of a started operation; stay put if the bus was busy
    fn issued(&mut self, op: Option<OpToken>, next: RxState) -> Flow {
        if let Some(op) = op {
            self.operation = Some(op);
            self.state = next;
        }
        Flow::Yield
    }

    fn poll<B: BusOps, const PKTS: usize, const BUF: usize>(
        &mut self,
        ctx: &mut RxContext<PKTS, BUF>,
        bus: &mut B,
    ) -> BusResult {
        let result = match self.operation {
            Some(op) => bus.poll_result(op),
            // Nothing to wait for; re-issue
            None => BusResult::Error,
        };
        if result.is_done() {
            self.operation = None;
        }
        if result == BusResult::Error {
            ctx.counters.bus_errors = ctx.counters.bus_errors.wrapping_add(1);
        }
        result
    }

    fn accept_rsv<const PKTS: usize, const BUF: usize>(
        &mut self,
        ctx: &mut RxContext<PKTS, BUF>,
    ) -> Flow {
        let mut raw = [0u8; RSV_SIZE];
        raw.copy_from_slice(&ctx.rsv_scratch[RX_SEG_LOAD_OFFSET..]);
        let rsv = ReceiveStatusVector::from_bytes(&raw);

        // The frame has to fit the packet buffer behind the headroom byte
        let buffer_limit =
            BUF.saturating_sub(RX_SEG_LOAD_OFFSET).min(usize::from(u16::MAX)) as u16;
        let max_frame = ctx.config.max_frame_size.min(buffer_limit);

        if let Err(_fault) = rsv.check(max_frame) {
            #[cfg(feature = "defmt")]
            defmt::debug!("rx: invalid RSV at {=u16:#x}: {}", ctx.rx_ptr, _fault);
            ctx.counters.rsv_errors = ctx.counters.rsv_errors.wrapping_add(1);
            self.retry = self.retry.saturating_add(1);
            self.state = RxState::SetReadPointer;
            return Flow::Yield;
        }

        self.rsv = rsv;
        self.retry = 0;
        self.state = RxState::ReadPacket;
        Flow::Continue
    }

    /// Drop the frame, rewind the ring cursor and hand control to the outer
    /// reset state machine
    fn hard_reset<const PKTS: usize, const BUF: usize>(&mut self, ctx: &mut RxContext<PKTS, BUF>) {
        #[cfg(feature = "defmt")]
        defmt::warn!("rx: {} invalid status vectors, resetting ring cursor", self.retry);

        self.retry = 0;
        ctx.reset_state = RxResetState::Starting;
        ctx.rx_ptr = ctx.config.rx_start;
        ctx.counters.hard_resets = ctx.counters.hard_resets.wrapping_add(1);
        if let Some(pkt) = self.packet.take() {
            ctx.release(pkt);
        }
        self.state = RxState::Empty;
        ctx.events.signal(MacEvents::RX_RESET);
    }

    fn deliver<const PKTS: usize, const BUF: usize>(&mut self, ctx: &mut RxContext<PKTS, BUF>) {
        if let Some(pkt) = self.packet.take() {
            let buffer = &mut ctx.packets[pkt.index()];
            buffer.flags |= classify(&self.rsv);

            #[cfg(feature = "defmt")]
            defmt::debug!(
                "rx: frame of {} bytes ready in buffer {}",
                self.rsv.rx_byte_count,
                pkt.index()
            );

            if ctx.push_ready(pkt) {
                ctx.counters.rx_ok_packets = ctx.counters.rx_ok_packets.wrapping_add(1);
                ctx.events.signal(MacEvents::RX_DONE);
            }
        }

        self.rsv = ReceiveStatusVector::EMPTY;
        self.retry = 0;
        self.state = RxState::Empty;
    }
}

/// ERXRDPT value that releases everything before `next_packet`.
///
/// ERXRDPT must be odd (ENC28J60 erratum), so the value is one below the next
/// frame, wrapped to the ring end and forced odd.
pub fn rx_read_pointer_for(next_packet: u16, config: &RxConfig) -> u16 {
    let mut ptr = if next_packet == config.rx_start {
        config.rx_end
    } else {
        next_packet.wrapping_sub(1)
    };
    if ptr % 2 == 0 {
        ptr = ptr.wrapping_sub(1);
    }
    if ptr > config.rx_end {
        ptr = config.rx_end;
    }
    if ptr == config.rx_start {
        ptr = config.rx_end;
    }
    ptr
}

/// Destination class from the status vector.
///
/// A vector with both multicast and broadcast set is reported as unicast.
pub fn classify(rsv: &ReceiveStatusVector) -> PacketFlags {
    match (rsv.rx_multicast, rsv.rx_broadcast) {
        (true, false) => PacketFlags::MULTICAST,
        (false, true) => PacketFlags::BROADCAST,
        (true, true) | (false, false) => PacketFlags::UNICAST,
    }
}

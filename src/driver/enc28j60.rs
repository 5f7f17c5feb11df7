//! ENC28J60 receive driver.
//!
//! [`Enc28j60`] owns the bus, the packet pool and the receive descriptors.
//! The application polls [`Enc28j60::rx_tasks`] from its super-loop and
//! picks up frames with [`Enc28j60::packet_get`]:
//!
//! ```ignore
//! let mut mac: Enc28j60Default<MyBus> = Enc28j60::new(bus, RxConfig::new())?;
//!
//! loop {
//!     if let Some(count) = read_epktcnt_if(mac.needs_counter_sync()) {
//!         mac.signal_packet_pending(count);
//!     }
//!     mac.rx_tasks();
//!     while let Some(pkt) = mac.packet_get() {
//!         stack.input(mac.packet(pkt).unwrap().buffer());
//!         mac.ack(pkt)?;
//!     }
//! }
//! ```

use crate::bus::{BusOps, BusResult, OpToken, Sfr16};
use crate::driver::config::RxConfig;
use crate::driver::context::{RxContext, RxCounters, RxResetState};
use crate::driver::events::{EventNotifier, MacEvents};
use crate::driver::packet::{BufferOwner, MacPacket, PacketHandle};
use crate::driver::rx::{RxPacket, RxState};
use crate::error::{ConfigError, ConfigResult, RxResult};
use crate::internal::constants::{
    DEFAULT_PACKET_BUFFER_SIZE, DEFAULT_RX_DESCRIPTORS, DEFAULT_RX_PACKETS,
};

// =============================================================================
// Driver
// =============================================================================

/// ENC28J60 receive driver
///
/// # Type Parameters
/// * `PKTS` - Packet buffers in the pool (1..=255)
/// * `BUF` - Size of each packet buffer, including the headroom byte
/// * `DESC` - Receive descriptors
pub struct Enc28j60<
    B,
    const PKTS: usize = DEFAULT_RX_PACKETS,
    const BUF: usize = DEFAULT_PACKET_BUFFER_SIZE,
    const DESC: usize = DEFAULT_RX_DESCRIPTORS,
> {
    bus: B,
    ctx: RxContext<PKTS, BUF>,
    descriptors: [RxPacket; DESC],
    /// Outstanding ERXRDPT write of the reset sequence
    reset_op: Option<OpToken>,
}

impl<B: BusOps, const PKTS: usize, const BUF: usize, const DESC: usize>
    Enc28j60<B, PKTS, BUF, DESC>
{
    /// Create the driver.
    ///
    /// Validates the buffer layout and pool sizes. The receive path starts
    /// in [`RxResetState::Starting`]; the first [`Enc28j60::rx_tasks`] call
    /// programs ERXRDPT.
    pub fn new(bus: B, config: RxConfig) -> ConfigResult<Self> {
        config.validate()?;
        config.validate_buffer(BUF)?;
        if PKTS == 0 || PKTS > usize::from(u8::MAX) || DESC == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }

        Ok(Self {
            bus,
            ctx: RxContext::new(config),
            descriptors: [const { RxPacket::new() }; DESC],
            reset_op: None,
        })
    }

    /// Run the receive path once.
    ///
    /// Finishes a pending ring reset, arms an idle descriptor when the
    /// controller reports a frame, then advances every descriptor.
    pub fn rx_tasks(&mut self) {
        self.rx_reset_task();
        if self.ctx.reset_state != RxResetState::Running {
            return;
        }

        self.arm_descriptor();
        for desc in &mut self.descriptors {
            desc.task(&mut self.ctx, &mut self.bus);
        }
    }

    /// Outer reset: program ERXRDPT to the ring end and wait for it
    fn rx_reset_task(&mut self) {
        match self.ctx.reset_state {
            RxResetState::Running => {}
            RxResetState::Starting => {
                let end = self.ctx.config.rx_end;
                if let Some(op) = self.bus.start_sfr_write16(Sfr16::RxReadPointer, end) {
                    self.reset_op = Some(op);
                    self.ctx.reset_state = RxResetState::WaitingForWrite;
                }
            }
            RxResetState::WaitingForWrite => {
                let result = match self.reset_op {
                    Some(op) => self.bus.poll_result(op),
                    None => BusResult::Error,
                };
                match result {
                    BusResult::Pending => {}
                    BusResult::Success => {
                        self.reset_op = None;
                        self.ctx.rx_ptr = self.ctx.config.rx_start;
                        self.ctx.reset_state = RxResetState::Running;
                        #[cfg(feature = "defmt")]
                        defmt::info!("rx: ring ready at {=u16:#x}", self.ctx.rx_ptr);
                    }
                    BusResult::Error => {
                        self.reset_op = None;
                        self.ctx.counters.bus_errors = self.ctx.counters.bus_errors.wrapping_add(1);
                        self.ctx.reset_state = RxResetState::Starting;
                    }
                }
            }
        }
    }

    /// Ring reads are sequential: only arm when nothing is in flight
    fn arm_descriptor(&mut self) {
        if !self.ctx.rx_pending {
            return;
        }
        if self.descriptors.iter().any(|d| d.state() != RxState::Empty) {
            return;
        }
        let Some(desc) = self.descriptors.first_mut() else {
            return;
        };
        let Some(pkt) = self.ctx.take_free() else {
            return;
        };
        self.ctx.packets[pkt.index()].recycle();
        desc.arm(pkt);
    }

    /// Report the controller's pending frame count (EPKTCNT)
    pub fn signal_packet_pending(&mut self, count: u8) {
        self.ctx.counter_sync = false;
        self.ctx.rx_pending = count > 0;
    }

    /// Whether EPKTCNT changed under the driver and must be re-read
    pub fn needs_counter_sync(&self) -> bool {
        self.ctx.counter_sync
    }

    // =========================================================================
    // Packet pickup
    // =========================================================================

    /// Take the oldest received frame
    pub fn packet_get(&mut self) -> Option<PacketHandle> {
        self.ctx.take_ready()
    }

    /// Access a packet buffer
    pub fn packet(&self, pkt: PacketHandle) -> Option<&MacPacket<BUF>> {
        self.ctx.packets.get(pkt.index())
    }

    /// Return a buffer taken with [`Enc28j60::packet_get`] to the pool
    pub fn ack(&self, pkt: PacketHandle) -> RxResult<()> {
        self.ctx.ack(pkt)
    }

    /// Current owner of a packet buffer
    pub fn packet_owner(&self, pkt: PacketHandle) -> Option<BufferOwner> {
        self.ctx.owner(pkt)
    }

    /// Free buffers in the pool
    pub fn free_packets(&self) -> usize {
        self.ctx.free.len()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Accumulated events, left in place
    pub fn events_get(&self) -> MacEvents {
        self.ctx.events.get()
    }

    /// Accumulated events, cleared
    pub fn events_take(&self) -> MacEvents {
        self.ctx.events.take()
    }

    /// Call `notifier` for every signalled event in `mask`
    pub fn set_event_notifier(&self, mask: MacEvents, notifier: EventNotifier) {
        self.ctx.events.set_notifier(mask, notifier);
    }

    /// Remove the event notifier
    pub fn clear_event_notifier(&self) {
        self.ctx.events.clear_notifier();
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Receive statistics
    pub fn counters(&self) -> RxCounters {
        self.ctx.counters
    }

    /// Ring address of the next status vector
    pub fn rx_read_pointer(&self) -> u16 {
        self.ctx.rx_ptr
    }

    /// Outer reset state
    pub fn reset_state(&self) -> RxResetState {
        self.ctx.reset_state
    }

    /// Receive descriptor `index`
    pub fn descriptor(&self, index: usize) -> Option<&RxPacket> {
        self.descriptors.get(index)
    }

    /// Configuration in use
    pub fn config(&self) -> &RxConfig {
        &self.ctx.config
    }

    /// Bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Bus, mutably
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

/// Driver with default pool sizes (4 buffers of 1536 bytes, one descriptor)
pub type Enc28j60Default<B> = Enc28j60<B>;

/// Driver for memory-constrained parts (2 buffers)
pub type Enc28j60Small<B> = Enc28j60<B, 2, DEFAULT_PACKET_BUFFER_SIZE>;

#[cfg(test)]
mod tests {
    extern crate std;

    use core::sync::atomic::{AtomicU16, Ordering};

    use super::*;
    use crate::error::RxError;
    use crate::internal::enc28j60_regs::rsv as rsv_bits;
    use crate::testing::{BusOp, MockBus};

    type Mac = Enc28j60<MockBus, 2, 1536, 1>;

    fn frame(len: usize, first: u8) -> std::vec::Vec<u8> {
        let mut bytes: std::vec::Vec<u8> = (0..len).map(|i| i as u8).collect();
        bytes[0] = first;
        bytes
    }

    fn running() -> Mac {
        let config = RxConfig::new();
        let mut mac = Mac::new(MockBus::new(&config), config).unwrap();
        mac.rx_tasks();
        mac.rx_tasks();
        assert_eq!(mac.reset_state(), RxResetState::Running);
        mac.bus_mut().log.clear();
        mac
    }

    fn pump(mac: &mut Mac, calls: usize) {
        for _ in 0..calls {
            mac.rx_tasks();
        }
    }

    #[test]
    fn new_validates_configuration() {
        let config = RxConfig::new();
        assert!(Mac::new(MockBus::new(&config), config).is_ok());

        let bad = RxConfig::new().with_retry_limit(0);
        assert!(Mac::new(MockBus::new(&config), bad).is_err());

        let small = Enc28j60::<MockBus, 2, 64, 1>::new(MockBus::new(&config), config);
        assert!(small.is_err());

        // Handles are u8
        let huge = Enc28j60::<MockBus, 256, 64, 1>::new(
            MockBus::new(&config),
            config.with_max_frame_size(60),
        );
        assert_eq!(huge.err(), Some(ConfigError::InvalidPoolSize));
    }

    #[test]
    fn startup_programs_erxrdpt() {
        let config = RxConfig::new();
        let mut mac = Mac::new(MockBus::new(&config), config).unwrap();
        assert_eq!(mac.reset_state(), RxResetState::Starting);

        mac.rx_tasks();
        assert_eq!(mac.reset_state(), RxResetState::WaitingForWrite);
        assert_eq!(mac.bus().erxrdpt, Some(0x19FF));

        mac.rx_tasks();
        assert_eq!(mac.reset_state(), RxResetState::Running);
        assert_eq!(mac.bus().log, std::vec![BusOp::Write16(Sfr16::RxReadPointer, 0x19FF)]);
    }

    #[test]
    fn reset_write_error_restarts() {
        let config = RxConfig::new();
        let mut mac = Mac::new(MockBus::new(&config), config).unwrap();
        mac.bus_mut().results.push_back(BusResult::Pending);
        mac.bus_mut().results.push_back(BusResult::Error);

        mac.rx_tasks();
        mac.rx_tasks();
        assert_eq!(mac.reset_state(), RxResetState::WaitingForWrite);
        mac.rx_tasks();
        assert_eq!(mac.reset_state(), RxResetState::Starting);
        assert_eq!(mac.counters().bus_errors, 1);

        pump(&mut mac, 2);
        assert_eq!(mac.reset_state(), RxResetState::Running);
    }

    #[test]
    fn idle_without_pending_frames() {
        let mut mac = running();
        pump(&mut mac, 3);
        assert!(mac.bus().log.is_empty());
        assert_eq!(mac.descriptor(0).unwrap().state(), RxState::Empty);
        assert_eq!(mac.free_packets(), 2);
    }

    #[test]
    fn receives_and_acks_frames() {
        let mut mac = running();
        mac.bus_mut().write_frame(
            0x0000,
            0x0050,
            &frame(60, 0xFF),
            rsv_bits::RX_OK | rsv_bits::BROADCAST,
        );
        mac.bus_mut().write_frame(0x0050, 0x00A0, &frame(60, 0x02), rsv_bits::RX_OK);

        mac.signal_packet_pending(2);
        pump(&mut mac, 7);
        assert!(mac.needs_counter_sync());
        assert_eq!(mac.counters().rx_ok_packets, 1);
        assert_eq!(mac.rx_read_pointer(), 0x0050);

        // Nothing is armed until the counter is re-read
        pump(&mut mac, 2);
        assert_eq!(mac.descriptor(0).unwrap().state(), RxState::Empty);

        mac.signal_packet_pending(1);
        pump(&mut mac, 7);
        assert_eq!(mac.counters().rx_ok_packets, 2);
        assert!(mac.events_get().contains(MacEvents::RX_DONE));
        assert_eq!(mac.free_packets(), 0);

        let first = mac.packet_get().unwrap();
        let pkt = mac.packet(first).unwrap();
        assert!(pkt.flags().contains(crate::driver::packet::PacketFlags::BROADCAST));
        assert_eq!(pkt.ethernet_header()[0], 0xFF);
        assert_eq!(pkt.seg_len(), 60 - 14);

        let second = mac.packet_get().unwrap();
        assert_eq!(mac.packet(second).unwrap().ethernet_header()[0], 0x02);
        assert!(mac.packet_get().is_none());

        mac.ack(first).unwrap();
        mac.ack(second).unwrap();
        assert_eq!(mac.ack(second), Err(RxError::AlreadyFree));
        assert_eq!(mac.free_packets(), 2);
    }

    #[test]
    fn stale_ack_of_reused_buffer_is_rejected() {
        let mut mac = running();
        mac.bus_mut().write_frame(0x0000, 0x0050, &frame(60, 0x01), rsv_bits::RX_OK);
        mac.bus_mut().write_frame(0x0050, 0x00A0, &frame(60, 0x02), rsv_bits::RX_OK);
        mac.bus_mut().write_frame(0x00A0, 0x00F0, &frame(60, 0x03), rsv_bits::RX_OK);

        mac.signal_packet_pending(1);
        pump(&mut mac, 7);
        let first = mac.packet_get().unwrap();
        assert_eq!(mac.packet_owner(first), Some(BufferOwner::Consumer));
        mac.ack(first).unwrap();

        // The second frame takes the other buffer, the third reuses `first`
        for _ in 0..2 {
            mac.signal_packet_pending(1);
            pump(&mut mac, 7);
        }
        assert_eq!(mac.counters().rx_ok_packets, 3);
        assert_eq!(mac.packet_owner(first), Some(BufferOwner::Ready));

        assert_eq!(mac.ack(first), Err(RxError::NotHeld));
        assert_eq!(mac.free_packets(), 0);

        let second = mac.packet_get().unwrap();
        assert_ne!(second, first);
        assert_eq!(mac.ack(first), Err(RxError::NotHeld));
        mac.ack(second).unwrap();

        assert_eq!(mac.packet_get(), Some(first));
        assert_eq!(mac.packet(first).unwrap().ethernet_header()[0], 0x03);
        mac.ack(first).unwrap();
        assert_eq!(mac.free_packets(), 2);
    }

    #[test]
    fn ack_of_in_flight_buffer_is_rejected() {
        let mut mac = running();
        mac.bus_mut().write_frame(0x0000, 0x0050, &frame(60, 0x01), rsv_bits::RX_OK);
        mac.signal_packet_pending(1);
        mac.rx_tasks();

        let desc = mac.descriptor(0).unwrap();
        assert_ne!(desc.state(), RxState::Empty);
        let pkt = desc.packet().unwrap();
        assert_eq!(mac.packet_owner(pkt), Some(BufferOwner::InFlight));
        assert_eq!(mac.ack(pkt), Err(RxError::NotHeld));
        assert_eq!(mac.free_packets(), 1);
    }

    #[test]
    fn pool_exhaustion_holds_frames_in_ring() {
        let mut mac = running();
        let mut next = 0u16;
        for _ in 0..3 {
            let start = next;
            next += 0x50;
            mac.bus_mut().write_frame(start, next, &frame(60, 0x02), rsv_bits::RX_OK);
        }

        for _ in 0..2 {
            mac.signal_packet_pending(1);
            pump(&mut mac, 7);
        }
        assert_eq!(mac.free_packets(), 0);

        mac.signal_packet_pending(1);
        pump(&mut mac, 3);
        assert_eq!(mac.descriptor(0).unwrap().state(), RxState::Empty);
        assert_eq!(mac.rx_read_pointer(), 0x00A0);

        let pkt = mac.packet_get().unwrap();
        mac.ack(pkt).unwrap();
        pump(&mut mac, 7);
        assert_eq!(mac.counters().rx_ok_packets, 3);
        assert_eq!(mac.rx_read_pointer(), 0x00F0);
    }

    #[test]
    fn hard_reset_runs_outer_reset() {
        let mut mac = running();
        // Zeroed ring: every status vector is invalid
        mac.signal_packet_pending(1);

        let mut calls = 0;
        while mac.counters().hard_resets == 0 {
            mac.rx_tasks();
            calls += 1;
            assert!(calls < 32, "hard reset never happened");
        }
        assert_eq!(mac.reset_state(), RxResetState::Starting);
        assert_eq!(mac.free_packets(), 2);
        assert!(mac.events_take().contains(MacEvents::RX_RESET));

        mac.bus_mut().log.clear();
        pump(&mut mac, 2);
        assert_eq!(mac.reset_state(), RxResetState::Running);
        assert_eq!(mac.bus().log[0], BusOp::Write16(Sfr16::RxReadPointer, 0x19FF));
        assert_eq!(mac.rx_read_pointer(), 0x0000);
    }

    static LAST_EVENT: AtomicU16 = AtomicU16::new(0);

    fn record(events: MacEvents) {
        LAST_EVENT.store(events.bits(), Ordering::SeqCst);
    }

    #[test]
    fn notifier_sees_rx_done() {
        let mut mac = running();
        mac.set_event_notifier(MacEvents::RX_DONE, record);
        mac.bus_mut().write_frame(0x0000, 0x0050, &frame(60, 0x02), rsv_bits::RX_OK);

        mac.signal_packet_pending(1);
        pump(&mut mac, 7);
        assert_eq!(LAST_EVENT.load(Ordering::SeqCst), MacEvents::RX_DONE.bits());
        assert!(mac.events_take().contains(MacEvents::RX_DONE));
        assert!(mac.events_get().is_empty());
        mac.clear_event_notifier();
    }
}

//! Testing utilities and mock implementations
//!
//! Mock bus, media driver and delay used to exercise the receive engine and
//! the media manager on the host.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use crate::bus::{BusOps, BusResult, OpToken, Sfr16};
use crate::driver::config::RxConfig;
use crate::internal::constants::ENC_MEMORY_END;
use crate::media::{CommandHandle, CommandStatus, GeometryRegion, MediaDevice, MediaGeometry};

// =============================================================================
// Mock Bus
// =============================================================================

/// Operation issued on the mock bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Write16(Sfr16, u16),
    /// Buffer memory read of `n` payload bytes
    Read(usize),
    Decrement,
}

/// Mock ENC28J60 bus backed by an 8 KB buffer memory image.
///
/// Register writes and reads take effect when started; poll results come
/// from `results` (success when empty). Starting a second operation while
/// one is outstanding panics.
#[derive(Debug)]
pub struct MockBus {
    pub memory: Vec<u8>,
    rx_start: u16,
    rx_end: u16,
    /// ERDPT
    pub erdpt: u16,
    /// Last value written to ERXRDPT
    pub erxrdpt: Option<u16>,
    /// Scripted poll results
    pub results: VecDeque<BusResult>,
    /// Number of upcoming start calls rejected as busy
    pub busy: u32,
    /// Issued operations
    pub log: Vec<BusOp>,
    outstanding: Option<OpToken>,
    next_token: u32,
}

impl MockBus {
    pub fn new(config: &RxConfig) -> Self {
        Self {
            memory: vec![0; usize::from(ENC_MEMORY_END) + 1],
            rx_start: config.rx_start,
            rx_end: config.rx_end,
            erdpt: 0,
            erxrdpt: None,
            results: VecDeque::new(),
            busy: 0,
            log: Vec::new(),
            outstanding: None,
            next_token: 1,
        }
    }

    /// Store a status vector plus `frame` and a zero FCS at `addr`
    pub fn write_frame(&mut self, addr: u16, next: u16, frame: &[u8], status: u16) {
        let count = (frame.len() + 4) as u16;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&next.to_le_bytes());
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(&status.to_le_bytes());
        bytes.extend_from_slice(frame);
        bytes.extend_from_slice(&[0; 4]);

        let mut ptr = addr;
        for byte in bytes {
            self.memory[usize::from(ptr)] = byte;
            ptr = self.advance(ptr);
        }
    }

    fn advance(&self, ptr: u16) -> u16 {
        if ptr == self.rx_end {
            self.rx_start
        } else {
            ptr + 1
        }
    }

    fn start(&mut self, op: BusOp) -> Option<OpToken> {
        assert!(self.outstanding.is_none(), "second outstanding bus operation: {op:?}");
        if self.busy > 0 {
            self.busy -= 1;
            return None;
        }
        self.log.push(op);
        let token = OpToken::new(self.next_token);
        self.next_token += 1;
        self.outstanding = token;
        token
    }
}

impl BusOps for MockBus {
    fn start_sfr_write16(&mut self, reg: Sfr16, value: u16) -> Option<OpToken> {
        let token = self.start(BusOp::Write16(reg, value))?;
        match reg {
            Sfr16::ReadPointer => self.erdpt = value,
            Sfr16::RxReadPointer => self.erxrdpt = Some(value),
        }
        Some(token)
    }

    fn start_data_read(&mut self, dst: &mut [u8]) -> Option<OpToken> {
        let len = dst.len() - 1;
        let token = self.start(BusOp::Read(len))?;
        dst[0] = 0xFF;
        for byte in &mut dst[1..] {
            *byte = self.memory[usize::from(self.erdpt)];
            self.erdpt = self.advance(self.erdpt);
        }
        Some(token)
    }

    fn start_packet_decrement(&mut self) -> Option<OpToken> {
        self.start(BusOp::Decrement)
    }

    fn poll_result(&mut self, op: OpToken) -> BusResult {
        assert_eq!(self.outstanding, Some(op), "poll of unknown operation");
        let result = self.results.pop_front().unwrap_or(BusResult::Success);
        if result.is_done() {
            self.outstanding = None;
        }
        result
    }
}

// =============================================================================
// Mock Media
// =============================================================================

/// Shared state of a [`MockMedia`]; clones of the mock see the same state
#[derive(Debug)]
pub struct MockMediaState {
    /// Device image
    pub image: Vec<u8>,
    pub geometry: MediaGeometry,
    pub attached: bool,
    pub open: bool,
    /// Open calls that fail before one succeeds
    pub open_failures: u32,
    /// Polls reporting `InProgress` before a command completes
    pub pending_polls: u32,
    /// Next command completes with an error
    pub fail_next: bool,
    /// Start calls rejected before one is queued
    pub reject: u32,
    pub reads: Vec<(u32, u32)>,
    pub writes: Vec<(u32, u32)>,
    pub task_calls: u32,
    pub closed: bool,
    commands: Vec<(CommandHandle, u32, bool)>,
    next_handle: u32,
}

/// In-memory media driver
#[derive(Debug, Clone)]
pub struct MockMedia {
    state: Rc<RefCell<MockMediaState>>,
}

impl MockMedia {
    /// Attached device with 512-byte blocks and `blocks` blocks
    pub fn new(blocks: u32) -> Self {
        Self::with_geometry(GeometryRegion::new(512, blocks), GeometryRegion::new(512, blocks))
    }

    pub fn with_geometry(read: GeometryRegion, write: GeometryRegion) -> Self {
        let size = (read.block_size * read.num_blocks) as usize;
        Self {
            state: Rc::new(RefCell::new(MockMediaState {
                image: vec![0; size],
                geometry: MediaGeometry {
                    read,
                    write,
                    erase: write,
                },
                attached: true,
                open: false,
                open_failures: 0,
                pending_polls: 0,
                fail_next: false,
                reject: 0,
                reads: Vec::new(),
                writes: Vec::new(),
                task_calls: 0,
                closed: false,
                commands: Vec::new(),
                next_handle: 1,
            })),
        }
    }

    pub fn state(&self) -> std::cell::RefMut<'_, MockMediaState> {
        self.state.borrow_mut()
    }

    pub fn set_attached(&self, attached: bool) {
        self.state.borrow_mut().attached = attached;
    }

    pub fn load(&self, offset: usize, bytes: &[u8]) {
        self.state.borrow_mut().image[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn queue(state: &mut MockMediaState) -> Option<CommandHandle> {
        if state.reject > 0 {
            state.reject -= 1;
            return None;
        }
        let handle = CommandHandle::new(state.next_handle);
        state.next_handle += 1;
        let failed = core::mem::take(&mut state.fail_next);
        state.commands.push((handle, state.pending_polls, failed));
        Some(handle)
    }
}

impl MediaDevice for MockMedia {
    fn open(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.open_failures > 0 {
            state.open_failures -= 1;
            return false;
        }
        state.open = true;
        true
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.closed = true;
    }

    fn is_attached(&mut self) -> bool {
        self.state.borrow().attached
    }

    fn geometry(&mut self) -> MediaGeometry {
        self.state.borrow().geometry
    }

    fn sector_read(
        &mut self,
        buf: &mut [u8],
        block: u32,
        num_blocks: u32,
    ) -> Option<CommandHandle> {
        let mut state = self.state.borrow_mut();
        let handle = Self::queue(&mut state)?;
        let bs = state.geometry.read.block_size as usize;
        let start = block as usize * bs;
        let len = (num_blocks as usize * bs).min(buf.len());
        buf[..len].copy_from_slice(&state.image[start..start + len]);
        state.reads.push((block, num_blocks));
        Some(handle)
    }

    fn sector_write(
        &mut self,
        data: &[u8],
        block: u32,
        num_blocks: u32,
    ) -> Option<CommandHandle> {
        let mut state = self.state.borrow_mut();
        let handle = Self::queue(&mut state)?;
        let bs = state.geometry.write.block_size as usize;
        let start = block as usize * bs;
        let len = num_blocks as usize * bs;
        state.image[start..start + len].copy_from_slice(&data[..len]);
        state.writes.push((block, num_blocks));
        Some(handle)
    }

    fn read(&mut self, dst: &mut [u8], address: u32) -> Option<CommandHandle> {
        let mut state = self.state.borrow_mut();
        let handle = Self::queue(&mut state)?;
        let start = address as usize;
        dst.copy_from_slice(&state.image[start..start + dst.len()]);
        state.reads.push((address, dst.len() as u32));
        Some(handle)
    }

    fn address(&mut self) -> u32 {
        0x9D00_0000
    }

    fn command_status(&mut self, cmd: CommandHandle) -> CommandStatus {
        let state = self.state.borrow();
        match state.commands.iter().find(|(h, _, _)| *h == cmd) {
            Some((_, pending, _)) if *pending > 0 => CommandStatus::InProgress,
            Some((_, _, true)) => CommandStatus::Unknown,
            Some(_) => CommandStatus::Completed,
            None => CommandStatus::Unknown,
        }
    }

    fn tasks(&mut self) {
        let mut state = self.state.borrow_mut();
        state.task_calls += 1;
        for (_, pending, _) in &mut state.commands {
            *pending = pending.saturating_sub(1);
        }
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay implementation for testing
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_bus_reads_wrap_at_ring_end() {
        let config = RxConfig::new();
        let mut bus = MockBus::new(&config);
        bus.memory[0x19FF] = 0xAB;
        bus.memory[0x0000] = 0xCD;

        let op = bus.start_sfr_write16(Sfr16::ReadPointer, 0x19FF).unwrap();
        assert_eq!(bus.poll_result(op), BusResult::Success);

        let mut dst = [0u8; 3];
        let op = bus.start_data_read(&mut dst).unwrap();
        assert_eq!(bus.poll_result(op), BusResult::Success);
        assert_eq!(dst, [0xFF, 0xAB, 0xCD]);
    }

    #[test]
    fn mock_media_completes_after_pending_polls() {
        let mut media = MockMedia::new(4);
        media.state().pending_polls = 2;
        let mut buf = [0u8; 512];
        let cmd = media.sector_read(&mut buf, 0, 1).unwrap();

        assert_eq!(media.command_status(cmd), CommandStatus::InProgress);
        media.tasks();
        media.tasks();
        assert_eq!(media.command_status(cmd), CommandStatus::Completed);
    }
}

//! PIC32 ENC28J60 and Media Drivers
//!
//! A `no_std`, `no_alloc` Rust implementation of two cooperatively scheduled
//! drivers for PIC32-class super-loop firmware:
//!
//! 1. **ENC28J60 receive engine** ([`driver`]): walks frames out of the
//!    controller's on-chip RX ring through a non-blocking bus seam
//!    ([`bus::BusOps`]), validates each receive status vector and hands
//!    complete frames to the network stack through a fixed packet pool.
//! 2. **Media manager** ([`media`]): watches registered storage devices
//!    ([`media::MediaDevice`]) for insertion and removal, classifies sector 0
//!    (MBR, VBR, MPFS) and publishes named volumes such as `sda1` to the file
//!    system layer, plus the sector I/O used by that layer.
//!
//! Neither driver blocks. Each exposes a task function that performs at most
//! one step of bus or device work per call and is meant to be polled from the
//! main loop. The only blocking path is the read-modify-write fallback of
//! [`media::MediaManager::sector_write`] for devices whose write block is
//! larger than a sector, which is bounded by a poll budget.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and state-machine logging
//!
//! # Example
//!
//! ```ignore
//! use ph_pic32_drivers::{Enc28j60, MediaManager, MediaManagerConfig, MediaType, RxConfig};
//!
//! let mut mac: Enc28j60<_> = Enc28j60::new(spi_bus, RxConfig::new())?;
//! let mut media: MediaManager<'_> = MediaManager::new(MediaManagerConfig::new());
//! media.register(&mut sd_card, MediaType::Sd)?;
//!
//! loop {
//!     mac.rx_tasks();
//!     media.tasks();
//!     while let Some(pkt) = mac.packet_get() {
//!         // hand the frame to the stack, then
//!         mac.ack(pkt)?;
//!     }
//! }
//! ```
//!
//! # Memory Requirements
//!
//! With default configuration:
//! - Receive engine: 4 packet buffers of 1536 bytes (~6 KB)
//! - Media manager: 512-byte scratch sector plus a 4 KB read-modify-write block

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here and in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod bus;
pub mod driver;
pub mod error;
pub mod media;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use bus::{BusOps, BusResult, OpToken, Sfr16};
pub use driver::{
    BufferOwner, Enc28j60, Enc28j60Default, Enc28j60Small, MacEvents, MacPacket, PacketFlags,
    PacketHandle, RxConfig, RxCounters, RxResetState,
};
pub use error::{
    ConfigError, ConfigResult, Error, MediaError, MediaResult, Result, RxError, RxResult,
};
pub use media::{
    CommandHandle, CommandStatus, FsKind, FsType, MediaDevice, MediaGeometry, MediaHandle,
    MediaManager, MediaManagerConfig, MediaType, Volume, VolumeProperty,
};
pub use sync::SharedEnc28j60;

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // Frame sizes
        CRC_SIZE,
        // Pool sizes
        DEFAULT_BLOCK_BUFFER_SIZE,
        DEFAULT_MEDIA_BUFFER_SIZE,
        DEFAULT_MEDIA_NUMBER,
        DEFAULT_PACKET_BUFFER_SIZE,
        DEFAULT_RX_DESCRIPTORS,
        // ENC28J60 buffer layout
        DEFAULT_RX_END,
        DEFAULT_RX_PACKETS,
        DEFAULT_RX_START,
        DEFAULT_TX_START,
        DEFAULT_VOLUME_NUMBER,
        // Blocking write path
        DEFAULT_WRITE_POLL_INTERVAL_US,
        DEFAULT_WRITE_POLL_LIMIT,
        ENC_MEMORY_END,
        ETH_HEADER_SIZE,
        MAX_FRAME_SIZE,
        MIN_RX_BYTE_COUNT,
        RX_RETRY_LIMIT,
        // Media
        SECTOR_SIZE,
    };
}

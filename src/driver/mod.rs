//! ENC28J60 receive engine.
//!
//! - [`config`] - Buffer layout and retry configuration
//! - [`rsv`] - Receive status vector decoding and validation
//! - [`packet`] - Packet buffers, handles and flags
//! - [`events`] - MAC event flags and notifier
//! - [`context`] - State shared by the receive descriptors
//! - [`rx`] - Per-descriptor receive state machine
//! - [`enc28j60`] - The driver facade tying the pieces together
//!
//! # Example
//!
//! ```ignore
//! use ph_pic32_drivers::driver::{Enc28j60, RxConfig};
//!
//! let config = RxConfig::new().with_retry_limit(5);
//! let mut mac: Enc28j60<_, 4, 1536> = Enc28j60::new(bus, config)?;
//! ```

pub mod config;
pub mod context;
pub mod enc28j60;
pub mod events;
pub mod packet;
pub mod rsv;
pub mod rx;

pub use config::RxConfig;
pub use context::{RxContext, RxCounters, RxResetState};
pub use enc28j60::{Enc28j60, Enc28j60Default, Enc28j60Small};
pub use events::{EventFlags, EventNotifier, MacEvents};
pub use packet::{BufferOwner, MacPacket, PacketFlags, PacketHandle};
pub use rsv::{ReceiveStatusVector, RsvFault};
pub use rx::{RxPacket, RxState, classify, rx_read_pointer_for};

//! ISR-safe building blocks.
//!
//! The receive engine runs from the super-loop, but packet acknowledgement
//! and event consumption may happen in interrupt context. The types here
//! wrap every shared access in `critical_section::with()`.
//!
//! - [`CriticalSectionCell`]: interior mutability behind a critical section
//! - [`ProtectedList`]: fixed-capacity FIFO used for the free and ready lists
//! - [`SharedEnc28j60`]: the receive driver behind a critical section, for
//!   acknowledging packets from interrupt handlers

mod list;
mod primitives;
mod shared;

pub use list::ProtectedList;
pub use primitives::CriticalSectionCell;
pub use shared::SharedEnc28j60;

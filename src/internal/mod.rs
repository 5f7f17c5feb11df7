//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Frame sizes, buffer layout defaults and pool sizes
//! - [`enc28j60_regs`]: ENC28J60 register addresses and RSV status bits
//! - [`boot_record`]: Boot sector offsets and magic values
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod boot_record;
pub(crate) mod constants;
pub(crate) mod enc28j60_regs;

//! Guest physical memory access for device models.
//!
//! Devices that own descriptor rings in guest RAM (bus-mastering NICs in particular) only ever
//! touch memory through [`MemoryBus`], so they can be driven against a full machine bus or a
//! plain test buffer interchangeably.
#![forbid(unsafe_code)]

pub mod bus;
pub mod dense;

pub use bus::MemoryBus;
pub use dense::{DenseMemory, GuestMemoryError, GuestMemoryResult};

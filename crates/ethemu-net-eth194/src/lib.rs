//! ETH194 paravirtual Ethernet controller.
//!
//! The device exposes a byte-wide, paged register file in a 256-byte I/O window. Unlike a ring of
//! fixed-size descriptors in device memory, both rings are singly-linked chains of Frame Buffer
//! Descriptors (see [`fbd`]) living in guest RAM:
//!
//! - the transmit ("read") ring is rooted at `CURR` and drained synchronously when the guest sets
//!   `CMD.TRANS`;
//! - the receive ("write") ring is rooted at `CURW` and consumed one descriptor per host frame.
//!
//! Guest memory is never owned by the device; every operation that touches descriptors takes a
//! [`memory::MemoryBus`]. Transmitted frames are queued for the host and drained with
//! [`Eth194Device::pop_tx_frame`], or handed straight to a
//! [`NetworkBackend`](ethemu_net_backend::NetworkBackend) by
//! [`Eth194Device::io_write_with_egress`] (which is what [`SharedEth194`] does).
#![forbid(unsafe_code)]

mod device;
pub mod fbd;
pub mod regs;
mod ring;
mod shared;

pub use device::Eth194Device;
pub use ethemu_io_snapshot::io::net::state::RXCR_LEGACY_DEFAULT;
pub use fbd::{FbdHeader, FbdState, FBD_HEADER_LEN};
pub use regs::{Command, Isr, Rsr, Tsr};
pub use shared::SharedEth194;

/// Size of the I/O port window.
pub const ETH194_IO_SIZE: u16 = 0x100;

/// Reading this offset of the window (before the 4-bit register decode) resets the device.
pub const ETH194_RESET_PORT: u16 = 0x1f;

/// Received frames shorter than this are zero-padded up to it.
pub const MIN_FRAME_LEN: usize = 60;

/// Largest Ethernet frame (without FCS) the device moves in either direction.
pub const MAX_ETH_FRAME_SIZE: usize = 1514;

pub const DEFAULT_MAC_ADDR: [u8; 6] = [0x52, 0x54, 0x00, 0x12, 0x34, 0x56];

pub const PCI_VENDOR_ID: u16 = 0x0ca1;
pub const PCI_DEVICE_ID: u16 = 0xe194;

pub const DEFAULT_MAX_TX_CHAIN_LEN: usize = 4096;
pub const DEFAULT_MAX_TX_QUEUE_FRAMES: usize = DEFAULT_MAX_TX_CHAIN_LEN;

/// Host-side configuration of an [`Eth194Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eth194Config {
    /// MAC address loaded into `PHYS` at power-on; [`DEFAULT_MAC_ADDR`] when unset.
    pub mac_addr: Option<[u8; 6]>,
    /// Upper bound on descriptors visited by one transmit trigger.
    ///
    /// Guest-built chains may be cyclic; exceeding the bound aborts the transmit and latches a
    /// [`RingFault`].
    pub max_tx_chain_len: usize,
    /// Capacity of the host-facing transmit queue used when no egress sink is wired in.
    ///
    /// Raised to at least `max_tx_chain_len` so one trigger always fits into an empty queue. A
    /// trigger that finds the queue full aborts with [`RingFault::TxQueueFull`].
    pub max_tx_queue_frames: usize,
}

impl Default for Eth194Config {
    fn default() -> Self {
        Self {
            mac_addr: None,
            max_tx_chain_len: DEFAULT_MAX_TX_CHAIN_LEN,
            max_tx_queue_frames: DEFAULT_MAX_TX_QUEUE_FRAMES,
        }
    }
}

/// Outcome of offering a host frame to the receive ring.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxStatus {
    /// Stored into guest memory; `len` is the stored length after padding.
    Accepted { len: usize },
    Refused(RxRefusal),
}

impl RxStatus {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Reason a host frame was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxRefusal {
    /// `CMD.STOP` is set.
    Stopped,
    /// `CURW == 0`: the guest has not posted a receive descriptor.
    NoBuffer,
    /// The frame exceeds [`MAX_ETH_FRAME_SIZE`].
    Oversized,
}

impl RxRefusal {
    /// Whether the same frame may be accepted later without guest action on the frame itself.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Stopped | Self::NoBuffer)
    }
}

/// Guest programming errors detected while walking a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RingFault {
    #[error("transmit chain starting at {head:#010x} exceeds {limit} descriptors")]
    TxChainTooLong { head: u32, limit: usize },
    #[error("transmit queue full ({capacity} frames) at descriptor {at:#010x}")]
    TxQueueFull { at: u32, capacity: usize },
}

//! Frame Buffer Descriptor (FBD) layout and state flags.
//!
//! An FBD lives in guest memory and is shared with the guest driver:
//!
//! ```text
//! offset  size  field
//! 0       1     df    descriptor flag (ownership state)
//! 1       1     hf    header flag, zeroed by the device
//! 2       4     nphy  guest physical address of the next FBD, 0 = end of chain
//! 6       2     cnt   payload length in bytes
//! 8       cnt   d     payload
//! ```
//!
//! All multi-byte fields are little-endian. Ownership transitions are published by writing the
//! single `df` byte so the guest observes them as early as possible.

use memory::MemoryBus;

pub const FBD_HEADER_LEN: usize = 8;

const DF_OFFSET: u64 = 0;
const NPHY_OFFSET: u64 = 2;

/// Value of the `df` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FbdState {
    /// Guest-owned, may be claimed by the device.
    Free = 0x00,
    /// Claimed for receive; payload not yet valid.
    Writing = 0x01,
    /// Receive payload committed; guest may consume.
    Written = 0x03,
    /// Claimed for transmit; payload being forwarded.
    Reading = 0x04,
    /// Transmit payload forwarded; guest may reclaim.
    Done = 0x0c,
}

impl FbdState {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x00 => Self::Free,
            0x01 => Self::Writing,
            0x03 => Self::Written,
            0x04 => Self::Reading,
            0x0c => Self::Done,
            _ => return None,
        })
    }
}

/// Decoded FBD header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbdHeader {
    pub df: u8,
    pub hf: u8,
    pub nphy: u32,
    pub cnt: u16,
}

impl FbdHeader {
    pub fn from_bytes(bytes: &[u8; FBD_HEADER_LEN]) -> Self {
        Self {
            df: bytes[0],
            hf: bytes[1],
            nphy: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            cnt: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; FBD_HEADER_LEN] {
        let mut out = [0u8; FBD_HEADER_LEN];
        out[0] = self.df;
        out[1] = self.hf;
        out[2..6].copy_from_slice(&self.nphy.to_le_bytes());
        out[6..8].copy_from_slice(&self.cnt.to_le_bytes());
        out
    }

    pub fn state(&self) -> Option<FbdState> {
        FbdState::from_u8(self.df)
    }

    pub fn read(mem: &mut dyn MemoryBus, addr: u64) -> Self {
        let mut bytes = [0u8; FBD_HEADER_LEN];
        mem.read_physical(addr, &mut bytes);
        Self::from_bytes(&bytes)
    }

    pub fn write(&self, mem: &mut dyn MemoryBus, addr: u64) {
        mem.write_physical(addr, &self.to_bytes());
    }
}

/// Publish an ownership transition by writing only the `df` byte.
pub fn set_state(mem: &mut dyn MemoryBus, addr: u64, state: FbdState) {
    mem.write_u8(addr + DF_OFFSET, state as u8);
}

/// Re-read the chain link from guest memory; the guest may have relinked the descriptor.
pub fn read_nphy(mem: &mut dyn MemoryBus, addr: u64) -> u32 {
    mem.read_u32(addr + NPHY_OFFSET)
}

/// Guest physical address of the payload of the FBD at `addr`.
pub fn payload_addr(addr: u64) -> u64 {
    addr + FBD_HEADER_LEN as u64
}

use thiserror::Error;

use crate::bus::MemoryBus;

/// Errors returned when constructing guest memory backings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestMemoryError {
    /// The requested size cannot be represented by the current platform's `usize`.
    #[error("guest memory size {size} does not fit in usize")]
    SizeTooLarge { size: u64 },
}

pub type GuestMemoryResult<T> = Result<T, GuestMemoryError>;

/// Dense (contiguous) guest RAM starting at physical address 0.
///
/// Accesses beyond the end behave like an unpopulated bus: reads return all-ones and writes are
/// dropped. An access that straddles the end is split at the boundary.
#[derive(Debug, Clone)]
pub struct DenseMemory {
    data: Box<[u8]>,
}

impl DenseMemory {
    pub fn new(size: u64) -> GuestMemoryResult<Self> {
        let size_usize =
            usize::try_from(size).map_err(|_| GuestMemoryError::SizeTooLarge { size })?;
        Ok(Self {
            data: vec![0u8; size_usize].into_boxed_slice(),
        })
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the in-bounds prefix of `[paddr, paddr + len)` as a `usize` range.
    fn backed_range(&self, paddr: u64, len: usize) -> Option<(usize, usize)> {
        let start = usize::try_from(paddr).ok()?;
        if start >= self.data.len() {
            return None;
        }
        let end = start.saturating_add(len).min(self.data.len());
        Some((start, end))
    }
}

impl MemoryBus for DenseMemory {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        buf.fill(0xFF);
        if let Some((start, end)) = self.backed_range(paddr, buf.len()) {
            buf[..end - start].copy_from_slice(&self.data[start..end]);
        }
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        if let Some((start, end)) = self.backed_range(paddr, buf.len()) {
            self.data[start..end].copy_from_slice(&buf[..end - start]);
        }
    }
}

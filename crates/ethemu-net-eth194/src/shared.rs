use std::sync::{Arc, Mutex, MutexGuard};

use ethemu_net_backend::NetworkBackend;
use ethemu_platform::PortIoDevice;
use memory::MemoryBus;

use crate::device::Eth194Device;
use crate::RxStatus;

struct Inner<M, B> {
    nic: Eth194Device,
    mem: M,
    backend: B,
}

impl<M: MemoryBus, B: NetworkBackend> Inner<M, B> {
    /// Frames queued through [`SharedEth194::with_parts`] go out ahead of anything this write
    /// transmits.
    fn write_reg(&mut self, offset: u16, val: u8) {
        while let Some(frame) = self.nic.pop_tx_frame() {
            self.backend.transmit(frame);
        }
        self.nic
            .io_write_with_egress(&mut self.mem, &mut self.backend, offset, val);
    }
}

/// Cloneable handle that serializes every access to one NIC behind a single lock.
///
/// The register file, both ring heads and the guest-memory accessor share the lock, so the
/// emulated CPU (through [`PortIoDevice`]) and a host networking thread (through
/// [`SharedEth194::deliver`]) never observe a half-walked ring. Each frame drained by a transmit
/// trigger reaches the backend before its descriptor is marked `DONE`.
pub struct SharedEth194<M, B> {
    inner: Arc<Mutex<Inner<M, B>>>,
    io_base: u16,
}

impl<M, B> Clone for SharedEth194<M, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            io_base: self.io_base,
        }
    }
}

impl<M: MemoryBus, B: NetworkBackend> SharedEth194<M, B> {
    /// `io_base` is the first port of the 256-byte window the handle will be mapped at.
    pub fn new(io_base: u16, nic: Eth194Device, mem: M, backend: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { nic, mem, backend })),
            io_base,
        }
    }

    pub fn io_base(&self) -> u16 {
        self.io_base
    }

    fn lock(&self) -> MutexGuard<'_, Inner<M, B>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with the lock held.
    pub fn with_parts<R>(&self, f: impl FnOnce(&mut Eth194Device, &mut M, &mut B) -> R) -> R {
        let mut guard = self.lock();
        let Inner { nic, mem, backend } = &mut *guard;
        f(nic, mem, backend)
    }

    pub fn can_receive(&self) -> bool {
        self.lock().nic.can_receive()
    }

    /// Offer a host → guest frame to the receive ring.
    pub fn deliver(&self, frame: &[u8]) -> RxStatus {
        let mut guard = self.lock();
        let Inner { nic, mem, .. } = &mut *guard;
        nic.receive_frame(mem, frame)
    }

    pub fn irq_level(&self) -> bool {
        self.lock().nic.irq_level()
    }

    pub fn io_read_u8(&self, offset: u16) -> u8 {
        self.lock().nic.io_read(offset)
    }

    pub fn io_write_u8(&self, offset: u16, val: u8) {
        self.lock().write_reg(offset, val);
    }
}

impl<M: MemoryBus, B: NetworkBackend> PortIoDevice for SharedEth194<M, B> {
    fn read(&mut self, port: u16, size: u8) -> u32 {
        let offset = port.wrapping_sub(self.io_base);
        let mut guard = self.lock();
        let mut value = 0u32;
        for i in 0..size.min(4) {
            let byte = guard.nic.io_read(offset.wrapping_add(u16::from(i)));
            value |= u32::from(byte) << (8 * u32::from(i));
        }
        value
    }

    fn write(&mut self, port: u16, size: u8, value: u32) {
        let offset = port.wrapping_sub(self.io_base);
        let mut guard = self.lock();
        for i in 0..size.min(4) {
            let byte = (value >> (8 * u32::from(i))) as u8;
            guard.write_reg(offset.wrapping_add(u16::from(i)), byte);
        }
    }

    fn reset(&mut self) {
        self.lock().nic.reset();
    }
}

//! Host-side network backend primitives for emulated NICs.
//!
//! This crate deals exclusively with raw Ethernet frames (`Vec<u8>`): the NIC model hands guest
//! transmit frames to [`NetworkBackend::transmit`] and the host glue polls
//! [`NetworkBackend::poll_receive`] for frames to deliver into the guest.
#![forbid(unsafe_code)]

pub mod queue_backend;

pub use queue_backend::{FrameQueueBackend, FrameQueueStats, DEFAULT_QUEUE_CAPACITY};

/// Network backend to bridge frames between emulated NICs and the host network stack.
pub trait NetworkBackend {
    /// Transmit a guest → host Ethernet frame.
    fn transmit(&mut self, frame: Vec<u8>);

    /// Poll for a host → guest Ethernet frame.
    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        None
    }
}

impl<T: NetworkBackend + ?Sized> NetworkBackend for Box<T> {
    fn transmit(&mut self, frame: Vec<u8>) {
        <T as NetworkBackend>::transmit(&mut **self, frame);
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        <T as NetworkBackend>::poll_receive(&mut **self)
    }
}

impl<T: NetworkBackend + ?Sized> NetworkBackend for &mut T {
    fn transmit(&mut self, frame: Vec<u8>) {
        <T as NetworkBackend>::transmit(&mut **self, frame);
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        <T as NetworkBackend>::poll_receive(&mut **self)
    }
}

/// Shares one backend between the NIC pump and a host thread. A poisoned lock is recovered
/// rather than propagated.
impl<T: NetworkBackend + ?Sized> NetworkBackend for std::sync::Arc<std::sync::Mutex<T>> {
    fn transmit(&mut self, frame: Vec<u8>) {
        self.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .transmit(frame);
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        self.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .poll_receive()
    }
}

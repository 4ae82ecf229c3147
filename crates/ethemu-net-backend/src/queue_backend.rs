use std::collections::VecDeque;

use crate::NetworkBackend;

/// Default per-direction frame capacity of a [`FrameQueueBackend`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Counters maintained by [`FrameQueueBackend`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameQueueStats {
    /// Guest → host frames captured.
    pub tx_frames: u64,
    /// Guest → host frames dropped because the capture queue was full.
    pub tx_dropped: u64,
    /// Host → guest frames accepted by [`FrameQueueBackend::inject_rx`].
    pub rx_injected: u64,
    /// Host → guest frames dropped because the injection queue was full.
    pub rx_dropped: u64,
    /// Host → guest frames handed out via [`NetworkBackend::poll_receive`].
    pub rx_delivered: u64,
}

/// Bounded in-memory host transport.
///
/// Transmitted frames are captured for the host to drain with [`Self::pop_tx`]; frames queued
/// with [`Self::inject_rx`] are handed to the NIC by [`NetworkBackend::poll_receive`]. Both queues
/// drop new frames once full instead of growing without bound.
#[derive(Debug, Clone)]
pub struct FrameQueueBackend {
    tx: VecDeque<Vec<u8>>,
    rx: VecDeque<Vec<u8>>,
    capacity: usize,
    stats: FrameQueueStats,
}

impl Default for FrameQueueBackend {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl FrameQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            capacity,
            stats: FrameQueueStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> FrameQueueStats {
        self.stats
    }

    /// Queue a host → guest frame. Returns `false` if the frame was dropped.
    pub fn inject_rx(&mut self, frame: Vec<u8>) -> bool {
        if self.rx.len() >= self.capacity {
            self.stats.rx_dropped += 1;
            tracing::warn!(len = frame.len(), "rx injection queue full; dropping frame");
            return false;
        }
        self.rx.push_back(frame);
        self.stats.rx_injected += 1;
        true
    }

    pub fn pop_tx(&mut self) -> Option<Vec<u8>> {
        self.tx.pop_front()
    }

    pub fn drain_tx(&mut self) -> Vec<Vec<u8>> {
        self.tx.drain(..).collect()
    }

    pub fn pending_tx(&self) -> usize {
        self.tx.len()
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }
}

impl NetworkBackend for FrameQueueBackend {
    fn transmit(&mut self, frame: Vec<u8>) {
        if self.tx.len() >= self.capacity {
            self.stats.tx_dropped += 1;
            tracing::warn!(len = frame.len(), "tx capture queue full; dropping frame");
            return;
        }
        self.tx.push_back(frame);
        self.stats.tx_frames += 1;
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        let frame = self.rx.pop_front()?;
        self.stats.rx_delivered += 1;
        Some(frame)
    }
}

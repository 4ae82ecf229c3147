//! Glue logic for pumping Ethernet frames between an ETH194 NIC and a host backend.
//!
//! The NIC drains its transmit chain synchronously inside the guest's `CMD` write, so the pump
//! only has to move already-queued frames. Each tick:
//! 1. Drain guest TX frames to the [`NetworkBackend`], with a bounded budget.
//! 2. Retry the held RX frame, if any, then poll backend RX frames into the receive ring, with a
//!    bounded budget.
//!
//! A frame refused because the guest has no receive descriptor posted (or the NIC is stopped) is
//! held and retried on the next tick; the backend is not polled again until it is accepted.
#![forbid(unsafe_code)]

use ethemu_net_backend::NetworkBackend;
use ethemu_net_eth194::{Eth194Device, RxStatus};
use memory::MemoryBus;

/// Default frame budget for each direction per [`Eth194Pump::poll`] call.
pub const DEFAULT_MAX_FRAMES_PER_POLL: usize = 256;

/// Number of frames pumped in each direction during a tick/poll.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpCounts {
    /// Guest → host frames forwarded to the backend via [`NetworkBackend::transmit`].
    pub tx_frames: usize,
    /// Host → guest frames stored into the receive ring.
    pub rx_frames: usize,
    /// Host → guest frames discarded because the NIC can never accept them.
    pub rx_dropped: usize,
}

/// Budgets plus the backpressure slot, for integration layers that *borrow* the NIC and backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eth194TickPump {
    pub max_tx_frames_per_tick: usize,
    pub max_rx_frames_per_tick: usize,
    held_rx: Option<Vec<u8>>,
}

impl Default for Eth194TickPump {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAMES_PER_POLL, DEFAULT_MAX_FRAMES_PER_POLL)
    }
}

impl Eth194TickPump {
    pub fn new(max_tx_frames_per_tick: usize, max_rx_frames_per_tick: usize) -> Self {
        Self {
            max_tx_frames_per_tick,
            max_rx_frames_per_tick,
            held_rx: None,
        }
    }

    /// Host frame waiting for a receive descriptor.
    pub fn held_rx_frame(&self) -> Option<&[u8]> {
        self.held_rx.as_deref()
    }

    /// Drop the held frame, e.g. when the NIC is reset or restored from a snapshot.
    pub fn clear_held_rx_frame(&mut self) -> Option<Vec<u8>> {
        self.held_rx.take()
    }

    pub fn tick<B: NetworkBackend + ?Sized>(
        &mut self,
        nic: &mut Eth194Device,
        mem: &mut dyn MemoryBus,
        backend: &mut B,
    ) {
        let _ = self.tick_with_counts(nic, mem, backend);
    }

    pub fn tick_with_counts<B: NetworkBackend + ?Sized>(
        &mut self,
        nic: &mut Eth194Device,
        mem: &mut dyn MemoryBus,
        backend: &mut B,
    ) -> PumpCounts {
        tick_eth194_with_counts(
            nic,
            mem,
            backend,
            &mut self.held_rx,
            self.max_tx_frames_per_tick,
            self.max_rx_frames_per_tick,
        )
    }
}

/// Pump frames between a borrowed [`Eth194Device`] and a borrowed [`NetworkBackend`].
///
/// `held` is the caller-owned backpressure slot: a frame the NIC refused with a retryable reason
/// is parked there and offered again first on the next call. Frames the NIC can never accept
/// (oversized) are dropped.
///
/// Ordering is deterministic: all TX forwarding for the tick happens before any backend RX poll,
/// so a backend that answers synchronously sees the request first.
pub fn tick_eth194_with_counts<B: NetworkBackend + ?Sized>(
    nic: &mut Eth194Device,
    mem: &mut dyn MemoryBus,
    backend: &mut B,
    held: &mut Option<Vec<u8>>,
    max_tx_frames_per_tick: usize,
    max_rx_frames_per_tick: usize,
) -> PumpCounts {
    let mut counts = PumpCounts::default();

    // Step 1: forward guest TX frames.
    for _ in 0..max_tx_frames_per_tick {
        let Some(frame) = nic.pop_tx_frame() else {
            break;
        };
        backend.transmit(frame);
        counts.tx_frames += 1;
    }

    // Step 2: inject host RX frames, held frame first.
    for _ in 0..max_rx_frames_per_tick {
        let Some(frame) = held.take().or_else(|| backend.poll_receive()) else {
            break;
        };
        match nic.receive_frame(mem, &frame) {
            RxStatus::Accepted { .. } => counts.rx_frames += 1,
            RxStatus::Refused(reason) if reason.is_retryable() => {
                *held = Some(frame);
                break;
            }
            RxStatus::Refused(reason) => {
                tracing::debug!(?reason, len = frame.len(), "dropping host frame");
                counts.rx_dropped += 1;
            }
        }
    }

    counts
}

/// Moves Ethernet frames between an owned [`Eth194Device`] and a host-side [`NetworkBackend`].
#[derive(Debug)]
pub struct Eth194Pump<B> {
    nic: Eth194Device,
    backend: B,
    held_rx: Option<Vec<u8>>,

    max_tx_frames_per_poll: usize,
    max_rx_frames_per_poll: usize,
}

impl<B: NetworkBackend> Eth194Pump<B> {
    /// Create a pump with default budgets.
    pub fn new(nic: Eth194Device, backend: B) -> Self {
        Self::with_budgets(
            nic,
            backend,
            DEFAULT_MAX_FRAMES_PER_POLL,
            DEFAULT_MAX_FRAMES_PER_POLL,
        )
    }

    /// Create a pump with explicit budgets.
    pub fn with_budgets(
        nic: Eth194Device,
        backend: B,
        max_tx_frames_per_poll: usize,
        max_rx_frames_per_poll: usize,
    ) -> Self {
        Self {
            nic,
            backend,
            held_rx: None,
            max_tx_frames_per_poll,
            max_rx_frames_per_poll,
        }
    }

    /// Run one pump iteration.
    pub fn poll(&mut self, mem: &mut dyn MemoryBus) {
        let _ = self.poll_with_counts(mem);
    }

    /// Run one pump iteration and return the number of frames processed in each direction.
    pub fn poll_with_counts(&mut self, mem: &mut dyn MemoryBus) -> PumpCounts {
        tick_eth194_with_counts(
            &mut self.nic,
            mem,
            &mut self.backend,
            &mut self.held_rx,
            self.max_tx_frames_per_poll,
            self.max_rx_frames_per_poll,
        )
    }

    pub fn nic(&self) -> &Eth194Device {
        &self.nic
    }

    pub fn nic_mut(&mut self) -> &mut Eth194Device {
        &mut self.nic
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn held_rx_frame(&self) -> Option<&[u8]> {
        self.held_rx.as_deref()
    }

    /// Returns the NIC, the backend and any frame still held for delivery.
    pub fn into_parts(self) -> (Eth194Device, B, Option<Vec<u8>>) {
        (self.nic, self.backend, self.held_rx)
    }

    pub fn max_tx_frames_per_poll(&self) -> usize {
        self.max_tx_frames_per_poll
    }

    pub fn max_rx_frames_per_poll(&self) -> usize {
        self.max_rx_frames_per_poll
    }

    pub fn set_max_tx_frames_per_poll(&mut self, value: usize) {
        self.max_tx_frames_per_poll = value;
    }

    pub fn set_max_rx_frames_per_poll(&mut self, value: usize) {
        self.max_rx_frames_per_poll = value;
    }
}

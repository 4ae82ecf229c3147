//! Receive and transmit walkers over guest-resident FBD chains.

use ethemu_net_backend::NetworkBackend;
use memory::MemoryBus;

use crate::device::Eth194Device;
use crate::fbd::{self, FbdHeader, FbdState};
use crate::regs::{Command, Isr, Rsr, Tsr};
use crate::{RingFault, RxRefusal, RxStatus, MAX_ETH_FRAME_SIZE, MIN_FRAME_LEN};

impl Eth194Device {
    /// Whether [`Self::receive_frame`] would currently store a frame of legal size.
    pub fn can_receive(&self) -> bool {
        !self.is_stopped() && self.regs.curw != 0
    }

    /// Store a host → guest frame into the descriptor at `CURW`.
    ///
    /// Refusals leave device and guest memory untouched; the caller decides whether to hold the
    /// frame for a retry (see [`RxRefusal::is_retryable`]).
    ///
    /// Address filtering is not modelled: every accepted frame is reported as a
    /// physical/multicast match (`RSR.PHY`).
    pub fn receive_frame(&mut self, mem: &mut dyn MemoryBus, frame: &[u8]) -> RxStatus {
        if self.is_stopped() {
            return RxStatus::Refused(RxRefusal::Stopped);
        }
        if self.regs.curw == 0 {
            return RxStatus::Refused(RxRefusal::NoBuffer);
        }
        if frame.len() > MAX_ETH_FRAME_SIZE {
            tracing::debug!(len = frame.len(), "eth194 refusing oversized rx frame");
            return RxStatus::Refused(RxRefusal::Oversized);
        }

        let head = self.regs.curw;
        let addr = u64::from(head);
        let len = frame.len().max(MIN_FRAME_LEN);

        fbd::set_state(mem, addr, FbdState::Writing);
        let nphy = fbd::read_nphy(mem, addr);
        FbdHeader {
            df: FbdState::Writing as u8,
            hf: 0,
            nphy,
            cnt: len as u16,
        }
        .write(mem, addr);

        let payload = fbd::payload_addr(addr);
        mem.write_physical(payload, frame);
        if len > frame.len() {
            let pad = [0u8; MIN_FRAME_LEN];
            mem.write_physical(payload + frame.len() as u64, &pad[..len - frame.len()]);
        }
        fbd::set_state(mem, addr, FbdState::Written);

        self.regs.curw = nphy;
        self.regs.rsr = (Rsr::RXOK | Rsr::PHY).bits();
        tracing::debug!(head, nphy, len, "eth194 rx stored");
        self.raise(Isr::RX);

        RxStatus::Accepted { len }
    }

    /// Drain the transmit chain rooted at `CURR`.
    ///
    /// With an `egress` sink every payload is forwarded before its descriptor is marked `DONE`.
    /// Without one, payloads go to the host-facing queue; a full queue aborts the walk at the
    /// current descriptor, which is left untouched so a later trigger resumes there.
    pub(crate) fn transmit(
        &mut self,
        mem: &mut dyn MemoryBus,
        mut egress: Option<&mut dyn NetworkBackend>,
    ) {
        let head = self.regs.curr;
        let limit = self.cfg.max_tx_chain_len;
        let mut frames = 0usize;

        while self.regs.curr != 0 {
            if frames >= limit {
                self.abort_transmit(RingFault::TxChainTooLong { head, limit });
                return;
            }
            if egress.is_none() && self.tx_out.len() >= self.cfg.max_tx_queue_frames {
                let capacity = self.cfg.max_tx_queue_frames;
                let at = self.regs.curr;
                self.abort_transmit(RingFault::TxQueueFull { at, capacity });
                self.regs.curr = at;
                return;
            }

            let addr = u64::from(self.regs.curr);
            let hdr = FbdHeader::read(mem, addr);
            fbd::set_state(mem, addr, FbdState::Reading);

            let len = usize::from(hdr.cnt).min(MAX_ETH_FRAME_SIZE);
            if len < usize::from(hdr.cnt) {
                tracing::debug!(addr, cnt = hdr.cnt, "eth194 clamping tx descriptor length");
            }
            let mut frame = vec![0u8; len];
            mem.read_physical(fbd::payload_addr(addr), &mut frame);
            match egress.as_deref_mut() {
                Some(backend) => backend.transmit(frame),
                None => self.tx_out.push_back(frame),
            }

            fbd::set_state(mem, addr, FbdState::Done);
            self.regs.curr = hdr.nphy;
            self.regs.tsr = Tsr::PTX.bits();
            self.raise(Isr::TX | Isr::RDC);
            frames += 1;
        }

        self.regs.cmd &= !Command::TRANS.bits();
        tracing::debug!(head, frames, "eth194 tx chain drained");
        self.raise(Isr::TX);
    }

    fn abort_transmit(&mut self, fault: RingFault) {
        tracing::warn!(%fault, "eth194 aborting transmit");
        self.regs.curr = 0;
        self.regs.tsr = Tsr::ABT.bits();
        self.regs.cmd &= !Command::TRANS.bits();
        self.fault = Some(fault);
        self.raise(Isr::TX_ERR);
    }
}

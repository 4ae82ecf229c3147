use std::collections::VecDeque;
use std::fmt;

use ethemu_io_snapshot::io::net::state::Eth194DeviceState;
use ethemu_io_snapshot::io::state::{IoSnapshot, SnapshotResult, SnapshotVersion};
use ethemu_net_backend::NetworkBackend;
use ethemu_platform::{IrqLine, NoIrq};
use memory::MemoryBus;

use crate::regs::*;
use crate::{Eth194Config, RingFault, DEFAULT_MAC_ADDR, ETH194_RESET_PORT};

const REG_PHYS_END: u8 = REG_PHYS + 5;
const REG_MULT_END: u8 = REG_MULT + 7;

/// `rv`/`wv` marker left behind by a write to byte N of a ring head.
const HEAD_VALIDITY: [u8; 4] = [0x07, 0x03, 0x01, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingHead {
    Read,
    Write,
}

fn decode_ring_head(index: u8) -> Option<(RingHead, usize)> {
    Some(match index {
        REG_CURR0 => (RingHead::Read, 0),
        REG_CURR1 => (RingHead::Read, 1),
        REG_CURR2 => (RingHead::Read, 2),
        REG_CURR3 => (RingHead::Read, 3),
        REG_CURW0 => (RingHead::Write, 0),
        REG_CURW1 => (RingHead::Write, 1),
        REG_CURW2 => (RingHead::Write, 2),
        REG_CURW3 => (RingHead::Write, 3),
        _ => return None,
    })
}

/// ETH194 NIC model.
///
/// All register accesses are byte-wide and synchronous. A `CMD` write with `TRANS` set drains the
/// whole transmit chain before [`Eth194Device::io_write`] returns.
pub struct Eth194Device {
    pub(crate) regs: Eth194DeviceState,
    pub(crate) cfg: Eth194Config,
    mac_addr: [u8; 6],

    irq: Box<dyn IrqLine + Send>,
    irq_level: bool,

    pub(crate) tx_out: VecDeque<Vec<u8>>,
    pub(crate) fault: Option<RingFault>,
}

impl fmt::Debug for Eth194Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eth194Device")
            .field("regs", &self.regs)
            .field("cfg", &self.cfg)
            .field("irq_level", &self.irq_level)
            .field("tx_out_len", &self.tx_out.len())
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

impl Eth194Device {
    pub fn new(mac_addr: [u8; 6]) -> Self {
        Self::with_config(Eth194Config {
            mac_addr: Some(mac_addr),
            ..Eth194Config::default()
        })
    }

    pub fn with_config(mut cfg: Eth194Config) -> Self {
        cfg.max_tx_queue_frames = cfg.max_tx_queue_frames.max(cfg.max_tx_chain_len);
        let mac_addr = cfg.mac_addr.unwrap_or(DEFAULT_MAC_ADDR);
        Self {
            regs: Eth194DeviceState {
                isr: Isr::RESET.bits(),
                phys: mac_addr,
                ..Eth194DeviceState::default()
            },
            cfg,
            mac_addr,
            irq: Box::new(NoIrq),
            irq_level: false,
            tx_out: VecDeque::new(),
            fault: None,
        }
    }

    pub fn config(&self) -> &Eth194Config {
        &self.cfg
    }

    /// MAC address the device was configured with. The guest-programmed `PHYS` bytes may differ.
    pub fn mac_addr(&self) -> [u8; 6] {
        self.mac_addr
    }

    /// Connect the interrupt output and drive it with the current level.
    pub fn set_irq_line(&mut self, irq: Box<dyn IrqLine + Send>) {
        self.irq = irq;
        self.irq.set_level(self.irq_level);
    }

    pub fn irq_level(&self) -> bool {
        self.irq_level
    }

    pub fn command(&self) -> Command {
        Command::from_bits_retain(self.regs.cmd)
    }

    pub fn is_stopped(&self) -> bool {
        self.command().contains(Command::STOP)
    }

    pub fn isr(&self) -> Isr {
        Isr::from_bits_retain(self.regs.isr)
    }

    pub fn imr(&self) -> Isr {
        Isr::from_bits_retain(self.regs.imr)
    }

    pub fn tsr(&self) -> Tsr {
        Tsr::from_bits_retain(self.regs.tsr)
    }

    pub fn rsr(&self) -> Rsr {
        Rsr::from_bits_retain(self.regs.rsr)
    }

    pub fn rxcr(&self) -> u8 {
        self.regs.rxcr
    }

    /// Head of the transmit ring.
    pub fn curr(&self) -> u32 {
        self.regs.curr
    }

    /// Head of the receive ring.
    pub fn curw(&self) -> u32 {
        self.regs.curw
    }

    /// Soft reset: latches `ISR.RESET` and forgets both ring heads.
    ///
    /// `CMD`, `IMR`, `PHYS` and `MULT` are preserved. Frames already queued for the host are kept.
    pub fn reset(&mut self) {
        tracing::debug!("eth194 reset");
        self.regs.isr = Isr::RESET.bits();
        self.regs.curr = 0;
        self.regs.curw = 0;
        self.fault = None;
        self.update_irq();
    }

    /// Read the register at `offset` within the I/O window.
    pub fn io_read(&mut self, offset: u16) -> u8 {
        if offset == ETH194_RESET_PORT {
            self.reset();
            return 0;
        }

        let addr = (offset & 0x0f) as u8;
        let val = if addr == REG_CMD {
            self.regs.cmd
        } else {
            self.read_paged(addr | (self.command().page() << 4))
        };
        tracing::debug!(offset, val, "eth194 register read");
        val
    }

    /// Write the register at `offset` within the I/O window.
    ///
    /// `mem` is only touched when the write triggers a transmit. Transmitted frames are queued
    /// for [`Self::pop_tx_frame`].
    pub fn io_write(&mut self, mem: &mut dyn MemoryBus, offset: u16, val: u8) {
        self.write_reg(mem, None, offset, val);
    }

    /// Like [`Self::io_write`], but a triggered transmit forwards every frame to `egress` before
    /// marking its descriptor `DONE`.
    pub fn io_write_with_egress(
        &mut self,
        mem: &mut dyn MemoryBus,
        egress: &mut dyn NetworkBackend,
        offset: u16,
        val: u8,
    ) {
        self.write_reg(mem, Some(egress), offset, val);
    }

    fn write_reg(
        &mut self,
        mem: &mut dyn MemoryBus,
        egress: Option<&mut dyn NetworkBackend>,
        offset: u16,
        val: u8,
    ) {
        tracing::debug!(offset, val, "eth194 register write");

        let addr = (offset & 0x0f) as u8;
        if addr == REG_CMD {
            self.write_cmd(mem, egress, val);
            return;
        }

        let index = addr | (self.command().page() << 4);
        match index {
            REG_IMR => {
                self.regs.imr = val;
                self.update_irq();
            }
            REG_TCNTLO => self.regs.tcnt = (self.regs.tcnt & 0xff00) | u16::from(val),
            REG_TCNTHI => self.regs.tcnt = (self.regs.tcnt & 0x00ff) | (u16::from(val) << 8),
            REG_RCNTLO => self.regs.rcnt = (self.regs.rcnt & 0xff00) | u16::from(val),
            REG_RCNTHI => self.regs.rcnt = (self.regs.rcnt & 0x00ff) | (u16::from(val) << 8),
            REG_RXCR => self.regs.rxcr = val,
            REG_ISR => {
                // Write-1-to-clear; RESET is only cleared by starting the chip.
                self.regs.isr &= !(val & ISR_IRQ_MASK);
                self.update_irq();
            }
            REG_PHYS..=REG_PHYS_END => self.regs.phys[usize::from(index - REG_PHYS)] = val,
            REG_MULT..=REG_MULT_END => self.regs.mult[usize::from(index - REG_MULT)] = val,
            _ => {
                if let Some((head, byte)) = decode_ring_head(index) {
                    self.write_ring_head(head, byte, val);
                }
            }
        }
    }

    fn write_cmd(
        &mut self,
        mem: &mut dyn MemoryBus,
        egress: Option<&mut dyn NetworkBackend>,
        val: u8,
    ) {
        self.regs.cmd = val;

        let cmd = Command::from_bits_retain(val);
        if cmd.contains(Command::STOP) {
            return;
        }

        self.regs.isr &= !Isr::RESET.bits();
        if cmd.intersects(Command::RREAD | Command::RWRITE) && self.regs.rcnt == 0 {
            // Zero-length remote DMA completes immediately.
            self.raise(Isr::RDC);
        }
        if cmd.contains(Command::TRANS) {
            self.transmit(mem, egress);
        }
    }

    fn read_paged(&self, index: u8) -> u8 {
        match index {
            REG_TSR => self.regs.tsr,
            REG_ISR => self.regs.isr,
            REG_RSR => self.regs.rsr,
            REG_ID0 => CHIP_ID[0],
            REG_ID1 => CHIP_ID[1],
            REG_PHYS..=REG_PHYS_END => self.regs.phys[usize::from(index - REG_PHYS)],
            REG_MULT..=REG_MULT_END => self.regs.mult[usize::from(index - REG_MULT)],
            REG_CONFIG0 => CONFIG0_VALUE,
            REG_CONFIG2 => CONFIG2_VALUE,
            REG_CONFIG3 => CONFIG3_VALUE,
            _ => match decode_ring_head(index) {
                Some((RingHead::Read, byte)) => self.regs.curr.to_le_bytes()[byte],
                Some((RingHead::Write, byte)) => self.regs.curw.to_le_bytes()[byte],
                None => 0,
            },
        }
    }

    fn write_ring_head(&mut self, head: RingHead, byte: usize, val: u8) {
        let (ptr, validity) = match head {
            RingHead::Read => (&mut self.regs.curr, &mut self.regs.rv),
            RingHead::Write => (&mut self.regs.curw, &mut self.regs.wv),
        };
        let mut bytes = ptr.to_le_bytes();
        bytes[byte] = val;
        *ptr = u32::from_le_bytes(bytes);
        *validity = HEAD_VALIDITY[byte];
    }

    /// Next frame transmitted by the guest, oldest first.
    pub fn pop_tx_frame(&mut self) -> Option<Vec<u8>> {
        self.tx_out.pop_front()
    }

    pub fn pending_tx_frames(&self) -> usize {
        self.tx_out.len()
    }

    /// Take the last ring fault, if any.
    pub fn take_fault(&mut self) -> Option<RingFault> {
        self.fault.take()
    }

    pub(crate) fn raise(&mut self, bits: Isr) {
        self.regs.isr |= bits.bits();
        self.update_irq();
    }

    fn pending_irq(&self) -> bool {
        (self.regs.isr & self.regs.imr & ISR_IRQ_MASK) != 0
    }

    pub(crate) fn update_irq(&mut self) {
        let level = self.pending_irq();
        if level == self.irq_level {
            return;
        }
        tracing::trace!(level, isr = self.regs.isr, imr = self.regs.imr, "eth194 irq");
        self.irq_level = level;
        self.irq.set_level(level);
    }

    pub fn snapshot_state(&self) -> Eth194DeviceState {
        self.regs.clone()
    }

    /// Replace the register file and re-drive the IRQ line unconditionally.
    ///
    /// Host-side transmit frames and any latched fault belong to the abandoned timeline and are
    /// discarded.
    pub fn restore_state(&mut self, state: &Eth194DeviceState) {
        self.regs = state.clone();
        self.tx_out.clear();
        self.fault = None;
        self.irq_level = self.pending_irq();
        self.irq.set_level(self.irq_level);
    }
}

impl IoSnapshot for Eth194Device {
    const DEVICE_ID: [u8; 4] = <Eth194DeviceState as IoSnapshot>::DEVICE_ID;
    const DEVICE_VERSION: SnapshotVersion = <Eth194DeviceState as IoSnapshot>::DEVICE_VERSION;

    fn save_state(&self) -> Vec<u8> {
        self.regs.save_state()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let mut state = Eth194DeviceState::default();
        if let Err(err) = state.load_state(bytes) {
            tracing::warn!(%err, "rejecting eth194 snapshot");
            return Err(err);
        }
        self.restore_state(&state);
        Ok(())
    }
}

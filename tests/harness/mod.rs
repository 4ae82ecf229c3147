#![allow(dead_code)]

use ethemu_net_eth194::{FbdHeader, FbdState, FBD_HEADER_LEN};
use ethemu_platform::IoPortBus;
use memory::MemoryBus;

pub const IO_BASE: u16 = 0xc000;

const CMD_RUN: u8 = 0x22;
const CMD_STOP: u8 = 0x21;
const CMD_TRANS: u8 = 0x04;

const CURR_OFFSETS: [u16; 4] = [0x02, 0x04, 0x07, 0x08];
const CURW_OFFSETS: [u16; 4] = [0x0a, 0x0b, 0x0c, 0x0d];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Minimal guest driver: programs the NIC exclusively through port I/O.
pub struct GuestDriver<'a> {
    bus: &'a mut IoPortBus,
    base: u16,
}

impl<'a> GuestDriver<'a> {
    pub fn new(bus: &'a mut IoPortBus, base: u16) -> Self {
        Self { bus, base }
    }

    fn outb(&mut self, offset: u16, val: u8) {
        self.bus.write_u8(self.base + offset, val);
    }

    fn inb(&mut self, offset: u16) -> u8 {
        self.bus.read_u8(self.base + offset)
    }

    pub fn reset(&mut self) {
        let _ = self.inb(0x1f);
    }

    pub fn start(&mut self) {
        self.outb(0x00, CMD_RUN);
    }

    pub fn stop(&mut self) {
        self.outb(0x00, CMD_STOP);
    }

    pub fn set_imr(&mut self, mask: u8) {
        self.outb(0x0f, mask);
    }

    pub fn isr(&mut self) -> u8 {
        self.inb(0x07)
    }

    pub fn ack(&mut self, bits: u8) {
        self.outb(0x07, bits);
    }

    pub fn mac(&mut self) -> [u8; 6] {
        self.outb(0x00, 0x40 | CMD_RUN);
        let mut mac = [0u8; 6];
        for (i, b) in mac.iter_mut().enumerate() {
            *b = self.inb(0x01 + i as u16);
        }
        self.outb(0x00, CMD_RUN);
        mac
    }

    fn set_head(&mut self, offsets: [u16; 4], addr: u32) {
        self.outb(0x00, 0xc0 | CMD_RUN);
        for (off, byte) in offsets.into_iter().zip(addr.to_le_bytes()) {
            self.outb(off, byte);
        }
        self.outb(0x00, CMD_RUN);
    }

    pub fn set_rx_head(&mut self, addr: u32) {
        self.set_head(CURW_OFFSETS, addr);
    }

    pub fn set_tx_head(&mut self, addr: u32) {
        self.set_head(CURR_OFFSETS, addr);
    }

    pub fn transmit(&mut self) {
        self.outb(0x00, CMD_RUN | CMD_TRANS);
    }
}

/// Lay out a chain of free descriptors; returns the head address.
pub fn build_chain(mem: &mut dyn MemoryBus, addrs: &[u32], payloads: &[&[u8]]) -> u32 {
    for (i, &addr) in addrs.iter().enumerate() {
        let payload = payloads.get(i).copied().unwrap_or(&[]);
        let hdr = FbdHeader {
            df: FbdState::Free as u8,
            hf: 0,
            nphy: addrs.get(i + 1).copied().unwrap_or(0),
            cnt: payload.len() as u16,
        };
        mem.write_physical(u64::from(addr), &hdr.to_bytes());
        mem.write_physical(u64::from(addr) + FBD_HEADER_LEN as u64, payload);
    }
    addrs.first().copied().unwrap_or(0)
}

/// Returns the descriptor state and its payload.
pub fn read_fbd(mem: &mut dyn MemoryBus, addr: u32) -> (Option<FbdState>, Vec<u8>) {
    let hdr = FbdHeader::read(mem, u64::from(addr));
    let mut payload = vec![0u8; usize::from(hdr.cnt)];
    mem.read_physical(u64::from(addr) + FBD_HEADER_LEN as u64, &mut payload);
    (hdr.state(), payload)
}

pub fn build_test_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14 + payload.len());
    // Ethernet header (dst/src/ethertype).
    frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
    frame.extend_from_slice(&0x0800u16.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

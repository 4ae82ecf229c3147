//! Register offsets and bit definitions.
//!
//! Offsets `>= 0x10` are *effective* indices: the 4-bit port offset OR'ed with the page selected
//! by the top two bits of `CMD` shifted into bits 4..=5.

use bitflags::bitflags;

/// Command register; decoded on every page.
pub const REG_CMD: u8 = 0x00;

// Page 0.
pub const REG_TSR: u8 = 0x04;
pub const REG_TCNTLO: u8 = 0x05;
pub const REG_TCNTHI: u8 = 0x06;
pub const REG_ISR: u8 = 0x07;
pub const REG_RCNTLO: u8 = 0x0a;
pub const REG_ID0: u8 = 0x0a;
pub const REG_RCNTHI: u8 = 0x0b;
pub const REG_ID1: u8 = 0x0b;
pub const REG_RSR: u8 = 0x0c;
pub const REG_RXCR: u8 = 0x0c;
pub const REG_IMR: u8 = 0x0f;

// Page 1.
pub const REG_PHYS: u8 = 0x11;
pub const REG_MULT: u8 = 0x18;

// Page 3: ring heads and board configuration.
pub const REG_CURR0: u8 = 0x32;
pub const REG_CONFIG0: u8 = 0x33;
pub const REG_CURR1: u8 = 0x34;
pub const REG_CONFIG2: u8 = 0x35;
pub const REG_CONFIG3: u8 = 0x36;
pub const REG_CURR2: u8 = 0x37;
pub const REG_CURR3: u8 = 0x38;
pub const REG_CURW0: u8 = 0x3a;
pub const REG_CURW1: u8 = 0x3b;
pub const REG_CURW2: u8 = 0x3c;
pub const REG_CURW3: u8 = 0x3d;

/// Chip identification bytes returned by `ID0`/`ID1` ("PC").
pub const CHIP_ID: [u8; 2] = [0x50, 0x43];

/// 10BASE-T media.
pub const CONFIG0_VALUE: u8 = 0x00;
/// 10BASE-T link active.
pub const CONFIG2_VALUE: u8 = 0x40;
/// Full duplex.
pub const CONFIG3_VALUE: u8 = 0x40;

/// Interrupt bits that participate in IRQ generation. `RESET` is status only.
pub const ISR_IRQ_MASK: u8 = 0x7f;

bitflags! {
    /// `CMD` register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Command: u8 {
        const STOP = 0x01;
        const START = 0x02;
        const TRANS = 0x04;
        const RREAD = 0x08;
        const RWRITE = 0x10;
        const NODMA = 0x20;
        const PAGE_LO = 0x40;
        const PAGE_HI = 0x80;
    }
}

impl Command {
    pub const PAGE_SHIFT: u32 = 6;

    /// Register page selected by the two high bits (0..=3).
    pub fn page(self) -> u8 {
        self.bits() >> Self::PAGE_SHIFT
    }
}

bitflags! {
    /// Interrupt status (`ISR`) and mask (`IMR`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Isr: u8 {
        const RX = 0x01;
        const TX = 0x02;
        const RX_ERR = 0x04;
        const TX_ERR = 0x08;
        const OVER = 0x10;
        const COUNTERS = 0x20;
        const RDC = 0x40;
        const RESET = 0x80;
    }
}

bitflags! {
    /// Receive status (`RSR`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Rsr: u8 {
        const RXOK = 0x01;
        const CRC = 0x02;
        const FAE = 0x04;
        const FO = 0x08;
        const MPA = 0x10;
        const PHY = 0x20;
        const DIS = 0x40;
        const DEF = 0x80;
    }
}

bitflags! {
    /// Transmit status (`TSR`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Tsr: u8 {
        const PTX = 0x01;
        const ND = 0x02;
        const COL = 0x04;
        const ABT = 0x08;
        const CRS = 0x10;
        const FU = 0x20;
        const CDH = 0x40;
        const OWC = 0x80;
    }
}

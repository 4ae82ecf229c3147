use crate::io::state::{
    IoSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};

/// Receive configuration value assumed for snapshots taken before `rxcr` was serialized.
pub const RXCR_LEGACY_DEFAULT: u8 = 0x0c;

/// First device minor version that carries the `rxcr` field.
pub const ETH194_RXCR_SINCE_MINOR: u16 = 1;

const TAG_CMD: u16 = 1;
const TAG_TSR: u16 = 2;
const TAG_TCNT: u16 = 3;
const TAG_RCNT: u16 = 4;
const TAG_RSR: u16 = 5;
const TAG_ISR: u16 = 6;
const TAG_IMR: u16 = 7;
const TAG_CURR: u16 = 8;
const TAG_CURW: u16 = 9;
const TAG_RV: u16 = 10;
const TAG_WV: u16 = 11;
const TAG_PHYS: u16 = 12;
const TAG_MULT: u16 = 13;
const TAG_RXCR: u16 = 14;

const V1_0_TAGS: &[u16] = &[
    TAG_CMD, TAG_TSR, TAG_TCNT, TAG_RCNT, TAG_RSR, TAG_ISR, TAG_IMR, TAG_CURR, TAG_CURW, TAG_RV,
    TAG_WV, TAG_PHYS, TAG_MULT,
];

const V1_1_TAGS: &[u16] = &[
    TAG_CMD, TAG_TSR, TAG_TCNT, TAG_RCNT, TAG_RSR, TAG_ISR, TAG_IMR, TAG_CURR, TAG_CURW, TAG_RV,
    TAG_WV, TAG_PHYS, TAG_MULT, TAG_RXCR,
];

/// Guest-visible register file of the ETH194 NIC.
///
/// Descriptor rings are guest RAM and are captured by the memory snapshot, not here. Host wiring
/// (IRQ sink, backend) and the derived IRQ level are not part of the state either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eth194DeviceState {
    pub cmd: u8,
    pub tsr: u8,
    pub tcnt: u16,
    pub rcnt: u16,
    pub rsr: u8,
    pub isr: u8,
    pub imr: u8,
    pub rxcr: u8,

    /// Head of the transmit (read) ring; `0` when empty.
    pub curr: u32,
    /// Head of the receive (write) ring; `0` when the guest has posted no buffers.
    pub curw: u32,
    pub rv: u8,
    pub wv: u8,

    pub phys: [u8; 6],
    pub mult: [u8; 8],
}

impl Default for Eth194DeviceState {
    fn default() -> Self {
        Self {
            cmd: 0,
            tsr: 0,
            tcnt: 0,
            rcnt: 0,
            rsr: 0,
            isr: 0,
            imr: 0,
            rxcr: 0,
            curr: 0,
            curw: 0,
            rv: 0,
            wv: 0,
            phys: [0; 6],
            mult: [0; 8],
        }
    }
}

impl IoSnapshot for Eth194DeviceState {
    const DEVICE_ID: [u8; 4] = *b"E194";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, ETH194_RXCR_SINCE_MINOR);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        w.field_u8(TAG_CMD, self.cmd);
        w.field_u8(TAG_TSR, self.tsr);
        w.field_u16(TAG_TCNT, self.tcnt);
        w.field_u16(TAG_RCNT, self.rcnt);
        w.field_u8(TAG_RSR, self.rsr);
        w.field_u8(TAG_ISR, self.isr);
        w.field_u8(TAG_IMR, self.imr);
        w.field_u32(TAG_CURR, self.curr);
        w.field_u32(TAG_CURW, self.curw);
        w.field_u8(TAG_RV, self.rv);
        w.field_u8(TAG_WV, self.wv);
        w.field_bytes(TAG_PHYS, self.phys.to_vec());
        w.field_bytes(TAG_MULT, self.mult.to_vec());
        w.field_u8(TAG_RXCR, self.rxcr);
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        let minor = r.device_version().minor;
        if minor > Self::DEVICE_VERSION.minor {
            return Err(SnapshotError::UnsupportedDeviceMinorVersion {
                found: minor,
                supported: Self::DEVICE_VERSION.minor,
            });
        }
        let has_rxcr = minor >= ETH194_RXCR_SINCE_MINOR;
        r.ensure_known_tags(if has_rxcr { V1_1_TAGS } else { V1_0_TAGS })?;

        let mut state = Self::default();
        state.cmd = r.u8(TAG_CMD)?.unwrap_or(0);
        state.tsr = r.u8(TAG_TSR)?.unwrap_or(0);
        state.tcnt = r.u16(TAG_TCNT)?.unwrap_or(0);
        state.rcnt = r.u16(TAG_RCNT)?.unwrap_or(0);
        state.rsr = r.u8(TAG_RSR)?.unwrap_or(0);
        state.isr = r.u8(TAG_ISR)?.unwrap_or(0);
        state.imr = r.u8(TAG_IMR)?.unwrap_or(0);
        state.curr = r.u32(TAG_CURR)?.unwrap_or(0);
        state.curw = r.u32(TAG_CURW)?.unwrap_or(0);
        state.rv = r.u8(TAG_RV)?.unwrap_or(0);
        state.wv = r.u8(TAG_WV)?.unwrap_or(0);

        if let Some(phys) = r.bytes(TAG_PHYS) {
            state.phys = phys
                .try_into()
                .map_err(|_| SnapshotError::InvalidFieldEncoding("phys"))?;
        }
        if let Some(mult) = r.bytes(TAG_MULT) {
            state.mult = mult
                .try_into()
                .map_err(|_| SnapshotError::InvalidFieldEncoding("mult"))?;
        }

        state.rxcr = if has_rxcr {
            r.u8(TAG_RXCR)?.unwrap_or(RXCR_LEGACY_DEFAULT)
        } else {
            RXCR_LEGACY_DEFAULT
        };

        *self = state;
        Ok(())
    }
}

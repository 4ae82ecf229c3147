/// A device decoding a window of x86 I/O ports.
///
/// `port` is always the absolute port number; devices subtract their own base.
pub trait PortIoDevice {
    fn read(&mut self, port: u16, size: u8) -> u32;
    fn write(&mut self, port: u16, size: u8, value: u32);

    /// Reset the device back to its power-on state.
    fn reset(&mut self) {}
}

struct RangeDevice {
    start: u16,
    len: u16,
    dev: Box<dyn PortIoDevice + Send>,
}

impl RangeDevice {
    fn end_exclusive(&self) -> u32 {
        u32::from(self.start) + u32::from(self.len)
    }

    fn contains(&self, port: u16) -> bool {
        let p = u32::from(port);
        p >= u32::from(self.start) && p < self.end_exclusive()
    }
}

/// Port I/O dispatcher for range-mapped devices (PCI I/O BARs, legacy ISA windows).
#[derive(Default)]
pub struct IoPortBus {
    ranges: Vec<RangeDevice>,
}

impl IoPortBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single device over a contiguous I/O port range.
    ///
    /// Panics if the range is empty, wraps past `0xFFFF`, or overlaps an existing mapping: those
    /// are host wiring bugs, not guest behavior.
    pub fn register_range(&mut self, start: u16, len: u16, dev: Box<dyn PortIoDevice + Send>) {
        assert!(len != 0, "I/O port range length must be non-zero");

        let end_exclusive = u32::from(start) + u32::from(len);
        assert!(
            end_exclusive <= 0x1_0000,
            "I/O port range wraps past 0xFFFF: start={start:#x} len={len:#x}"
        );

        let idx = self.ranges.partition_point(|r| r.start < start);
        if let Some(prev) = idx.checked_sub(1).and_then(|i| self.ranges.get(i)) {
            assert!(
                u32::from(start) >= prev.end_exclusive(),
                "overlapping I/O port ranges: new=[{start:#x}..{end_exclusive:#x}) prev=[{:#x}..{:#x})",
                prev.start,
                prev.end_exclusive()
            );
        }
        if let Some(next) = self.ranges.get(idx) {
            assert!(
                end_exclusive <= u32::from(next.start),
                "overlapping I/O port ranges: new=[{start:#x}..{end_exclusive:#x}) next=[{:#x}..{:#x})",
                next.start,
                next.end_exclusive()
            );
        }

        tracing::debug!(start, len, "registered I/O port range");
        self.ranges.insert(idx, RangeDevice { start, len, dev });
    }

    fn find_range_mut(&mut self, port: u16) -> Option<&mut RangeDevice> {
        let idx = self.ranges.partition_point(|r| r.start <= port);
        self.ranges
            .get_mut(idx.checked_sub(1)?)
            .filter(|r| r.contains(port))
    }

    pub fn read(&mut self, port: u16, size: u8) -> u32 {
        if size == 0 {
            return 0;
        }
        // Port I/O only supports access sizes {1,2,4}; anything else floats the bus high.
        if !matches!(size, 1 | 2 | 4) {
            return 0xFFFF_FFFF;
        }
        if let Some(range) = self.find_range_mut(port) {
            return range.dev.read(port, size);
        }

        match size {
            1 => 0xFF,
            2 => 0xFFFF,
            _ => 0xFFFF_FFFF,
        }
    }

    pub fn write(&mut self, port: u16, size: u8, value: u32) {
        if !matches!(size, 1 | 2 | 4) {
            return;
        }
        if let Some(range) = self.find_range_mut(port) {
            range.dev.write(port, size, value);
        }
    }

    pub fn read_u8(&mut self, port: u16) -> u8 {
        self.read(port, 1) as u8
    }

    pub fn write_u8(&mut self, port: u16, value: u8) {
        self.write(port, 1, u32::from(value));
    }

    pub fn reset(&mut self) {
        for range in self.ranges.iter_mut() {
            range.dev.reset();
        }
    }
}

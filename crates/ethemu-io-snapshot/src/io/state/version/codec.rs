//! Little-endian cursor used to parse snapshot framing.

use super::{SnapshotError, SnapshotResult};

/// Cursor over a little-endian payload.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn bytes(&mut self, len: usize) -> SnapshotResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(SnapshotError::UnexpectedEof);
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> SnapshotResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> SnapshotResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> SnapshotResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> SnapshotResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Fails if any bytes are left unconsumed.
    pub fn finish(self) -> SnapshotResult<()> {
        if !self.is_empty() {
            return Err(SnapshotError::InvalidFieldEncoding("trailing bytes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_reads_little_endian_fields() {
        let buf = [1, 0x03, 0x02, 0x07, 0x06, 0x05, 0x04, b'x', b'y'];
        let mut d = Decoder::new(&buf);
        assert_eq!(d.u8().unwrap(), 1);
        assert_eq!(d.u16().unwrap(), 0x0203);
        assert_eq!(d.u32().unwrap(), 0x0405_0607);
        assert_eq!(d.bytes(2).unwrap(), b"xy");
        d.finish().unwrap();
    }

    #[test]
    fn decoder_reports_truncation_and_trailing_bytes() {
        let mut d = Decoder::new(&[1, 2, 3]);
        assert_eq!(d.u32(), Err(SnapshotError::UnexpectedEof));
        assert_eq!(d.u8(), Ok(1));
        assert_eq!(
            d.finish(),
            Err(SnapshotError::InvalidFieldEncoding("trailing bytes"))
        );
    }
}

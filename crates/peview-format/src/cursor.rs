//! Positioned little-endian reader over a byte source.

use crate::PeError;

/// Random-access cursor over a byte slice.
///
/// All integer reads are little-endian and advance the position. Reads past
/// the end of the source fail with [`PeError::UnexpectedEof`]; they never
/// zero-fill. The position may be set beyond the end, in which case the next
/// read fails.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Moves to an absolute position.
    pub fn set_pos(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Total length of the underlying source.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reads `count` raw bytes, advancing the position.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], PeError> {
        let eof = PeError::UnexpectedEof { offset: self.pos, needed: count };
        let start = usize::try_from(self.pos).map_err(|_| eof)?;
        let end = match start.checked_add(count) {
            Some(end) if end <= self.data.len() => end,
            _ => return Err(PeError::UnexpectedEof { offset: self.pos, needed: count }),
        };
        self.pos += count as u64;
        Ok(&self.data[start..end])
    }

    pub fn read_u8(&mut self) -> Result<u8, PeError> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, PeError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, PeError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, PeError> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Reads an unsigned integer of the given bit width.
    ///
    /// Widths outside {8, 16, 32, 64} are a programming error, not a format
    /// error, and panic.
    pub fn read_uint(&mut self, bits: u32) -> Result<u64, PeError> {
        match bits {
            8 => self.read_u8().map(u64::from),
            16 => self.read_u16().map(u64::from),
            32 => self.read_u32().map(u64::from),
            64 => self.read_u64(),
            other => panic!("unsupported integer width: {other} bits"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut cur = ByteCursor::new(&data);
        assert_eq!(cur.read_u16().unwrap(), 0x0201);
        assert_eq!(cur.read_u32().unwrap(), 0x06050403);
        assert_eq!(cur.pos(), 6);
    }

    #[test]
    fn read_uint_matches_typed_reads() {
        let data = [0xEF, 0xBE, 0xAD, 0xDE, 0x11, 0x22, 0x33, 0x44];
        let mut cur = ByteCursor::new(&data);
        assert_eq!(cur.read_uint(32).unwrap(), 0xDEADBEEF);
        assert_eq!(cur.read_uint(16).unwrap(), 0x2211);
        assert_eq!(cur.read_uint(8).unwrap(), 0x33);
    }

    #[test]
    fn exhaustion_is_a_distinct_error() {
        let mut cur = ByteCursor::new(&[0xAA, 0xBB]);
        cur.set_pos(1);
        let err = cur.read_u32().unwrap_err();
        assert!(matches!(err, PeError::UnexpectedEof { offset: 1, needed: 4 }));
        // position unchanged after a failed read
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn seek_past_end_fails_on_next_read() {
        let mut cur = ByteCursor::new(&[0u8; 4]);
        cur.set_pos(100);
        assert!(matches!(cur.read_u8(), Err(PeError::UnexpectedEof { .. })));
    }

    #[test]
    #[should_panic(expected = "unsupported integer width")]
    fn bad_width_panics() {
        let mut cur = ByteCursor::new(&[0u8; 8]);
        let _ = cur.read_uint(24);
    }
}

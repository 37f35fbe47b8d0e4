//! Base byte-buffer abstraction for ELF object file structures
//!
//! Every structure in an ELF object is read through a [ByteCursor]: an
//! endian-aware, position-tracked reader over an immutable byte slice. The
//! cursor's default byte order is chosen at runtime by the file's own data
//! encoding byte, and its alignment may be raised while decoding a section
//! whose entries are stride-aligned.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Byte order for multi-byte reads
pub enum Endianness {
    #[default]
    /// Least-significant byte first
    Little,
    /// Most-significant byte first
    Big,
}

/// Round `position` up to the next multiple of `alignment`
///
/// `alignment` must be a power of two.
const fn align_up(position: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        position
    } else {
        (position + (alignment - 1)) & !(alignment - 1)
    }
}

#[derive(Debug, Clone)]
/// An endian-aware, position-tracked, optionally aligning reader over an
/// immutable byte slice
///
/// After a read of `k` bytes the position advances by at least `k`; when an
/// alignment greater than one is set, the position is then rounded up to the
/// next multiple of it. Reading past the end of the slice fails with
/// [Error::UnexpectedEnd] and no partial reads are observable.
pub struct ByteCursor<'data> {
    /// The bytes the cursor reads from
    bytes: &'data [u8],
    /// The current read position
    position: u64,
    /// The default byte order used by [ByteCursor::read_u16] and friends
    endianness: Endianness,
    /// The current alignment. Always at least 1 and a power of two.
    alignment: u64,
}

impl<'data> ByteCursor<'data> {
    /// Construct a cursor over `bytes` with position zero and alignment one
    pub fn new(bytes: &'data [u8], endianness: Endianness) -> Self {
        Self {
            bytes,
            position: 0,
            endianness,
            alignment: 1,
        }
    }

    /// The total number of bytes the cursor reads over
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the underlying slice is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The current read position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Re-seat the cursor at `position`
    ///
    /// No alignment rounding is performed. A position beyond the end of the
    /// slice is permitted; the next read will fail.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// The number of bytes between the current position and the end
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position)
    }

    /// The default byte order
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Change the default byte order
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// The current alignment
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Change the alignment
    ///
    /// `alignment` must be zero or a power of two; zero is normalized to one.
    pub fn set_alignment(&mut self, alignment: u64) -> Result<()> {
        if alignment != 0 && !alignment.is_power_of_two() {
            return Err(Error::BadAlignment { value: alignment });
        }
        self.alignment = alignment.max(1);
        Ok(())
    }

    /// Run `operation` with `alignment` applied, restoring the previous
    /// alignment on every exit path
    pub fn with_alignment<T>(
        &mut self,
        alignment: u64,
        operation: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = self.alignment;
        self.set_alignment(alignment)?;
        let result = operation(self);
        self.alignment = previous;
        result
    }

    /// Borrow `count` bytes at the current position, advancing past them
    fn take(&mut self, count: u64) -> Result<&'data [u8]> {
        let start = self.position;
        let end = start.checked_add(count).ok_or(Error::UnexpectedEnd {
            offset: start,
            wanted: count,
            available: self.remaining(),
        })?;
        if end > self.len() {
            return Err(Error::UnexpectedEnd {
                offset: start,
                wanted: count,
                available: self.remaining(),
            });
        }
        self.position = align_up(end, self.alignment);
        Ok(&self.bytes[start as usize..end as usize])
    }

    /// Read a single byte, advancing by `max(1, alignment)`
    pub fn read_u8(&mut self) -> Result<u8> {
        let start = self.position;
        if start >= self.len() {
            return Err(Error::UnexpectedEnd {
                offset: start,
                wanted: 1,
                available: 0,
            });
        }
        self.position = start + self.alignment.max(1);
        Ok(self.bytes[start as usize])
    }

    /// Borrow `count` raw bytes, advancing and aligning as a `count`-byte read
    pub fn read_bytes(&mut self, count: u64) -> Result<&'data [u8]> {
        self.take(count)
    }

    /// Read a 16-bit integer in the default byte order
    pub fn read_u16(&mut self) -> Result<u16> {
        match self.endianness {
            Endianness::Little => self.read_u16_le(),
            Endianness::Big => self.read_u16_be(),
        }
    }

    /// Read a 32-bit integer in the default byte order
    pub fn read_u32(&mut self) -> Result<u32> {
        match self.endianness {
            Endianness::Little => self.read_u32_le(),
            Endianness::Big => self.read_u32_be(),
        }
    }

    /// Read a 64-bit integer in the default byte order
    pub fn read_u64(&mut self) -> Result<u64> {
        match self.endianness {
            Endianness::Little => self.read_u64_le(),
            Endianness::Big => self.read_u64_be(),
        }
    }

    /// Read a 16-bit little-endian integer regardless of the default order
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a 16-bit big-endian integer regardless of the default order
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a 32-bit little-endian integer regardless of the default order
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.take(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 32-bit big-endian integer regardless of the default order
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.take(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 64-bit little-endian integer regardless of the default order
    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.take(8)
            .map(|b| u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Read a 64-bit big-endian integer regardless of the default order
    pub fn read_u64_be(&mut self) -> Result<u64> {
        self.take(8)
            .map(|b| u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Read a NUL-terminated ASCII string starting at the current position
    ///
    /// The position advances past the terminating NUL. Bytes outside the
    /// printable ASCII range are passed through unmodified.
    pub fn read_cstr(&mut self) -> Result<String> {
        let start = self.position as usize;
        if start >= self.bytes.len() {
            return Err(Error::UnexpectedEnd {
                offset: self.position,
                wanted: 1,
                available: 0,
            });
        }
        let tail = &self.bytes[start..];
        let Some(nul) = tail.iter().position(|&b| b == 0) else {
            return Err(Error::UnexpectedEnd {
                offset: self.position,
                wanted: tail.len() as u64 + 1,
                available: tail.len() as u64,
            });
        };
        let text = tail[..nul].iter().map(|&b| b as char).collect();
        self.position = align_up(self.position + nul as u64 + 1, self.alignment);
        Ok(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use paste::paste;

    macro_rules! read_test {
        ($name:ident, $method:ident, $bytes:expr, $expected:expr) => {
            paste! {
                #[test]
                fn [<test_ $name>]() {
                    let bytes = $bytes;
                    let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
                    assert_eq!(cursor.$method().unwrap(), $expected);
                    assert_eq!(cursor.position(), bytes.len() as u64);
                }
            }
        };
    }

    read_test!(u16_le, read_u16_le, [0x34, 0x12], 0x1234);
    read_test!(u16_be, read_u16_be, [0x34, 0x12], 0x3412);
    read_test!(u32_le, read_u32_le, [0x78, 0x56, 0x34, 0x12], 0x12345678);
    read_test!(u32_be, read_u32_be, [0x78, 0x56, 0x34, 0x12], 0x78563412);
    read_test!(
        u64_le,
        read_u64_le,
        [0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01],
        0x0123456789ABCDEF
    );
    read_test!(
        u64_be,
        read_u64_be,
        [0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01],
        0xEFCDAB8967452301
    );

    #[test]
    fn test_default_endianness() {
        let bytes = [0x78, 0x56, 0x34, 0x12];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        assert_eq!(cursor.read_u32().unwrap(), 0x12345678);
        cursor.set_position(0);
        cursor.set_endianness(Endianness::Big);
        assert_eq!(cursor.read_u32().unwrap(), 0x78563412);
    }

    #[test]
    fn test_alignment_rounds_after_read() {
        let bytes = [0u8; 32];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        cursor.set_alignment(8).unwrap();
        cursor.read_u32().unwrap();
        assert_eq!(cursor.position(), 8);
        cursor.read_u16().unwrap();
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_read_u8_advances_by_alignment() {
        let bytes = [0u8; 16];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        cursor.set_alignment(4).unwrap();
        cursor.read_u8().unwrap();
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_zero_alignment_normalized() {
        let bytes = [0u8; 4];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        cursor.set_alignment(0).unwrap();
        assert_eq!(cursor.alignment(), 1);
    }

    #[test]
    fn test_non_power_of_two_alignment_rejected() {
        let bytes = [0u8; 4];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        assert_eq!(
            cursor.set_alignment(3),
            Err(Error::BadAlignment { value: 3 })
        );
    }

    #[test]
    fn test_with_alignment_restores_on_error() {
        let bytes = [0u8; 4];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        let result = cursor.with_alignment(8, |c| c.read_u64());
        assert!(matches!(result, Err(Error::UnexpectedEnd { .. })));
        assert_eq!(cursor.alignment(), 1);
    }

    #[test]
    fn test_read_past_end() {
        let bytes = [0u8; 3];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        assert_eq!(
            cursor.read_u32(),
            Err(Error::UnexpectedEnd {
                offset: 0,
                wanted: 4,
                available: 3,
            })
        );
        // No partial read is visible
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_seek_past_end_then_read() {
        let bytes = [0u8; 4];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        cursor.set_position(100);
        assert!(matches!(
            cursor.read_u8(),
            Err(Error::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_read_cstr() {
        let bytes = b"interp\0trailing";
        let mut cursor = ByteCursor::new(bytes, Endianness::Little);
        assert_eq!(cursor.read_cstr().unwrap(), "interp");
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_read_cstr_unterminated() {
        let bytes = b"abc";
        let mut cursor = ByteCursor::new(bytes, Endianness::Little);
        assert!(matches!(
            cursor.read_cstr(),
            Err(Error::UnexpectedEnd { .. })
        ));
    }
}

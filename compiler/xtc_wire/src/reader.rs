//! Big-endian cursor over a module file.

use xtc_ir::{Access, Span};

use crate::packed::{MAX_BYTES, MIN_HUGE_BYTES};
use crate::{PackedInt, WireError, WireErrorKind};

/// Cursor over the bytes of one module file.
///
/// Positions are absolute offsets into the file.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Reposition the cursor to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> Result<(), WireError> {
        if pos > self.bytes.len() {
            return Err(WireError::new(WireErrorKind::BadOffset(pos), self.pos));
        }
        self.pos = pos;
        Ok(())
    }

    /// Span from `start` to the current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::from_range_saturating(start..self.pos)
    }

    #[cold]
    fn error(&self, kind: WireErrorKind) -> WireError {
        WireError::new(kind, self.pos)
    }

    /// Consume exactly `n` bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if n > self.remaining() {
            return Err(self.error(WireErrorKind::Truncated {
                needed: n,
                remaining: self.remaining(),
            }));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.bytes(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8, WireError> {
        Ok(i8::from_be_bytes([self.u8()?]))
    }

    pub fn u16(&mut self) -> Result<u16, WireError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, WireError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn bool(&mut self) -> Result<bool, WireError> {
        let start = self.pos;
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(WireError::new(WireErrorKind::InvalidBool(b), start)),
        }
    }

    pub fn access(&mut self) -> Result<Access, WireError> {
        let start = self.pos;
        let b = self.u8()?;
        Access::from_tag(b).ok_or(WireError::new(WireErrorKind::InvalidAccess(b), start))
    }

    /// Read a packed integer of any width.
    pub fn packed(&mut self) -> Result<PackedInt, WireError> {
        let start = self.pos;
        let b = self.u8()?;

        // small: anything but 10xxxxxx
        if b & 0xC0 != 0x80 {
            return Ok(PackedInt::Small(i64::from(i8::from_be_bytes([b]))));
        }

        // medium: 100xxxxx xxxxxxxx
        if b & 0x20 == 0 {
            let high = i64::from(i8::from_be_bytes([b << 3]) >> 3);
            let low = i64::from(self.u8()?);
            return Ok(PackedInt::Small((high << 8) | low));
        }

        // large: 101nnnnn with n+1 trailing bytes; n == 0 marks huge
        let mut len = usize::from(b & 0x1F) + 1;
        if len == 1 {
            let declared = self.packed_i64()?;
            len = usize::try_from(declared)
                .ok()
                .filter(|n| (MIN_HUGE_BYTES..=MAX_BYTES).contains(n))
                .ok_or(WireError::new(WireErrorKind::HugeIntLength(declared), start))?;
        }
        Ok(PackedInt::from_be_bytes(self.bytes(len)?))
    }

    /// Read a packed integer that must fit in 64 bits.
    pub fn packed_i64(&mut self) -> Result<i64, WireError> {
        let start = self.pos;
        self.packed()?
            .as_i64()
            .ok_or(WireError::new(WireErrorKind::Overlong, start))
    }

    /// Read a non-negative packed count or length.
    pub fn magnitude(&mut self) -> Result<usize, WireError> {
        let start = self.pos;
        let n = self.packed_i64()?;
        usize::try_from(n).map_err(|_| WireError::new(WireErrorKind::BadLength(n), start))
    }

    /// Read a count of items that each take at least one byte.
    ///
    /// Rejects counts larger than the rest of the file before anything is
    /// allocated for them.
    pub fn count(&mut self) -> Result<usize, WireError> {
        let start = self.pos;
        let n = self.magnitude()?;
        if n > self.remaining() {
            return Err(WireError::new(
                WireErrorKind::Truncated {
                    needed: n,
                    remaining: self.remaining(),
                },
                start,
            ));
        }
        Ok(n)
    }

    /// Read a constant index; `-1` is "none".
    pub fn index(&mut self) -> Result<Option<u32>, WireError> {
        let start = self.pos;
        match self.packed_i64()? {
            -1 => Ok(None),
            n => u32::try_from(n)
                .map(Some)
                .map_err(|_| WireError::new(WireErrorKind::BadIndex(n), start)),
        }
    }

    /// Read a constant index that must be present.
    pub fn required_index(&mut self) -> Result<u32, WireError> {
        let start = self.pos;
        self.index()?
            .ok_or(WireError::new(WireErrorKind::MissingReference, start))
    }

    /// Read a count followed by that many required indices.
    pub fn indices(&mut self) -> Result<Vec<u32>, WireError> {
        let n = self.count()?;
        (0..n).map(|_| self.required_index()).collect()
    }

    /// Read a length-prefixed byte array.
    pub fn byte_array(&mut self) -> Result<&'a [u8], WireError> {
        let n = self.count()?;
        self.bytes(n)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn utf8(&mut self) -> Result<String, WireError> {
        let start = self.pos;
        let bytes = self.byte_array()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::new(WireErrorKind::InvalidUtf8, start))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

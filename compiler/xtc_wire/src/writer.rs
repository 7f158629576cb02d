//! Big-endian output buffer, the inverse of [`Reader`](crate::Reader).

use xtc_ir::Access;

use crate::packed::MIN_HUGE_BYTES;
use crate::PackedInt;

#[derive(Clone, Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn i8(&mut self, value: i8) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.u8(u8::from(value))
    }

    pub fn access(&mut self, access: Access) -> &mut Self {
        self.u8(access.tag())
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Write a 64-bit value in its shortest packed form.
    pub fn packed_i64(&mut self, value: i64) -> &mut Self {
        if (-64..=127).contains(&value) {
            return self.bytes(&value.to_be_bytes()[7..]);
        }

        let bits = 65 - value.max(!value).leading_zeros();
        if bits <= 13 {
            // 100xxxxx marker followed by the low 13 bits
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "only the low 13 bits are kept"
            )]
            let low = value as u16 & 0x1FFF;
            return self.u16(0x8000 | low);
        }

        let len = bits.div_ceil(8) as usize;
        #[expect(clippy::cast_possible_truncation, reason = "len is 2..=8")]
        let marker = 0xA0 | (len - 1) as u8;
        self.u8(marker);
        self.bytes(&value.to_be_bytes()[8 - len..])
    }

    pub fn packed(&mut self, value: &PackedInt) -> &mut Self {
        match value {
            PackedInt::Small(v) => self.packed_i64(*v),
            PackedInt::Big(bytes) => {
                if bytes.len() < MIN_HUGE_BYTES {
                    #[expect(clippy::cast_possible_truncation, reason = "len is 9..=32")]
                    let marker = 0xA0 | (bytes.len() - 1) as u8;
                    self.u8(marker);
                } else {
                    self.u8(0xA0);
                    self.magnitude(bytes.len());
                }
                self.bytes(bytes)
            }
        }
    }

    pub fn magnitude(&mut self, value: usize) -> &mut Self {
        self.packed_i64(i64::try_from(value).unwrap_or(i64::MAX))
    }

    pub fn index(&mut self, index: Option<u32>) -> &mut Self {
        self.packed_i64(index.map_or(-1, i64::from))
    }

    pub fn required_index(&mut self, index: u32) -> &mut Self {
        self.packed_i64(i64::from(index))
    }

    pub fn indices(&mut self, indices: &[u32]) -> &mut Self {
        self.magnitude(indices.len());
        for &index in indices {
            self.required_index(index);
        }
        self
    }

    pub fn byte_array(&mut self, bytes: &[u8]) -> &mut Self {
        self.magnitude(bytes.len());
        self.bytes(bytes)
    }

    pub fn utf8(&mut self, text: &str) -> &mut Self {
        self.byte_array(text.as_bytes())
    }
}

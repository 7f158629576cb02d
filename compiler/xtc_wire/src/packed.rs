//! Integer values of the packed ("XIP") encoding.
//!
//! Wire forms, by first byte:
//! - small `xxxxxxxx` (not `10xxxxxx`): the byte itself, sign-extended (-64..=127)
//! - medium `100xxxxx`: 13-bit signed value, 5 bits here plus one more byte
//! - large `101nnnnn`, n > 0: n+1 (2..=32) big-endian two's complement bytes follow
//! - huge `10100000`: a packed byte count (33..=8192) follows, then the bytes
//!
//! Values that fit in 64 bits are held as [`PackedInt::Small`]; wider ones
//! keep their minimal two's complement bytes.

use std::fmt;

/// Largest byte count of the huge form.
pub(crate) const MAX_BYTES: usize = 8192;

/// Smallest byte count that must use the huge form.
pub(crate) const MIN_HUGE_BYTES: usize = 33;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PackedInt {
    Small(i64),
    /// Minimal big-endian two's complement, longer than 8 bytes.
    Big(Box<[u8]>),
}

/// Strip redundant leading sign bytes.
fn minimal(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (byte, next) = (bytes[start], bytes[start + 1]);
        let redundant =
            (byte == 0x00 && next & 0x80 == 0) || (byte == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

fn sign_extend(bytes: &[u8]) -> i128 {
    let init: i128 = if bytes.first().is_some_and(|b| b & 0x80 != 0) {
        -1
    } else {
        0
    };
    bytes
        .iter()
        .fold(init, |acc, &b| (acc << 8) | i128::from(b))
}

impl PackedInt {
    pub const ZERO: PackedInt = PackedInt::Small(0);

    /// Build from big-endian two's complement bytes of any length.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let bytes = minimal(bytes);
        if bytes.len() <= 8 {
            #[expect(clippy::cast_possible_truncation, reason = "at most 8 bytes")]
            let value = sign_extend(bytes) as i64;
            PackedInt::Small(value)
        } else {
            PackedInt::Big(bytes.into())
        }
    }

    /// Minimal big-endian two's complement bytes.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        match self {
            PackedInt::Small(v) => minimal(&v.to_be_bytes()).to_vec(),
            PackedInt::Big(bytes) => bytes.to_vec(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PackedInt::Small(v) => Some(*v),
            PackedInt::Big(_) => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            PackedInt::Small(v) => Some(i128::from(*v)),
            PackedInt::Big(bytes) if bytes.len() <= 16 => Some(sign_extend(bytes)),
            PackedInt::Big(_) => None,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            PackedInt::Small(v) => *v < 0,
            PackedInt::Big(bytes) => bytes[0] & 0x80 != 0,
        }
    }

    /// Bits of the minimal two's complement form, sign bit included.
    pub fn signed_bits(&self) -> u32 {
        match self {
            PackedInt::Small(v) => 65 - (*v).max(!*v).leading_zeros(),
            PackedInt::Big(bytes) => {
                let first = bytes[0];
                let lead = if first & 0x80 != 0 {
                    (!first).leading_zeros()
                } else {
                    first.leading_zeros()
                };
                let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX / 8);
                8 * len - lead + 1
            }
        }
    }

    /// Whether the value is representable as a signed integer of `bits` bits.
    pub fn fits_signed(&self, bits: u32) -> bool {
        self.signed_bits() <= bits
    }

    /// Whether the value is representable as an unsigned integer of `bits` bits.
    pub fn fits_unsigned(&self, bits: u32) -> bool {
        !self.is_negative() && self.signed_bits() <= bits + 1
    }
}

impl From<i64> for PackedInt {
    fn from(value: i64) -> Self {
        PackedInt::Small(value)
    }
}

impl From<i128> for PackedInt {
    fn from(value: i128) -> Self {
        PackedInt::from_be_bytes(&value.to_be_bytes())
    }
}

impl From<u128> for PackedInt {
    fn from(value: u128) -> Self {
        let mut bytes = Vec::with_capacity(17);
        bytes.push(0);
        bytes.extend_from_slice(&value.to_be_bytes());
        PackedInt::from_be_bytes(&bytes)
    }
}

impl fmt::Display for PackedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.as_i128() {
            return write!(f, "{v}");
        }
        f.write_str("0x")?;
        for byte in self.to_be_bytes() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

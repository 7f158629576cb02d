//! Decode errors with the file offset where they were detected.

use std::fmt;

use xtc_diagnostic::{Diagnostic, ErrorCode};
use xtc_ir::{ConstFormat, Span};

use crate::PackedInt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireErrorKind {
    /// Stream ended inside a value.
    Truncated { needed: usize, remaining: usize },
    /// Tag byte beyond the format table.
    UnknownFormat(u8),
    /// Known format without a payload layout.
    Unsupported(ConstFormat),
    /// Integer literal does not fit its declared width.
    IntOutOfRange { format: ConstFormat, value: PackedInt },
    /// Packed integer where a 64-bit value was required.
    Overlong,
    /// Huge-form byte count outside 33..=8192.
    HugeIntLength(i64),
    /// Negative or oversized count or length.
    BadLength(i64),
    /// Index below -1 or beyond 32 bits.
    BadIndex(i64),
    /// `-1` where a reference is required.
    MissingReference,
    InvalidUtf8,
    InvalidChar(i64),
    InvalidBool(u8),
    InvalidAccess(u8),
    /// Seek outside the buffer.
    BadOffset(usize),
}

/// Decode failure at a file offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireError {
    pub kind: WireErrorKind,
    pub offset: usize,
}

impl WireError {
    #[cold]
    pub fn new(kind: WireErrorKind, offset: usize) -> Self {
        WireError { kind, offset }
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            WireErrorKind::Truncated { .. } => ErrorCode::E0003,
            WireErrorKind::UnknownFormat(_) => ErrorCode::E0005,
            WireErrorKind::Unsupported(_) => ErrorCode::E4001,
            WireErrorKind::IntOutOfRange { .. } => ErrorCode::E1001,
            WireErrorKind::Overlong
            | WireErrorKind::HugeIntLength(_)
            | WireErrorKind::BadLength(_)
            | WireErrorKind::BadIndex(_)
            | WireErrorKind::MissingReference
            | WireErrorKind::InvalidUtf8
            | WireErrorKind::InvalidChar(_)
            | WireErrorKind::InvalidBool(_)
            | WireErrorKind::InvalidAccess(_)
            | WireErrorKind::BadOffset(_) => ErrorCode::E0004,
        }
    }

    pub fn span(&self) -> Span {
        Span::from_range_saturating(self.offset..self.offset + 1)
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let label = match &self.kind {
            WireErrorKind::Truncated { .. } => "stream ends here",
            WireErrorKind::UnknownFormat(_) | WireErrorKind::Unsupported(_) => "record tag",
            _ => "while decoding this value",
        };
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(self.span(), label)
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WireErrorKind::Truncated { needed, remaining } => write!(
                f,
                "truncated stream: needed {needed} byte(s), {remaining} remaining"
            ),
            WireErrorKind::UnknownFormat(tag) => {
                write!(f, "unsupported constant format: tag {tag} (0x{tag:02X})")
            }
            WireErrorKind::Unsupported(format) => {
                write!(f, "unsupported construct: {format} records are not supported")
            }
            WireErrorKind::IntOutOfRange { format, value } => {
                write!(f, "value {value} exceeds the range of {format}")
            }
            WireErrorKind::Overlong => write!(f, "packed integer exceeds 64 bits"),
            WireErrorKind::HugeIntLength(len) => {
                write!(f, "huge integer size of {len} bytes; must be 33..=8192")
            }
            WireErrorKind::BadLength(len) => write!(f, "invalid length or count {len}"),
            WireErrorKind::BadIndex(index) => write!(f, "invalid constant index {index}"),
            WireErrorKind::MissingReference => write!(f, "required constant reference is missing"),
            WireErrorKind::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            WireErrorKind::InvalidChar(cp) => write!(f, "invalid character code point {cp:#X}"),
            WireErrorKind::InvalidBool(b) => write!(f, "invalid boolean byte {b:#04X}"),
            WireErrorKind::InvalidAccess(b) => write!(f, "invalid access byte {b}"),
            WireErrorKind::BadOffset(offset) => write!(f, "offset {offset} is outside the file"),
        }
    }
}

impl std::error::Error for WireError {}

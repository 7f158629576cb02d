use std::fmt;

use xtc_diagnostic::{Diagnostic, ErrorCode};
use xtc_ir::{ConstFormat, InternError, Span};
use xtc_wire::WireError;

use crate::VersionError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// A record could not be decoded.
    Wire(WireError),
    /// Reference beyond the pool. `span` is the referencing entry, if any.
    IndexOutOfRange {
        index: i64,
        len: usize,
        span: Option<Span>,
    },
    /// Reference to a record of the wrong kind.
    WrongKind {
        index: u32,
        expected: &'static str,
        found: ConstFormat,
        span: Span,
    },
    BadVersion {
        text: String,
        reason: VersionError,
        span: Span,
    },
    Intern(InternError),
    /// Access to resolved entries before [`Pool::resolve`](crate::Pool::resolve).
    Unresolved,
}

impl PoolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PoolError::Wire(err) => err.code(),
            PoolError::IndexOutOfRange { .. } => ErrorCode::E1002,
            PoolError::WrongKind { .. } | PoolError::BadVersion { .. } => ErrorCode::E0004,
            PoolError::Intern(_) | PoolError::Unresolved => ErrorCode::E9001,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            PoolError::Wire(err) => Some(err.span()),
            PoolError::IndexOutOfRange { span, .. } => *span,
            PoolError::WrongKind { span, .. } | PoolError::BadVersion { span, .. } => Some(*span),
            PoolError::Intern(_) | PoolError::Unresolved => None,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        if let PoolError::Wire(err) = self {
            return err.into_diagnostic();
        }
        let mut diag = Diagnostic::error(self.code()).with_message(self.to_string());
        if let Some(span) = self.span() {
            diag = diag.with_label(span, "in this constant");
        }
        if let PoolError::IndexOutOfRange { len, .. } = &self {
            diag = diag.with_note(format!("the pool has {len} entries"));
        }
        diag
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Wire(err) => err.fmt(f),
            PoolError::IndexOutOfRange { index, len, .. } => {
                write!(f, "constant index {index} is out of range 0..{len}")
            }
            PoolError::WrongKind {
                index,
                expected,
                found,
                ..
            } => write!(f, "constant #{index} should be {expected}, found {found}"),
            PoolError::BadVersion { text, reason, .. } => {
                write!(f, "illegal version {text:?}: {reason}")
            }
            PoolError::Intern(err) => err.fmt(f),
            PoolError::Unresolved => write!(f, "constant pool has not been resolved"),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<WireError> for PoolError {
    fn from(err: WireError) -> Self {
        PoolError::Wire(err)
    }
}

impl From<InternError> for PoolError {
    fn from(err: InternError) -> Self {
        PoolError::Intern(err)
    }
}

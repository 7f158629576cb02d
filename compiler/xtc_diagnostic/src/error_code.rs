//! Error codes for all diagnostics.
//!
//! Format: E#### where the first digit names the phase:
//! - E0xxx: module file format
//! - E1xxx: value and index ranges
//! - E2xxx: component names
//! - E3xxx: symbol resolution and typing
//! - E4xxx: unsupported constructs
//! - E9xxx: internal errors

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Format Errors (E0xxx)
    /// Bad file magic
    E0001,
    /// Unsupported file version
    E0002,
    /// Truncated stream
    E0003,
    /// Malformed record payload
    E0004,
    /// Unknown constant format tag
    E0005,
    /// Method body disagrees with its signature
    E0006,

    // Range Errors (E1xxx)
    /// Integer literal exceeds its declared width
    E1001,
    /// Pool index out of bounds
    E1002,

    // Name Errors (E2xxx)
    /// Duplicate component name
    E2001,
    /// Ambiguous name through contributions
    E2002,

    // Resolution Errors (E3xxx)
    /// Unresolved symbol
    E3001,
    /// Incompatible structural types
    E3002,

    // Unsupported (E4xxx)
    /// Recognized but unsupported construct
    E4001,

    // Internal Errors (E9xxx)
    /// Internal loader error
    E9001,
}

impl ErrorCode {
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E0005,
        ErrorCode::E0006,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E4001,
        ErrorCode::E9001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E0005 => "E0005",
            ErrorCode::E0006 => "E0006",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line description used by `--explain` style output.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "file does not start with the module magic number",
            ErrorCode::E0002 => "file version is not supported",
            ErrorCode::E0003 => "stream ended inside a record",
            ErrorCode::E0004 => "record payload is malformed",
            ErrorCode::E0005 => "unsupported constant format",
            ErrorCode::E0006 => "method body does not match its signature",
            ErrorCode::E1001 => "integer value exceeds its declared width",
            ErrorCode::E1002 => "constant pool index out of range",
            ErrorCode::E2001 => "duplicate component name",
            ErrorCode::E2002 => "name is ambiguous",
            ErrorCode::E3001 => "unresolved symbol",
            ErrorCode::E3002 => "incompatible structural types",
            ErrorCode::E4001 => "unsupported construct",
            ErrorCode::E9001 => "internal error",
        }
    }

    /// Errors that abort the load of the file that raised them.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E0001
                | ErrorCode::E0002
                | ErrorCode::E0003
                | ErrorCode::E0004
                | ErrorCode::E0005
                | ErrorCode::E0006
        )
    }

    pub fn is_range_error(&self) -> bool {
        matches!(self, ErrorCode::E1001 | ErrorCode::E1002)
    }

    pub fn is_name_error(&self) -> bool {
        matches!(self, ErrorCode::E2001 | ErrorCode::E2002)
    }

    pub fn is_resolution_error(&self) -> bool {
        matches!(self, ErrorCode::E3001 | ErrorCode::E3002)
    }

    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or(())
    }
}

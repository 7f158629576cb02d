//! Errors of loading a module file and of linking a repository.
//!
//! [`TreeError`]s abort the load of one file. [`LinkError`]s are collected
//! by a [`LinkSession`](crate::LinkSession) and reported together.

use std::fmt;

use xtc_diagnostic::{Diagnostic, ErrorCode};
use xtc_ir::{ComponentFormat, ConstFormat, Span};
use xtc_pool::PoolError;
use xtc_wire::WireError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    Wire(WireError),
    Pool(PoolError),
    BadMagic(u32),
    VersionMismatch { major: u32, minor: u32 },
    /// The root module index does not name a Module record.
    NotAModule { found: ConstFormat },
    /// No child of the file carries the root module identity.
    MissingModule { name: String },
    /// A component's identity record does not match its format.
    WrongIdentity {
        format: ComponentFormat,
        found: ConstFormat,
        span: Span,
    },
    /// A body reference points at a record of the wrong kind.
    WrongConstant {
        expected: &'static str,
        found: ConstFormat,
        span: Span,
    },
    /// Component format that cannot appear in a tree.
    UnexpectedComponent { format: ComponentFormat, span: Span },
    /// Component placed under a parent that cannot own it.
    Misplaced {
        format: ComponentFormat,
        parent: ComponentFormat,
        span: Span,
    },
    /// Unknown tag in a component body.
    BadTag {
        what: &'static str,
        tag: u8,
        span: Span,
    },
    ConditionalComponent { span: Span },
    DuplicateName {
        name: String,
        parent: String,
        span: Span,
    },
    SignatureMismatch {
        method: String,
        detail: String,
        span: Span,
    },
    NestedLength {
        declared: usize,
        consumed: usize,
        span: Span,
    },
    TrailingBytes { offset: usize, remaining: usize },
    /// Two files of one repository define the same primary module.
    DuplicateModule {
        name: String,
        first: String,
        second: String,
    },
}

impl TreeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TreeError::Wire(err) => err.code(),
            TreeError::Pool(err) => err.code(),
            TreeError::BadMagic(_) => ErrorCode::E0001,
            TreeError::VersionMismatch { .. } => ErrorCode::E0002,
            TreeError::NotAModule { .. }
            | TreeError::MissingModule { .. }
            | TreeError::WrongIdentity { .. }
            | TreeError::WrongConstant { .. }
            | TreeError::UnexpectedComponent { .. }
            | TreeError::Misplaced { .. }
            | TreeError::BadTag { .. }
            | TreeError::NestedLength { .. }
            | TreeError::TrailingBytes { .. } => ErrorCode::E0004,
            TreeError::SignatureMismatch { .. } => ErrorCode::E0006,
            TreeError::ConditionalComponent { .. } => ErrorCode::E4001,
            TreeError::DuplicateName { .. } | TreeError::DuplicateModule { .. } => {
                ErrorCode::E2001
            }
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            TreeError::Wire(err) => Some(err.span()),
            TreeError::Pool(err) => err.span(),
            TreeError::BadMagic(_) => Some(Span::new(0, 4)),
            TreeError::VersionMismatch { .. } => Some(Span::new(4, 12)),
            TreeError::WrongIdentity { span, .. }
            | TreeError::WrongConstant { span, .. }
            | TreeError::UnexpectedComponent { span, .. }
            | TreeError::Misplaced { span, .. }
            | TreeError::BadTag { span, .. }
            | TreeError::ConditionalComponent { span }
            | TreeError::DuplicateName { span, .. }
            | TreeError::SignatureMismatch { span, .. }
            | TreeError::NestedLength { span, .. } => Some(*span),
            TreeError::TrailingBytes { offset, .. } => {
                Some(Span::from_range_saturating(*offset..*offset + 1))
            }
            TreeError::NotAModule { .. }
            | TreeError::MissingModule { .. }
            | TreeError::DuplicateModule { .. } => None,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        match self {
            TreeError::Wire(err) => err.into_diagnostic(),
            TreeError::Pool(err) => err.into_diagnostic(),
            other => {
                let mut diag = Diagnostic::error(other.code()).with_message(other.to_string());
                if let Some(span) = other.span() {
                    diag = diag.with_label(span, "here");
                }
                match &other {
                    TreeError::VersionMismatch { .. } => {
                        diag = diag.with_note(format!(
                            "this loader reads version {}.{}",
                            crate::file::VERSION_MAJOR,
                            crate::file::VERSION_MINOR
                        ));
                    }
                    TreeError::DuplicateModule { first, second, .. } => {
                        diag = diag.with_note(format!("defined in {first} and {second}"));
                    }
                    _ => {}
                }
                diag
            }
        }
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Wire(err) => err.fmt(f),
            TreeError::Pool(err) => err.fmt(f),
            TreeError::BadMagic(magic) => write!(f, "not a module file: bad magic {magic:#010X}"),
            TreeError::VersionMismatch { major, minor } => {
                write!(f, "unsupported module file version {major}.{minor}")
            }
            TreeError::NotAModule { found } => {
                write!(f, "root module index names a {found} record")
            }
            TreeError::MissingModule { name } => {
                write!(f, "file has no component for its module {name}")
            }
            TreeError::WrongIdentity { format, found, .. } => {
                write!(f, "{format} component has a {found} identity")
            }
            TreeError::WrongConstant {
                expected, found, ..
            } => write!(f, "expected {expected}, found a {found} constant"),
            TreeError::UnexpectedComponent { format, .. } => {
                write!(f, "unexpected {format} component")
            }
            TreeError::Misplaced { format, parent, .. } => {
                write!(f, "{format} component cannot be a child of a {parent}")
            }
            TreeError::BadTag { what, tag, .. } => write!(f, "invalid {what} {tag}"),
            TreeError::ConditionalComponent { .. } => write!(
                f,
                "unsupported construct: conditional multi-component records are not supported"
            ),
            TreeError::DuplicateName { name, parent, .. } => {
                write!(f, "duplicate name {name} in {parent}")
            }
            TreeError::SignatureMismatch { method, detail, .. } => {
                write!(f, "method {method} does not match its signature: {detail}")
            }
            TreeError::NestedLength {
                declared, consumed, ..
            } => write!(
                f,
                "nested components declare {declared} bytes but occupy {consumed}"
            ),
            TreeError::TrailingBytes { remaining, .. } => {
                write!(f, "{remaining} trailing byte(s) after the component tree")
            }
            TreeError::DuplicateModule { name, .. } => {
                write!(f, "module {name} is defined more than once")
            }
        }
    }
}

impl std::error::Error for TreeError {}

impl From<WireError> for TreeError {
    fn from(err: WireError) -> Self {
        TreeError::Wire(err)
    }
}

impl From<PoolError> for TreeError {
    fn from(err: PoolError) -> Self {
        TreeError::Pool(err)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkErrorKind {
    Unresolved {
        /// What was sought: "module", "class", "method", ...
        what: &'static str,
        name: String,
        detail: Option<String>,
    },
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    Unsupported(String),
}

/// A problem found while linking, located at the node that referenced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkError {
    pub kind: LinkErrorKind,
    /// Dotted path of the referencing node.
    pub path: String,
    /// Label of the file holding the referencing node.
    pub file: String,
    pub span: Span,
}

impl LinkError {
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            LinkErrorKind::Unresolved { .. } => ErrorCode::E3001,
            LinkErrorKind::Ambiguous { .. } => ErrorCode::E2002,
            LinkErrorKind::Unsupported(_) => ErrorCode::E4001,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(self.span, format!("referenced from {}", self.path));
        match &self.kind {
            LinkErrorKind::Unresolved {
                detail: Some(detail),
                ..
            } => diag = diag.with_note(detail.clone()),
            LinkErrorKind::Unresolved {
                what: "module",
                name,
                detail: None,
            } => {
                diag = diag.with_suggestion(format!("add the file defining module {name}"));
            }
            LinkErrorKind::Ambiguous { candidates, .. } => {
                diag = diag.with_note(format!("candidates: {}", candidates.join(", ")));
            }
            _ => {}
        }
        diag.in_file(&self.file)
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LinkErrorKind::Unresolved { what, name, .. } => {
                write!(f, "{what} not found: {name}")
            }
            LinkErrorKind::Ambiguous { name, .. } => write!(f, "ambiguous name {name}"),
            LinkErrorKind::Unsupported(what) => write!(f, "unsupported construct: {what}"),
        }
    }
}

impl std::error::Error for LinkError {}

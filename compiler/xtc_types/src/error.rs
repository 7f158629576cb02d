//! Errors of structural typing.

use std::fmt;

use xtc_diagnostic::{Diagnostic, ErrorCode};
use xtc_ir::{Span, StringLookup};

use crate::FieldKey;

/// Why two type variables could not be unified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyError {
    Mismatch { left: String, right: String },
    /// Lambdas with different parameter counts.
    Arity { left: usize, right: usize },
    /// A shared field failed to unify.
    InField {
        field: FieldKey,
        source: Box<UnifyError>,
    },
}

impl UnifyError {
    /// Human-readable text; field names are looked up in `names`.
    pub fn render(&self, names: &impl StringLookup) -> String {
        match self {
            UnifyError::Mismatch { left, right } => {
                format!("{left} is incompatible with {right}")
            }
            UnifyError::Arity { left, right } => {
                format!("lambdas take {left} and {right} parameter(s)")
            }
            UnifyError::InField { field, source } => {
                let label = match field {
                    FieldKey::Property(name) => format!("property {}", names.lookup(*name)),
                    FieldKey::Method(name, arity) => {
                        format!("method {}/{arity}", names.lookup(*name))
                    }
                };
                format!("{label}: {}", source.render(names))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeErrorKind {
    /// Two types that must agree do not.
    Mismatch { detail: String },
    /// A type record that names no linked part.
    Unresolved { name: String },
    Unsupported(String),
}

/// A problem found while computing a structural type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    /// Dotted path of the part whose type was being computed.
    pub path: String,
    pub file: String,
    pub span: Span,
}

impl TypeError {
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            TypeErrorKind::Mismatch { .. } => ErrorCode::E3002,
            TypeErrorKind::Unresolved { .. } => ErrorCode::E3001,
            TypeErrorKind::Unsupported(_) => ErrorCode::E4001,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(self.span, format!("while typing {}", self.path));
        if let TypeErrorKind::Mismatch { detail } = &self.kind {
            diag = diag.with_note(detail.clone());
        }
        diag.in_file(&self.file)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeErrorKind::Mismatch { .. } => write!(f, "type mismatch in {}", self.path),
            TypeErrorKind::Unresolved { name } => write!(f, "type not found: {name}"),
            TypeErrorKind::Unsupported(what) => write!(f, "unsupported construct: {what}"),
        }
    }
}

impl std::error::Error for TypeError {}

//! Diagnostics for module loading, linking and structural typing.
//!
//! Every phase keeps its own error enum and converts it into a
//! [`Diagnostic`]: an [`ErrorCode`], a message, labels pointing at byte
//! ranges of a module file, and notes naming the referencing component.
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] can only be obtained from a [`DiagnosticQueue`] that
//! recorded an error, so a phase returning `Err(ErrorGuaranteed)` has always
//! reported why.

mod diagnostic;
pub mod emitter;
mod error_code;
mod guarantee;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};

//! Structural types of linked classes.
//!
//! Every class and interface gets one structural type: a record of its
//! properties and methods. Types are type variables in a union-find pool
//! ([`TVarPool`]); two types are the same once they have been unified.
//!
//! - [`TVarPool`]: leaves, anchored base types, field records and lambdas,
//!   with `unify`, `fresh`, `union` and `intersect`
//! - [`TypeEnv`]: computes the type of a class (`setype`) or of a pool type
//!   record over a [`LinkSession`](xtc_part::LinkSession)

mod env;
mod error;
mod tvar;

pub use env::TypeEnv;
pub use error::{TypeError, TypeErrorKind, UnifyError};
pub use tvar::{Anchor, FieldKey, TVarId, TVarKind, TVarPool};

//! Constant pool of an XTC module file.
//!
//! A pool is built in two passes. [`Pool::parse`] decodes every record into
//! the raw arena and remembers where each one starts; [`Pool::resolve`] then
//! maps the raw arena into [`Const`]s whose references are checked
//! [`ConstId`](xtc_ir::ConstId)s and whose strings are interned. Because the
//! second pass only reads the finished raw arena, forward and cyclic
//! references need no special handling.

mod constant;
mod error;
mod pool;
mod version;

pub use constant::Const;
pub use error::PoolError;
pub use pool::Pool;
pub use version::{PreRelease, Version, VersionError};

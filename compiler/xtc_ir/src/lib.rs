//! Shared vocabulary for every phase of module loading.
//!
//! - [`Span`]: byte range inside a module file, used by every diagnostic
//! - [`Name`] / [`StringInterner`]: interned identifiers shared by all files
//!   loaded into one repository
//! - [`ConstId`], [`PartId`], [`FileId`], [`PartRef`]: arena indices
//! - [`ConstFormat`], [`ComponentFormat`], [`Composition`], [`Access`],
//!   [`ModuleKind`]: the closed tag sets of the wire format
//! - [`ComponentFlags`]: the 16-bit flags word of a component record

/// Compile-time assertion that a type has the expected size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod flags;
mod format;
mod idx;
mod interner;
mod name;
mod span;

pub use flags::ComponentFlags;
pub use format::{Access, ComponentFormat, Composition, ConstFormat, ModuleKind};
pub use idx::{ConstId, FileId, PartId, PartRef};
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use span::{Span, SpanError};

static_assert_size!(Span, 8);
static_assert_size!(Name, 4);
static_assert_size!(ConstId, 4);
static_assert_size!(PartRef, 8);

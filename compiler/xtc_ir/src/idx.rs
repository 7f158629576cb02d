//! Arena indices.
//!
//! All cross references inside a loaded module are 32-bit indices: pool
//! entries by [`ConstId`], tree nodes by [`PartId`]. Parts of different files
//! are addressed by [`PartRef`], which is what a link session memoizes on.

use std::fmt;

macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Index for the `n`th arena slot.
            ///
            /// # Panics
            /// Panics if `n` exceeds `u32::MAX`; arenas are bounded well below.
            #[inline]
            pub fn from_usize(n: usize) -> Self {
                Self(u32::try_from(n).unwrap_or_else(|_| {
                    panic!("{} overflow: {n} exceeds u32::MAX", stringify!($name))
                }))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_idx!(
    /// Slot of a constant pool entry.
    ConstId,
    "#"
);
define_idx!(
    /// Node of one file's component tree.
    PartId,
    "part"
);
define_idx!(
    /// Module file registered in a repository.
    FileId,
    "file"
);

impl PartId {
    /// The File node is always the first part of a tree.
    pub const ROOT: PartId = PartId(0);
}

/// A part of a specific file.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PartRef {
    pub file: FileId,
    pub part: PartId,
}

impl PartRef {
    #[inline]
    pub const fn new(file: FileId, part: PartId) -> Self {
        PartRef { file, part }
    }
}

impl fmt::Debug for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.file, self.part)
    }
}

#[cfg(test)]
mod tests;

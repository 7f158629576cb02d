//! The 16-bit flags word that starts every component record.
//!
//! Layout:
//! - bits 0-3: [`ComponentFormat`]
//! - bits 8-9: [`Access`] (0 is not valid for a component)
//! - bits 10-14: modifier bits
//! - bit 15: conditional multi-component marker (first byte `0x80`)

use bitflags::bitflags;

use crate::{Access, ComponentFormat};

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ComponentFlags: u16 {
        // === Encoded fields (read through accessors) ===
        const FORMAT_MASK = 0x000F;
        const ACCESS_MASK = 0x0300;

        const ACCESS_PUBLIC = 0x0100;
        const ACCESS_PROTECTED = 0x0200;
        const ACCESS_PRIVATE = 0x0300;

        // === Modifiers ===
        const ABSTRACT = 0x0400;
        const STATIC = 0x0800;
        const SYNTHETIC = 0x1000;
        /// Method returns a conditional tuple (`Boolean` first).
        const CONDITIONAL_RETURN = 0x2000;
        const AUXILIARY = 0x4000;

        /// Set on the first byte when a conditional multi-component follows.
        const CONDITIONAL = 0x8000;
    }
}

impl ComponentFlags {
    /// Compose a flags word from its fields.
    pub fn encode(format: ComponentFormat, access: Access) -> Self {
        let bits = u16::from(format.tag()) | (u16::from(access.tag()) << 8);
        ComponentFlags::from_bits_retain(bits)
    }

    /// Component format encoded in the low nibble.
    pub fn format(self) -> ComponentFormat {
        // All sixteen nibble values name a format.
        #[expect(
            clippy::cast_possible_truncation,
            reason = "masked to the low four bits"
        )]
        let tag = (self.bits() & Self::FORMAT_MASK.bits()) as u8;
        ComponentFormat::from_tag(tag).unwrap_or(ComponentFormat::File)
    }

    /// Access encoded in bits 8-9.
    pub fn access(self) -> Access {
        #[expect(clippy::cast_possible_truncation, reason = "masked to two bits")]
        let tag = ((self.bits() & Self::ACCESS_MASK.bits()) >> 8) as u8;
        Access::from_tag(tag).unwrap_or(Access::Struct)
    }

    #[must_use]
    pub fn with(self, modifiers: ComponentFlags) -> Self {
        self | modifiers
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    pub fn is_conditional_return(self) -> bool {
        self.contains(Self::CONDITIONAL_RETURN)
    }

    pub fn is_auxiliary(self) -> bool {
        self.contains(Self::AUXILIARY)
    }
}

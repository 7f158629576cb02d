//! Closed tag sets of the module wire format.
//!
//! Each enum's discriminant is the ordinal written on the wire, so the
//! variant order here is part of the file format.

use std::fmt;

macro_rules! wire_tag_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        #[repr(u8)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All variants in wire order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Decode a wire ordinal.
            #[inline]
            pub fn from_tag(tag: u8) -> Option<Self> {
                Self::ALL.get(usize::from(tag)).copied()
            }

            #[inline]
            pub const fn tag(self) -> u8 {
                self as u8
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_tag_enum! {
    /// Format tag of a constant pool record.
    pub enum ConstFormat {
        IntLiteral,
        Bit,
        Nibble,
        Int8,
        Int16,
        Int32,
        Int64,
        Int128,
        IntN,
        UInt8,
        UInt16,
        UInt32,
        UInt64,
        UInt128,
        UIntN,
        FPLiteral,
        Dec32,
        Dec64,
        Dec128,
        DecN,
        Float8e4,
        Float8e5,
        BFloat16,
        Float16,
        Float32,
        Float64,
        Float128,
        FloatN,
        Char,
        String,
        RegEx,
        Date,
        TimeOfDay,
        TimeZone,
        Time,
        Duration,
        Version,
        SingletonConst,
        EnumValueConst,
        SingletonService,
        Tuple,
        Array,
        UInt8Array,
        Set,
        MapEntry,
        Map,
        Range,
        RangeInclusive,
        RangeExclusive,
        Any,
        Path,
        FileStore,
        FSDir,
        FSFile,
        FSLink,
        ResponseSender,
        Module,
        Package,
        Class,
        Typedef,
        Property,
        MultiMethod,
        Method,
        Annotation,
        Register,
        BindTarget,
        UnresolvedName,
        DeferredValue,
        ThisClass,
        ParentClass,
        ChildClass,
        TypeParameter,
        FormalTypeChild,
        DynamicFormal,
        Signature,
        DecoratedClass,
        NativeClass,
        IsConst,
        IsEnum,
        IsModule,
        IsPackage,
        IsClass,
        UnresolvedType,
        TerminalType,
        ImmutableType,
        ServiceType,
        AccessType,
        AnnotatedType,
        ParameterizedType,
        TurtleType,
        VirtualChildType,
        InnerChildType,
        AnonymousClassType,
        PropertyClassType,
        IntersectionType,
        CastType,
        UnionType,
        DifferenceType,
        RecursiveType,
        ConditionNot,
        ConditionAll,
        ConditionAny,
        ConditionNamed,
        ConditionPresent,
        ConditionVersionMatches,
        ConditionVersioned,
    }
}

impl ConstFormat {
    /// Records naming a component of the tree.
    pub const fn is_identity(self) -> bool {
        matches!(
            self,
            ConstFormat::Module
                | ConstFormat::Package
                | ConstFormat::Class
                | ConstFormat::Typedef
                | ConstFormat::Property
                | ConstFormat::MultiMethod
                | ConstFormat::Method
        )
    }

    /// Records describing a type.
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            ConstFormat::TerminalType
                | ConstFormat::ImmutableType
                | ConstFormat::ServiceType
                | ConstFormat::AccessType
                | ConstFormat::AnnotatedType
                | ConstFormat::ParameterizedType
                | ConstFormat::TurtleType
                | ConstFormat::VirtualChildType
                | ConstFormat::InnerChildType
                | ConstFormat::AnonymousClassType
                | ConstFormat::PropertyClassType
                | ConstFormat::IntersectionType
                | ConstFormat::UnionType
                | ConstFormat::DifferenceType
                | ConstFormat::RecursiveType
        )
    }

    pub const fn is_condition(self) -> bool {
        matches!(
            self,
            ConstFormat::ConditionNot
                | ConstFormat::ConditionAll
                | ConstFormat::ConditionAny
                | ConstFormat::ConditionNamed
                | ConstFormat::ConditionPresent
                | ConstFormat::ConditionVersionMatches
                | ConstFormat::ConditionVersioned
        )
    }
}

wire_tag_enum! {
    /// Format tag of a component record (low 4 bits of its flags word).
    pub enum ComponentFormat {
        Interface,
        Class,
        Const,
        Enum,
        EnumValue,
        Mixin,
        Service,
        Package,
        Module,
        Typedef,
        Property,
        Method,
        ReservedC,
        ReservedD,
        MultiMethod,
        File,
    }
}

impl ComponentFormat {
    /// Formats sharing the class representation.
    pub const fn is_class_family(self) -> bool {
        matches!(
            self,
            ComponentFormat::Interface
                | ComponentFormat::Class
                | ComponentFormat::Const
                | ComponentFormat::Enum
                | ComponentFormat::EnumValue
                | ComponentFormat::Mixin
                | ComponentFormat::Service
        )
    }
}

wire_tag_enum! {
    /// Composition kind of a class contribution.
    pub enum Composition {
        Annotation,
        Extends,
        Implements,
        Delegates,
        Into,
        Incorporates,
        RebasesOnto,
        ImportOptional,
        ImportDesired,
        ImportRequired,
        ImportEmbedded,
    }
}

impl Composition {
    pub const fn is_import(self) -> bool {
        matches!(
            self,
            Composition::ImportOptional
                | Composition::ImportDesired
                | Composition::ImportRequired
                | Composition::ImportEmbedded
        )
    }

    /// Compositions searched when a class-family lookup misses locally.
    pub const fn is_searched(self) -> bool {
        matches!(
            self,
            Composition::Implements
                | Composition::Into
                | Composition::Extends
                | Composition::Delegates
        )
    }
}

wire_tag_enum! {
    /// Accessibility of a component or a qualified type.
    pub enum Access {
        Struct,
        Public,
        Protected,
        Private,
    }
}

wire_tag_enum! {
    /// Role of a module record inside a file.
    pub enum ModuleKind {
        /// The module the file defines.
        Primary,
        /// Dependency that may be absent at runtime.
        Optional,
        /// Dependency used when present.
        Desired,
        /// Dependency that must be present.
        Required,
        /// Module stored inside this file.
        Embedded,
    }
}

impl ModuleKind {
    /// Placeholder modules replaced by a repository's primary at link time.
    pub const fn is_fingerprint(self) -> bool {
        matches!(
            self,
            ModuleKind::Optional | ModuleKind::Desired | ModuleKind::Required
        )
    }
}

#[cfg(test)]
mod tests;

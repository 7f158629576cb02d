//! Resolved constant records.

use smallvec::SmallVec;
use xtc_ir::{Access, ConstFormat, ConstId, Name};
use xtc_wire::PackedInt;

use crate::Version;

/// One resolved pool entry.
///
/// Mirrors [`xtc_wire::RawConst`] with every reference checked against the
/// pool and every name-valued reference replaced by the interned text of
/// the String record it pointed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Const {
    /// Text-carried literal other than `Version`.
    Literal { format: ConstFormat, text: Name },
    Version(Version),
    Int { format: ConstFormat, value: PackedInt },
    FloatBits { format: ConstFormat, bits: Box<[u8]> },
    Char(char),
    String(Name),
    Singleton { format: ConstFormat, class: ConstId },
    Aggregate {
        format: ConstFormat,
        ty: ConstId,
        values: Box<[ConstId]>,
    },
    Bytes(Box<[u8]>),
    MapEntry {
        ty: ConstId,
        key: ConstId,
        value: ConstId,
    },
    Map {
        ty: ConstId,
        entries: Box<[(ConstId, ConstId)]>,
    },
    Range {
        format: ConstFormat,
        first: ConstId,
        last: ConstId,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
    Any { ty: ConstId },
    /// Module identity by qualified name.
    Module { name: Name },
    /// `Package`, `Class`, `Typedef`, `Property` or `MultiMethod` identity.
    Named {
        format: ConstFormat,
        parent: ConstId,
        name: Name,
    },
    Method {
        multi: ConstId,
        signature: ConstId,
        lambda: bool,
    },
    Annotation {
        class: ConstId,
        args: Box<[ConstId]>,
    },
    ThisClass { class: ConstId },
    ParentClass { child: ConstId },
    ChildClass { parent: ConstId, name: Name },
    TypeParameter {
        method: ConstId,
        register: u32,
        name: Name,
    },
    FormalTypeChild { parent: ConstId, name: Name },
    DynamicFormal {
        ty: ConstId,
        register: u32,
        formal: ConstId,
        name: Name,
    },
    Signature {
        name: Name,
        params: SmallVec<[ConstId; 4]>,
        returns: SmallVec<[ConstId; 2]>,
    },
    DecoratedClass { ty: ConstId },
    Keyword(ConstFormat),
    TerminalType { def: ConstId },
    /// `ImmutableType` or `ServiceType`.
    Wrapped { format: ConstFormat, ty: ConstId },
    AccessType { ty: ConstId, access: Access },
    AnnotatedType { annotation: ConstId, ty: ConstId },
    ParameterizedType {
        base: ConstId,
        params: SmallVec<[ConstId; 4]>,
    },
    VirtualChildType {
        parent: ConstId,
        name: Name,
        this_ref: bool,
    },
    ChildType {
        format: ConstFormat,
        parent: ConstId,
        class: ConstId,
    },
    PropertyClassType { parent: ConstId, property: ConstId },
    /// `IntersectionType`, `UnionType` or `DifferenceType`.
    Relational {
        format: ConstFormat,
        first: ConstId,
        second: ConstId,
    },
    RecursiveType { typedef: ConstId },
    ConditionNot { cond: ConstId },
    Conditions {
        format: ConstFormat,
        conds: Box<[ConstId]>,
    },
    ConditionNamed { name: Name },
    ConditionPresent { identity: ConstId },
    ConditionVersionMatches { module: ConstId, version: ConstId },
    ConditionVersioned { version: ConstId },
}

impl Const {
    pub fn format(&self) -> ConstFormat {
        use ConstFormat as F;

        match self {
            Const::Literal { format, .. }
            | Const::Int { format, .. }
            | Const::FloatBits { format, .. }
            | Const::Singleton { format, .. }
            | Const::Aggregate { format, .. }
            | Const::Range { format, .. }
            | Const::Named { format, .. }
            | Const::Wrapped { format, .. }
            | Const::ChildType { format, .. }
            | Const::Relational { format, .. }
            | Const::Conditions { format, .. }
            | Const::Keyword(format) => *format,
            Const::Version(_) => F::Version,
            Const::Char(_) => F::Char,
            Const::String(_) => F::String,
            Const::Bytes(_) => F::UInt8Array,
            Const::MapEntry { .. } => F::MapEntry,
            Const::Map { .. } => F::Map,
            Const::Any { .. } => F::Any,
            Const::Module { .. } => F::Module,
            Const::Method { .. } => F::Method,
            Const::Annotation { .. } => F::Annotation,
            Const::ThisClass { .. } => F::ThisClass,
            Const::ParentClass { .. } => F::ParentClass,
            Const::ChildClass { .. } => F::ChildClass,
            Const::TypeParameter { .. } => F::TypeParameter,
            Const::FormalTypeChild { .. } => F::FormalTypeChild,
            Const::DynamicFormal { .. } => F::DynamicFormal,
            Const::Signature { .. } => F::Signature,
            Const::DecoratedClass { .. } => F::DecoratedClass,
            Const::TerminalType { .. } => F::TerminalType,
            Const::AccessType { .. } => F::AccessType,
            Const::AnnotatedType { .. } => F::AnnotatedType,
            Const::ParameterizedType { .. } => F::ParameterizedType,
            Const::VirtualChildType { .. } => F::VirtualChildType,
            Const::PropertyClassType { .. } => F::PropertyClassType,
            Const::RecursiveType { .. } => F::RecursiveType,
            Const::ConditionNot { .. } => F::ConditionNot,
            Const::ConditionNamed { .. } => F::ConditionNamed,
            Const::ConditionPresent { .. } => F::ConditionPresent,
            Const::ConditionVersionMatches { .. } => F::ConditionVersionMatches,
            Const::ConditionVersioned { .. } => F::ConditionVersioned,
        }
    }

    /// Simple name of an identity-like record; `None` for everything else.
    ///
    /// Method identities name their multi-method, which only the pool can
    /// follow; see [`Pool::name_of`](crate::Pool::name_of).
    pub fn own_name(&self) -> Option<Name> {
        match self {
            Const::Module { name }
            | Const::Named { name, .. }
            | Const::ChildClass { name, .. }
            | Const::TypeParameter { name, .. }
            | Const::FormalTypeChild { name, .. }
            | Const::DynamicFormal { name, .. }
            | Const::Signature { name, .. }
            | Const::VirtualChildType { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.format().is_identity()
    }
}

#[cfg(test)]
mod tests;

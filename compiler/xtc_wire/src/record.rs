//! Tagged constant records with unresolved references.
//!
//! Every record starts with a one-byte [`ConstFormat`] tag; the payload shape
//! is fixed by the tag. References to other pool entries are kept as the raw
//! `u32` slot numbers read from the stream.

use smallvec::SmallVec;
use xtc_ir::{Access, ConstFormat};

use crate::{PackedInt, Reader, WireError, WireErrorKind, Writer};

/// Declared width of an integer literal format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntWidth {
    /// One byte on the wire, unsigned, with an inclusive maximum.
    Byte { max: u8 },
    /// One signed byte.
    SignedByte,
    Signed(u32),
    Unsigned(u32),
}

impl IntWidth {
    /// Width of an integer format, `None` for non-integer formats.
    pub fn of(format: ConstFormat) -> Option<IntWidth> {
        const N_BITS: u32 = 8192 * 8;
        Some(match format {
            ConstFormat::Bit => IntWidth::Byte { max: 1 },
            ConstFormat::Nibble => IntWidth::Byte { max: 15 },
            ConstFormat::UInt8 => IntWidth::Byte { max: u8::MAX },
            ConstFormat::Int8 => IntWidth::SignedByte,
            ConstFormat::Int16 => IntWidth::Signed(16),
            ConstFormat::Int32 => IntWidth::Signed(32),
            ConstFormat::Int64 => IntWidth::Signed(64),
            ConstFormat::Int128 => IntWidth::Signed(128),
            ConstFormat::IntN => IntWidth::Signed(N_BITS),
            ConstFormat::UInt16 => IntWidth::Unsigned(16),
            ConstFormat::UInt32 => IntWidth::Unsigned(32),
            ConstFormat::UInt64 => IntWidth::Unsigned(64),
            ConstFormat::UInt128 => IntWidth::Unsigned(128),
            ConstFormat::UIntN => IntWidth::Unsigned(N_BITS),
            _ => return None,
        })
    }

    pub fn contains(self, value: &PackedInt) -> bool {
        match self {
            IntWidth::Byte { max } => {
                value.as_i64().is_some_and(|v| (0..=i64::from(max)).contains(&v))
            }
            IntWidth::SignedByte => value.fits_signed(8),
            IntWidth::Signed(bits) => value.fits_signed(bits),
            IntWidth::Unsigned(bits) => value.fits_unsigned(bits),
        }
    }
}

/// Byte width of a fixed-width float or decimal format; `None` for the
/// length-prefixed `FloatN`/`DecN` and for non-float formats.
fn float_width(format: ConstFormat) -> Option<usize> {
    match format {
        ConstFormat::Float8e4 | ConstFormat::Float8e5 => Some(1),
        ConstFormat::BFloat16 | ConstFormat::Float16 => Some(2),
        ConstFormat::Dec32 | ConstFormat::Float32 => Some(4),
        ConstFormat::Dec64 | ConstFormat::Float64 => Some(8),
        ConstFormat::Dec128 | ConstFormat::Float128 => Some(16),
        _ => None,
    }
}

/// One constant pool record before resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawConst {
    /// Text-carried literal: `IntLiteral`, `FPLiteral`, `RegEx`, `Date`,
    /// `TimeOfDay`, `TimeZone`, `Time`, `Duration`, `Path`, `Version`.
    Literal { format: ConstFormat, text: u32 },
    /// Integer with a declared width, range-checked when decoded.
    Int { format: ConstFormat, value: PackedInt },
    /// Float or decimal bit pattern, big-endian.
    FloatBits { format: ConstFormat, bits: Vec<u8> },
    Char(char),
    String(String),
    /// `SingletonConst`, `EnumValueConst`, `SingletonService`.
    Singleton { format: ConstFormat, class: u32 },
    /// `Tuple`, `Array`, `Set`.
    Aggregate {
        format: ConstFormat,
        ty: u32,
        values: Vec<u32>,
    },
    Bytes(Vec<u8>),
    MapEntry { ty: u32, key: u32, value: u32 },
    Map { ty: u32, entries: Vec<(u32, u32)> },
    /// `Range`, `RangeInclusive`, `RangeExclusive`.
    Range {
        format: ConstFormat,
        first: u32,
        last: u32,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
    Any { ty: u32 },
    Module { name: u32 },
    /// `Package`, `Class`, `Typedef`, `Property`, `MultiMethod`.
    Named {
        format: ConstFormat,
        parent: u32,
        name: u32,
    },
    Method {
        multi: u32,
        signature: u32,
        lambda: bool,
    },
    Annotation { class: u32, args: Vec<u32> },
    ThisClass { class: u32 },
    ParentClass { child: u32 },
    ChildClass { parent: u32, name: u32 },
    TypeParameter { method: u32, register: u32, name: u32 },
    FormalTypeChild { parent: u32, name: u32 },
    DynamicFormal {
        ty: u32,
        register: u32,
        formal: u32,
        name: u32,
    },
    Signature {
        name: u32,
        params: Vec<u32>,
        returns: Vec<u32>,
    },
    DecoratedClass { ty: u32 },
    /// Payload-free records: `IsConst`, `IsEnum`, `IsModule`, `IsPackage`,
    /// `IsClass`, `TurtleType`.
    Keyword(ConstFormat),
    TerminalType { def: u32 },
    /// `ImmutableType`, `ServiceType`.
    Wrapped { format: ConstFormat, ty: u32 },
    AccessType { ty: u32, access: Access },
    AnnotatedType { annotation: u32, ty: u32 },
    ParameterizedType { base: u32, params: Vec<u32> },
    VirtualChildType {
        parent: u32,
        name: u32,
        this_ref: bool,
    },
    /// `InnerChildType`, `AnonymousClassType`.
    ChildType {
        format: ConstFormat,
        parent: u32,
        class: u32,
    },
    PropertyClassType { parent: u32, property: u32 },
    /// `IntersectionType`, `UnionType`, `DifferenceType`.
    Relational {
        format: ConstFormat,
        first: u32,
        second: u32,
    },
    RecursiveType { typedef: u32 },
    ConditionNot { cond: u32 },
    /// `ConditionAll`, `ConditionAny`.
    Conditions { format: ConstFormat, conds: Vec<u32> },
    ConditionNamed { name: u32 },
    ConditionPresent { identity: u32 },
    ConditionVersionMatches { module: u32, version: u32 },
    ConditionVersioned { version: u32 },
}

/// Read one record: its tag byte, then its payload.
///
/// Returns the record and the number of bytes it occupied.
pub fn decode_const(r: &mut Reader<'_>) -> Result<(RawConst, usize), WireError> {
    let start = r.position();
    let tag = r.u8()?;
    let format =
        ConstFormat::from_tag(tag).ok_or(WireError::new(WireErrorKind::UnknownFormat(tag), start))?;
    let record = decode_payload(format, r).map_err(|mut err| {
        // Unsupported formats point at the tag, not past it.
        if matches!(err.kind, WireErrorKind::Unsupported(_)) {
            err.offset = start;
        }
        err
    })?;
    Ok((record, r.position() - start))
}

/// Read the payload of a record whose tag was already consumed.
pub fn decode_payload(format: ConstFormat, r: &mut Reader<'_>) -> Result<RawConst, WireError> {
    use ConstFormat as F;

    let record = match format {
        F::IntLiteral
        | F::FPLiteral
        | F::RegEx
        | F::Date
        | F::TimeOfDay
        | F::TimeZone
        | F::Time
        | F::Duration
        | F::Path
        | F::Version => RawConst::Literal {
            format,
            text: r.required_index()?,
        },

        F::Bit
        | F::Nibble
        | F::Int8
        | F::UInt8
        | F::Int16
        | F::Int32
        | F::Int64
        | F::Int128
        | F::IntN
        | F::UInt16
        | F::UInt32
        | F::UInt64
        | F::UInt128
        | F::UIntN => decode_int(format, r)?,

        F::Dec32
        | F::Dec64
        | F::Dec128
        | F::Float8e4
        | F::Float8e5
        | F::BFloat16
        | F::Float16
        | F::Float32
        | F::Float64
        | F::Float128 => {
            let width = float_width(format).unwrap_or_default();
            RawConst::FloatBits {
                format,
                bits: r.bytes(width)?.to_vec(),
            }
        }
        F::DecN | F::FloatN => RawConst::FloatBits {
            format,
            bits: r.byte_array()?.to_vec(),
        },

        F::Char => {
            let start = r.position();
            let cp = r.packed_i64()?;
            let ch = u32::try_from(cp)
                .ok()
                .and_then(char::from_u32)
                .ok_or(WireError::new(WireErrorKind::InvalidChar(cp), start))?;
            RawConst::Char(ch)
        }
        F::String => RawConst::String(r.utf8()?),

        F::SingletonConst | F::EnumValueConst | F::SingletonService => RawConst::Singleton {
            format,
            class: r.required_index()?,
        },
        F::Tuple | F::Array | F::Set => RawConst::Aggregate {
            format,
            ty: r.required_index()?,
            values: r.indices()?,
        },
        F::UInt8Array => RawConst::Bytes(r.byte_array()?.to_vec()),
        F::MapEntry => RawConst::MapEntry {
            ty: r.required_index()?,
            key: r.required_index()?,
            value: r.required_index()?,
        },
        F::Map => {
            let ty = r.required_index()?;
            let n = r.count()?;
            let entries = (0..n)
                .map(|_| Ok((r.required_index()?, r.required_index()?)))
                .collect::<Result<_, WireError>>()?;
            RawConst::Map { ty, entries }
        }
        F::Range => {
            let flags = r.u8()?;
            RawConst::Range {
                format,
                lower_exclusive: flags & 0x01 != 0,
                upper_exclusive: flags & 0x02 != 0,
                first: r.required_index()?,
                last: r.required_index()?,
            }
        }
        F::RangeInclusive | F::RangeExclusive => RawConst::Range {
            format,
            lower_exclusive: false,
            upper_exclusive: format == F::RangeExclusive,
            first: r.required_index()?,
            last: r.required_index()?,
        },
        F::Any => RawConst::Any {
            ty: r.required_index()?,
        },

        F::Module => RawConst::Module {
            name: r.required_index()?,
        },
        F::Package | F::Class | F::Typedef | F::Property | F::MultiMethod => RawConst::Named {
            format,
            parent: r.required_index()?,
            name: r.required_index()?,
        },
        F::Method => RawConst::Method {
            multi: r.required_index()?,
            signature: r.required_index()?,
            lambda: r.bool()?,
        },
        F::Annotation => RawConst::Annotation {
            class: r.required_index()?,
            args: r.indices()?,
        },

        F::ThisClass => RawConst::ThisClass {
            class: r.required_index()?,
        },
        F::ParentClass => RawConst::ParentClass {
            child: r.required_index()?,
        },
        F::ChildClass => RawConst::ChildClass {
            parent: r.required_index()?,
            name: r.required_index()?,
        },
        F::TypeParameter => RawConst::TypeParameter {
            method: r.required_index()?,
            register: register(r)?,
            name: r.required_index()?,
        },
        F::FormalTypeChild => RawConst::FormalTypeChild {
            parent: r.required_index()?,
            name: r.required_index()?,
        },
        F::DynamicFormal => RawConst::DynamicFormal {
            ty: r.required_index()?,
            register: register(r)?,
            formal: r.required_index()?,
            name: r.required_index()?,
        },
        F::Signature => RawConst::Signature {
            name: r.required_index()?,
            params: r.indices()?,
            returns: r.indices()?,
        },
        F::DecoratedClass => RawConst::DecoratedClass {
            ty: r.required_index()?,
        },

        F::IsConst | F::IsEnum | F::IsModule | F::IsPackage | F::IsClass | F::TurtleType => {
            RawConst::Keyword(format)
        }

        F::TerminalType => RawConst::TerminalType {
            def: r.required_index()?,
        },
        F::ImmutableType | F::ServiceType => RawConst::Wrapped {
            format,
            ty: r.required_index()?,
        },
        F::AccessType => RawConst::AccessType {
            ty: r.required_index()?,
            access: r.access()?,
        },
        F::AnnotatedType => RawConst::AnnotatedType {
            annotation: r.required_index()?,
            ty: r.required_index()?,
        },
        F::ParameterizedType => RawConst::ParameterizedType {
            base: r.required_index()?,
            params: r.indices()?,
        },
        F::VirtualChildType => RawConst::VirtualChildType {
            parent: r.required_index()?,
            name: r.required_index()?,
            this_ref: r.bool()?,
        },
        F::InnerChildType | F::AnonymousClassType => RawConst::ChildType {
            format,
            parent: r.required_index()?,
            class: r.required_index()?,
        },
        F::PropertyClassType => RawConst::PropertyClassType {
            parent: r.required_index()?,
            property: r.required_index()?,
        },
        F::IntersectionType | F::UnionType | F::DifferenceType => RawConst::Relational {
            format,
            first: r.required_index()?,
            second: r.required_index()?,
        },
        F::RecursiveType => RawConst::RecursiveType {
            typedef: r.required_index()?,
        },

        F::ConditionNot => RawConst::ConditionNot {
            cond: r.required_index()?,
        },
        F::ConditionAll | F::ConditionAny => RawConst::Conditions {
            format,
            conds: r.indices()?,
        },
        F::ConditionNamed => RawConst::ConditionNamed {
            name: r.required_index()?,
        },
        F::ConditionPresent => RawConst::ConditionPresent {
            identity: r.required_index()?,
        },
        F::ConditionVersionMatches => RawConst::ConditionVersionMatches {
            module: r.required_index()?,
            version: r.required_index()?,
        },
        F::ConditionVersioned => RawConst::ConditionVersioned {
            version: r.required_index()?,
        },

        F::FileStore
        | F::FSDir
        | F::FSFile
        | F::FSLink
        | F::ResponseSender
        | F::Register
        | F::BindTarget
        | F::UnresolvedName
        | F::DeferredValue
        | F::NativeClass
        | F::UnresolvedType
        | F::CastType => {
            return Err(WireError::new(
                WireErrorKind::Unsupported(format),
                r.position(),
            ))
        }
    };
    Ok(record)
}

fn decode_int(format: ConstFormat, r: &mut Reader<'_>) -> Result<RawConst, WireError> {
    let start = r.position();
    let width = IntWidth::of(format).unwrap_or(IntWidth::Signed(64));
    let value = match width {
        IntWidth::Byte { .. } => PackedInt::Small(i64::from(r.u8()?)),
        IntWidth::SignedByte => PackedInt::Small(i64::from(r.i8()?)),
        IntWidth::Signed(_) | IntWidth::Unsigned(_) => r.packed()?,
    };
    if !width.contains(&value) {
        return Err(WireError::new(
            WireErrorKind::IntOutOfRange { format, value },
            start,
        ));
    }
    Ok(RawConst::Int { format, value })
}

fn register(r: &mut Reader<'_>) -> Result<u32, WireError> {
    let start = r.position();
    let n = r.magnitude()?;
    u32::try_from(n).map_err(|_| {
        WireError::new(
            WireErrorKind::BadLength(i64::try_from(n).unwrap_or(i64::MAX)),
            start,
        )
    })
}

impl RawConst {
    pub fn format(&self) -> ConstFormat {
        use ConstFormat as F;

        match self {
            RawConst::Literal { format, .. }
            | RawConst::Int { format, .. }
            | RawConst::FloatBits { format, .. }
            | RawConst::Singleton { format, .. }
            | RawConst::Aggregate { format, .. }
            | RawConst::Range { format, .. }
            | RawConst::Named { format, .. }
            | RawConst::Wrapped { format, .. }
            | RawConst::ChildType { format, .. }
            | RawConst::Relational { format, .. }
            | RawConst::Conditions { format, .. }
            | RawConst::Keyword(format) => *format,
            RawConst::Char(_) => F::Char,
            RawConst::String(_) => F::String,
            RawConst::Bytes(_) => F::UInt8Array,
            RawConst::MapEntry { .. } => F::MapEntry,
            RawConst::Map { .. } => F::Map,
            RawConst::Any { .. } => F::Any,
            RawConst::Module { .. } => F::Module,
            RawConst::Method { .. } => F::Method,
            RawConst::Annotation { .. } => F::Annotation,
            RawConst::ThisClass { .. } => F::ThisClass,
            RawConst::ParentClass { .. } => F::ParentClass,
            RawConst::ChildClass { .. } => F::ChildClass,
            RawConst::TypeParameter { .. } => F::TypeParameter,
            RawConst::FormalTypeChild { .. } => F::FormalTypeChild,
            RawConst::DynamicFormal { .. } => F::DynamicFormal,
            RawConst::Signature { .. } => F::Signature,
            RawConst::DecoratedClass { .. } => F::DecoratedClass,
            RawConst::TerminalType { .. } => F::TerminalType,
            RawConst::AccessType { .. } => F::AccessType,
            RawConst::AnnotatedType { .. } => F::AnnotatedType,
            RawConst::ParameterizedType { .. } => F::ParameterizedType,
            RawConst::VirtualChildType { .. } => F::VirtualChildType,
            RawConst::PropertyClassType { .. } => F::PropertyClassType,
            RawConst::RecursiveType { .. } => F::RecursiveType,
            RawConst::ConditionNot { .. } => F::ConditionNot,
            RawConst::ConditionNamed { .. } => F::ConditionNamed,
            RawConst::ConditionPresent { .. } => F::ConditionPresent,
            RawConst::ConditionVersionMatches { .. } => F::ConditionVersionMatches,
            RawConst::ConditionVersioned { .. } => F::ConditionVersioned,
        }
    }

    /// Every pool slot this record refers to, in payload order.
    pub fn references(&self) -> SmallVec<[u32; 4]> {
        let mut refs = SmallVec::new();
        match self {
            RawConst::Int { .. }
            | RawConst::FloatBits { .. }
            | RawConst::Char(_)
            | RawConst::String(_)
            | RawConst::Bytes(_)
            | RawConst::Keyword(_) => {}
            RawConst::Literal { text: a, .. }
            | RawConst::Singleton { class: a, .. }
            | RawConst::Any { ty: a }
            | RawConst::Module { name: a }
            | RawConst::ThisClass { class: a }
            | RawConst::ParentClass { child: a }
            | RawConst::DecoratedClass { ty: a }
            | RawConst::TerminalType { def: a }
            | RawConst::Wrapped { ty: a, .. }
            | RawConst::AccessType { ty: a, .. }
            | RawConst::RecursiveType { typedef: a }
            | RawConst::ConditionNot { cond: a }
            | RawConst::ConditionNamed { name: a }
            | RawConst::ConditionPresent { identity: a }
            | RawConst::ConditionVersioned { version: a } => refs.push(*a),
            RawConst::Range { first: a, last: b, .. }
            | RawConst::Named { parent: a, name: b, .. }
            | RawConst::Method {
                multi: a,
                signature: b,
                ..
            }
            | RawConst::ChildClass { parent: a, name: b }
            | RawConst::FormalTypeChild { parent: a, name: b }
            | RawConst::AnnotatedType {
                annotation: a,
                ty: b,
            }
            | RawConst::VirtualChildType {
                parent: a, name: b, ..
            }
            | RawConst::ChildType {
                parent: a,
                class: b,
                ..
            }
            | RawConst::PropertyClassType {
                parent: a,
                property: b,
            }
            | RawConst::Relational {
                first: a,
                second: b,
                ..
            }
            | RawConst::TypeParameter {
                method: a, name: b, ..
            }
            | RawConst::ConditionVersionMatches {
                module: a,
                version: b,
            } => refs.extend([*a, *b]),
            RawConst::MapEntry { ty, key, value } => refs.extend([*ty, *key, *value]),
            RawConst::DynamicFormal {
                ty, formal, name, ..
            } => refs.extend([*ty, *formal, *name]),
            RawConst::Aggregate { ty, values, .. } => {
                refs.push(*ty);
                refs.extend(values.iter().copied());
            }
            RawConst::Map { ty, entries } => {
                refs.push(*ty);
                for (k, v) in entries {
                    refs.extend([*k, *v]);
                }
            }
            RawConst::Annotation { class, args } => {
                refs.push(*class);
                refs.extend(args.iter().copied());
            }
            RawConst::Signature {
                name,
                params,
                returns,
            } => {
                refs.push(*name);
                refs.extend(params.iter().chain(returns).copied());
            }
            RawConst::ParameterizedType { base, params } => {
                refs.push(*base);
                refs.extend(params.iter().copied());
            }
            RawConst::Conditions { conds, .. } => refs.extend(conds.iter().copied()),
        }
        refs
    }

    /// Write the tag byte and payload.
    pub fn encode(&self, w: &mut Writer) {
        w.u8(self.format().tag());
        match self {
            RawConst::Literal { text, .. } => {
                w.required_index(*text);
            }
            RawConst::Int { format, value } => match IntWidth::of(*format) {
                Some(IntWidth::Byte { .. } | IntWidth::SignedByte) => {
                    let low = value.to_be_bytes().last().copied().unwrap_or_default();
                    w.u8(low);
                }
                _ => {
                    w.packed(value);
                }
            },
            RawConst::FloatBits { format, bits } => {
                if float_width(*format).is_some() {
                    w.bytes(bits);
                } else {
                    w.byte_array(bits);
                }
            }
            RawConst::Char(ch) => {
                w.packed_i64(i64::from(u32::from(*ch)));
            }
            RawConst::String(text) => {
                w.utf8(text);
            }
            RawConst::Bytes(bytes) => {
                w.byte_array(bytes);
            }
            RawConst::Aggregate { ty, values, .. } => {
                w.required_index(*ty).indices(values);
            }
            RawConst::MapEntry { ty, key, value } => {
                w.required_index(*ty)
                    .required_index(*key)
                    .required_index(*value);
            }
            RawConst::Map { ty, entries } => {
                w.required_index(*ty).magnitude(entries.len());
                for (k, v) in entries {
                    w.required_index(*k).required_index(*v);
                }
            }
            RawConst::Range {
                format,
                first,
                last,
                lower_exclusive,
                upper_exclusive,
            } => {
                if *format == ConstFormat::Range {
                    w.u8(u8::from(*lower_exclusive) | (u8::from(*upper_exclusive) << 1));
                }
                w.required_index(*first).required_index(*last);
            }
            RawConst::Method {
                multi,
                signature,
                lambda,
            } => {
                w.required_index(*multi)
                    .required_index(*signature)
                    .bool(*lambda);
            }
            RawConst::Annotation { class, args } => {
                w.required_index(*class).indices(args);
            }
            RawConst::TypeParameter {
                method,
                register,
                name,
            } => {
                w.required_index(*method)
                    .required_index(*register)
                    .required_index(*name);
            }
            RawConst::DynamicFormal {
                ty,
                register,
                formal,
                name,
            } => {
                w.required_index(*ty)
                    .required_index(*register)
                    .required_index(*formal)
                    .required_index(*name);
            }
            RawConst::Signature {
                name,
                params,
                returns,
            } => {
                w.required_index(*name).indices(params).indices(returns);
            }
            RawConst::Keyword(_) => {}
            RawConst::AccessType { ty, access } => {
                w.required_index(*ty).access(*access);
            }
            RawConst::ParameterizedType { base, params } => {
                w.required_index(*base).indices(params);
            }
            RawConst::VirtualChildType {
                parent,
                name,
                this_ref,
            } => {
                w.required_index(*parent)
                    .required_index(*name)
                    .bool(*this_ref);
            }
            RawConst::Conditions { conds, .. } => {
                w.indices(conds);
            }
            RawConst::Singleton { .. }
            | RawConst::Any { .. }
            | RawConst::Module { .. }
            | RawConst::Named { .. }
            | RawConst::ThisClass { .. }
            | RawConst::ParentClass { .. }
            | RawConst::ChildClass { .. }
            | RawConst::FormalTypeChild { .. }
            | RawConst::DecoratedClass { .. }
            | RawConst::TerminalType { .. }
            | RawConst::Wrapped { .. }
            | RawConst::AnnotatedType { .. }
            | RawConst::ChildType { .. }
            | RawConst::PropertyClassType { .. }
            | RawConst::Relational { .. }
            | RawConst::RecursiveType { .. }
            | RawConst::ConditionNot { .. }
            | RawConst::ConditionNamed { .. }
            | RawConst::ConditionPresent { .. }
            | RawConst::ConditionVersionMatches { .. }
            | RawConst::ConditionVersioned { .. } => {
                // payload is exactly the references, in order
                for index in self.references() {
                    w.required_index(index);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

//! The two-arena constant pool.

use rayon::prelude::*;
use xtc_ir::{ConstFormat, ConstId, Name, Span, StringInterner};
use xtc_wire::{decode_const, RawConst, Reader};

use crate::{Const, PoolError, Version};

#[derive(Debug)]
pub struct Pool {
    raw: Vec<RawConst>,
    /// Byte range of each entry in the module file.
    spans: Vec<Span>,
    resolved: Option<Box<[Const]>>,
}

impl Pool {
    /// Decode the entry count and every record, without resolving anything.
    #[tracing::instrument(level = "debug", skip_all, fields(offset = r.position()))]
    pub fn parse(r: &mut Reader<'_>) -> Result<Pool, PoolError> {
        let count = r.count()?;
        let mut raw = Vec::with_capacity(count);
        let mut spans = Vec::with_capacity(count);
        for index in 0..count {
            let start = r.position();
            let (record, len) = decode_const(r)?;
            tracing::trace!(index, format = %record.format(), len, "constant");
            spans.push(r.span_from(start));
            raw.push(record);
        }
        tracing::debug!(entries = count, "parsed constant pool");
        Ok(Pool {
            raw,
            spans,
            resolved: None,
        })
    }

    /// Pool of already decoded records with no file position.
    pub fn from_records(raw: Vec<RawConst>) -> Pool {
        let spans = vec![Span::DUMMY; raw.len()];
        Pool {
            raw,
            spans,
            resolved: None,
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Map every raw record to its resolved form.
    ///
    /// Entries are resolved in parallel; the reported error is the one of
    /// the lowest failing index. Calling this again after success does
    /// nothing.
    #[tracing::instrument(level = "debug", skip_all, fields(entries = self.raw.len()))]
    pub fn resolve(&mut self, interner: &StringInterner) -> Result<(), PoolError> {
        if self.resolved.is_some() {
            tracing::trace!("already resolved");
            return Ok(());
        }
        let results: Vec<Result<Const, PoolError>> = self
            .raw
            .par_iter()
            .zip(self.spans.par_iter())
            .map(|(record, &span)| {
                Resolver {
                    raw: &self.raw,
                    span,
                    interner,
                }
                .resolve(record)
            })
            .collect();
        let resolved = results.into_iter().collect::<Result<Box<[_]>, _>>()?;
        self.resolved = Some(resolved);
        Ok(())
    }

    /// Resolved entry by wire index; `-1` is no entry.
    pub fn get(&self, index: i64) -> Result<Option<&Const>, PoolError> {
        if index == -1 {
            return Ok(None);
        }
        let resolved = self.resolved.as_deref().ok_or(PoolError::Unresolved)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| resolved.get(i))
            .map(Some)
            .ok_or(PoolError::IndexOutOfRange {
                index,
                len: self.raw.len(),
                span: None,
            })
    }

    /// Checked id for a wire index read outside the pool; `-1` is `None`.
    pub fn id(&self, index: i64, span: Span) -> Result<Option<ConstId>, PoolError> {
        if index == -1 {
            return Ok(None);
        }
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.raw.len())
            .map(|i| Some(ConstId::from_usize(i)))
            .ok_or(PoolError::IndexOutOfRange {
                index,
                len: self.raw.len(),
                span: Some(span),
            })
    }

    /// Checked id for a required wire index.
    pub fn checked(&self, index: u32, span: Span) -> Result<ConstId, PoolError> {
        if (index as usize) < self.raw.len() {
            Ok(ConstId::from_raw(index))
        } else {
            Err(PoolError::IndexOutOfRange {
                index: i64::from(index),
                len: self.raw.len(),
                span: Some(span),
            })
        }
    }

    /// Resolved entry of an id handed out by this pool.
    ///
    /// # Panics
    /// Panics if the pool is unresolved or `id` belongs to another pool.
    #[inline]
    pub fn entry(&self, id: ConstId) -> &Const {
        match &self.resolved {
            Some(resolved) => &resolved[id.index()],
            None => panic!("constant pool has not been resolved"),
        }
    }

    pub fn raw(&self, id: ConstId) -> Option<&RawConst> {
        self.raw.get(id.index())
    }

    pub fn span(&self, id: ConstId) -> Span {
        self.spans.get(id.index()).copied().unwrap_or(Span::DUMMY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstId, &Const)> {
        self.resolved
            .iter()
            .flat_map(|entries| entries.iter())
            .enumerate()
            .map(|(i, c)| (ConstId::from_usize(i), c))
    }

    /// Simple name of an identity record: a module's qualified name, a
    /// component's own name, a method's multi-method name.
    ///
    /// Resolution only admits a MultiMethod behind a method and a non-type
    /// record behind a terminal type, so this never loops.
    pub fn name_of(&self, id: ConstId) -> Option<Name> {
        match self.entry(id) {
            Const::Method { multi, .. } => self.name_of(*multi),
            Const::TerminalType { def } => self.name_of(*def),
            other => other.own_name(),
        }
    }

    /// The text of a String record.
    pub fn string(&self, id: ConstId) -> Option<Name> {
        match self.entry(id) {
            Const::String(name) => Some(*name),
            _ => None,
        }
    }

    pub fn version(&self, id: ConstId) -> Option<&Version> {
        match self.entry(id) {
            Const::Version(version) => Some(version),
            _ => None,
        }
    }
}

/// Resolution context of a single entry.
struct Resolver<'a> {
    raw: &'a [RawConst],
    span: Span,
    interner: &'a StringInterner,
}

impl Resolver<'_> {
    fn id(&self, index: u32) -> Result<ConstId, PoolError> {
        if (index as usize) < self.raw.len() {
            Ok(ConstId::from_raw(index))
        } else {
            Err(PoolError::IndexOutOfRange {
                index: i64::from(index),
                len: self.raw.len(),
                span: Some(self.span),
            })
        }
    }

    /// A reference that must point at a record whose format satisfies
    /// `fits`.
    fn id_of(
        &self,
        index: u32,
        expected: &'static str,
        fits: impl Fn(ConstFormat) -> bool,
    ) -> Result<ConstId, PoolError> {
        let id = self.id(index)?;
        let found = self.raw[id.index()].format();
        if fits(found) {
            Ok(id)
        } else {
            Err(PoolError::WrongKind {
                index,
                expected,
                found,
                span: self.span,
            })
        }
    }

    fn ids<C: FromIterator<ConstId>>(&self, indices: &[u32]) -> Result<C, PoolError> {
        indices.iter().map(|&i| self.id(i)).collect()
    }

    fn text(&self, index: u32) -> Result<&str, PoolError> {
        match &self.raw[self.id(index)?.index()] {
            RawConst::String(text) => Ok(text),
            other => Err(PoolError::WrongKind {
                index,
                expected: "a String",
                found: other.format(),
                span: self.span,
            }),
        }
    }

    fn name(&self, index: u32) -> Result<Name, PoolError> {
        Ok(self.interner.try_intern(self.text(index)?)?)
    }

    fn resolve(&self, record: &RawConst) -> Result<Const, PoolError> {
        Ok(match record {
            RawConst::Literal {
                format: ConstFormat::Version,
                text,
            } => {
                let text = self.text(*text)?;
                Const::Version(
                    Version::parse(text).map_err(|reason| PoolError::BadVersion {
                        text: text.to_owned(),
                        reason,
                        span: self.span,
                    })?,
                )
            }
            RawConst::Literal { format, text } => Const::Literal {
                format: *format,
                text: self.name(*text)?,
            },
            RawConst::Int { format, value } => Const::Int {
                format: *format,
                value: value.clone(),
            },
            RawConst::FloatBits { format, bits } => Const::FloatBits {
                format: *format,
                bits: bits.as_slice().into(),
            },
            RawConst::Char(ch) => Const::Char(*ch),
            RawConst::String(text) => Const::String(self.interner.try_intern(text)?),
            RawConst::Singleton { format, class } => Const::Singleton {
                format: *format,
                class: self.id(*class)?,
            },
            RawConst::Aggregate { format, ty, values } => Const::Aggregate {
                format: *format,
                ty: self.id(*ty)?,
                values: self.ids(values)?,
            },
            RawConst::Bytes(bytes) => Const::Bytes(bytes.as_slice().into()),
            RawConst::MapEntry { ty, key, value } => Const::MapEntry {
                ty: self.id(*ty)?,
                key: self.id(*key)?,
                value: self.id(*value)?,
            },
            RawConst::Map { ty, entries } => Const::Map {
                ty: self.id(*ty)?,
                entries: entries
                    .iter()
                    .map(|&(k, v)| Ok((self.id(k)?, self.id(v)?)))
                    .collect::<Result<_, PoolError>>()?,
            },
            RawConst::Range {
                format,
                first,
                last,
                lower_exclusive,
                upper_exclusive,
            } => Const::Range {
                format: *format,
                first: self.id(*first)?,
                last: self.id(*last)?,
                lower_exclusive: *lower_exclusive,
                upper_exclusive: *upper_exclusive,
            },
            RawConst::Any { ty } => Const::Any { ty: self.id(*ty)? },
            RawConst::Module { name } => Const::Module {
                name: self.name(*name)?,
            },
            RawConst::Named {
                format,
                parent,
                name,
            } => Const::Named {
                format: *format,
                parent: self.id(*parent)?,
                name: self.name(*name)?,
            },
            RawConst::Method {
                multi,
                signature,
                lambda,
            } => Const::Method {
                multi: self.id_of(*multi, "a MultiMethod", |f| f == ConstFormat::MultiMethod)?,
                signature: self.id_of(*signature, "a Signature", |f| {
                    f == ConstFormat::Signature
                })?,
                lambda: *lambda,
            },
            RawConst::Annotation { class, args } => Const::Annotation {
                class: self.id(*class)?,
                args: self.ids(args)?,
            },
            RawConst::ThisClass { class } => Const::ThisClass {
                class: self.id(*class)?,
            },
            RawConst::ParentClass { child } => Const::ParentClass {
                child: self.id(*child)?,
            },
            RawConst::ChildClass { parent, name } => Const::ChildClass {
                parent: self.id(*parent)?,
                name: self.name(*name)?,
            },
            RawConst::TypeParameter {
                method,
                register,
                name,
            } => Const::TypeParameter {
                method: self.id(*method)?,
                register: *register,
                name: self.name(*name)?,
            },
            RawConst::FormalTypeChild { parent, name } => Const::FormalTypeChild {
                parent: self.id(*parent)?,
                name: self.name(*name)?,
            },
            RawConst::DynamicFormal {
                ty,
                register,
                formal,
                name,
            } => Const::DynamicFormal {
                ty: self.id(*ty)?,
                register: *register,
                formal: self.id(*formal)?,
                name: self.name(*name)?,
            },
            RawConst::Signature {
                name,
                params,
                returns,
            } => Const::Signature {
                name: self.name(*name)?,
                params: self.ids(params)?,
                returns: self.ids(returns)?,
            },
            RawConst::DecoratedClass { ty } => Const::DecoratedClass { ty: self.id(*ty)? },
            RawConst::Keyword(format) => Const::Keyword(*format),
            RawConst::TerminalType { def } => Const::TerminalType {
                def: self.id_of(*def, "a type definition", |f| !f.is_type())?,
            },
            RawConst::Wrapped { format, ty } => Const::Wrapped {
                format: *format,
                ty: self.id(*ty)?,
            },
            RawConst::AccessType { ty, access } => Const::AccessType {
                ty: self.id(*ty)?,
                access: *access,
            },
            RawConst::AnnotatedType { annotation, ty } => Const::AnnotatedType {
                annotation: self.id(*annotation)?,
                ty: self.id(*ty)?,
            },
            RawConst::ParameterizedType { base, params } => Const::ParameterizedType {
                base: self.id(*base)?,
                params: self.ids(params)?,
            },
            RawConst::VirtualChildType {
                parent,
                name,
                this_ref,
            } => Const::VirtualChildType {
                parent: self.id(*parent)?,
                name: self.name(*name)?,
                this_ref: *this_ref,
            },
            RawConst::ChildType {
                format,
                parent,
                class,
            } => Const::ChildType {
                format: *format,
                parent: self.id(*parent)?,
                class: self.id(*class)?,
            },
            RawConst::PropertyClassType { parent, property } => Const::PropertyClassType {
                parent: self.id(*parent)?,
                property: self.id(*property)?,
            },
            RawConst::Relational {
                format,
                first,
                second,
            } => Const::Relational {
                format: *format,
                first: self.id(*first)?,
                second: self.id(*second)?,
            },
            RawConst::RecursiveType { typedef } => Const::RecursiveType {
                typedef: self.id_of(*typedef, "a Typedef", |f| f == ConstFormat::Typedef)?,
            },
            RawConst::ConditionNot { cond } => Const::ConditionNot {
                cond: self.id(*cond)?,
            },
            RawConst::Conditions { format, conds } => Const::Conditions {
                format: *format,
                conds: self.ids(conds)?,
            },
            RawConst::ConditionNamed { name } => Const::ConditionNamed {
                name: self.name(*name)?,
            },
            RawConst::ConditionPresent { identity } => Const::ConditionPresent {
                identity: self.id(*identity)?,
            },
            RawConst::ConditionVersionMatches { module, version } => {
                Const::ConditionVersionMatches {
                    module: self.id(*module)?,
                    version: self.id(*version)?,
                }
            }
            RawConst::ConditionVersioned { version } => Const::ConditionVersioned {
                version: self.id(*version)?,
            },
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

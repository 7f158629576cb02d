//! Component tree arena and its builder.
//!
//! Children are read eagerly and depth first: each component record is
//! followed by the byte length of its nested children, and a non-zero length
//! means the nested list comes next.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use xtc_ir::{
    Access, ComponentFlags, ComponentFormat, ConstFormat, ConstId, ModuleKind, Name, PartId, Span,
    StringLookup,
};
use xtc_pool::{Const, Pool, Version};
use xtc_stack::ensure_sufficient_stack;
use xtc_wire::Reader;

use crate::contrib::{optional, required};
use crate::part::{
    AllowedVersion, ClassInfo, MethodInfo, ModuleInfo, ModuleVersions, Parameter, PropertyInfo,
    SourceLines, SuperCall,
};
use crate::{Contrib, Part, PartKind, TreeError};

/// All parts of one module file; [`PartId::ROOT`] is the File node.
#[derive(Clone, Debug)]
pub struct PartTree {
    parts: Vec<Part>,
}

impl PartTree {
    pub fn new() -> Self {
        PartTree {
            parts: vec![Part {
                parent: None,
                name: Name::EMPTY,
                identity: None,
                flags: ComponentFlags::encode(ComponentFormat::File, Access::Public),
                contribs: Vec::new(),
                span: Span::DUMMY,
                kind: PartKind::File,
                kids: FxHashMap::default(),
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[inline]
    pub fn get(&self, id: PartId) -> &Part {
        &self.parts[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.parts
            .iter()
            .enumerate()
            .map(|(i, part)| (PartId::from_usize(i), part))
    }

    /// Direct child by exact name.
    pub fn kid(&self, parent: PartId, name: Name) -> Option<PartId> {
        self.get(parent).kids.get(&name).copied()
    }

    /// Children in no particular order.
    pub fn kids(&self, parent: PartId) -> impl Iterator<Item = (Name, PartId)> + '_ {
        self.get(parent).kids.iter().map(|(&name, &id)| (name, id))
    }

    /// Children sorted by part id, which is file order.
    pub fn kids_in_order(&self, parent: PartId) -> SmallVec<[PartId; 8]> {
        let mut kids: SmallVec<[PartId; 8]> = self.get(parent).kids.values().copied().collect();
        kids.sort_unstable();
        kids
    }

    /// A method and every overload after it.
    pub fn overloads(&self, head: PartId) -> impl Iterator<Item = PartId> + '_ {
        std::iter::successors(Some(head), |&id| {
            self.get(id).as_method().and_then(|m| m.next_sibling)
        })
    }

    /// Dotted path of names from the file root, e.g. `Shapes.Point.x`.
    pub fn path(&self, id: PartId, names: &impl StringLookup) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let part = self.get(current);
            if !matches!(part.kind, PartKind::File) {
                segments.push(names.lookup(part.name));
            }
            cursor = part.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    fn push(&mut self, part: Part) -> PartId {
        let id = PartId::from_usize(self.parts.len());
        self.parts.push(part);
        id
    }

    /// Insert `kid` into its parent's name map.
    ///
    /// A second kid of the same name is an error, except for methods under
    /// a multi-method, which join the end of the overload chain.
    pub fn put_kid(
        &mut self,
        parent: PartId,
        kid: PartId,
        names: &impl StringLookup,
    ) -> Result<(), TreeError> {
        let name = self.get(kid).name;
        let Some(&head) = self.get(parent).kids.get(&name) else {
            self.parts[parent.index()].kids.insert(name, kid);
            return Ok(());
        };

        let overloading = matches!(self.get(parent).kind, PartKind::MultiMethod)
            && matches!(self.get(kid).kind, PartKind::Method(_));
        if !overloading {
            return Err(TreeError::DuplicateName {
                name: names.lookup(name).to_owned(),
                parent: self.describe(parent, names),
                span: self.get(kid).span,
            });
        }

        let tail = self.overloads(head).last().unwrap_or(head);
        if let PartKind::Method(info) = &mut self.parts[tail.index()].kind {
            info.next_sibling = Some(kid);
        }
        Ok(())
    }

    fn describe(&self, id: PartId, names: &impl StringLookup) -> String {
        match self.get(id).kind {
            PartKind::File => "the file".to_owned(),
            _ => self.path(id, names),
        }
    }
}

impl Default for PartTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter and return types of a signature record.
type SignatureTypes = (SmallVec<[ConstId; 4]>, SmallVec<[ConstId; 2]>);

/// Reads component records into a [`PartTree`].
pub(crate) struct TreeBuilder<'a, 'b, N> {
    pub r: &'a mut Reader<'b>,
    pub pool: &'a Pool,
    pub names: &'a N,
    pub tree: PartTree,
}

impl<N: StringLookup> TreeBuilder<'_, '_, N> {
    /// Read a child count and that many components under `owner`.
    #[tracing::instrument(level = "trace", skip(self), fields(offset = self.r.position()))]
    pub fn parse_kids(&mut self, owner: PartId) -> Result<(), TreeError> {
        let count = self.r.count()?;
        for _ in 0..count {
            self.parse_component(owner)?;
        }
        Ok(())
    }

    fn parse_component(&mut self, owner: PartId) -> Result<PartId, TreeError> {
        let start = self.r.position();
        let first = self.r.u8()?;
        if first & 0x80 != 0 {
            return Err(TreeError::ConditionalComponent {
                span: self.r.span_from(start),
            });
        }
        let second = self.r.u8()?;
        let flags = ComponentFlags::from_bits_retain(u16::from_be_bytes([first, second]));
        let format = flags.format();

        let identity_at = self.r.position();
        let identity = self.r.magnitude()?;
        let identity_span = self.r.span_from(identity_at);
        let identity = self
            .pool
            .checked(u32::try_from(identity).unwrap_or(u32::MAX), identity_span)?;
        let name = self.check_identity(format, identity, owner, self.r.span_from(start))?;

        let contribs = Contrib::parse_list(self.r, self.pool)?;
        let kind = self.parse_body(format, identity, start)?;
        let span = self.r.span_from(start);
        tracing::trace!(%format, name = self.names.lookup(name), "component");

        let id = self.tree.push(Part {
            parent: Some(owner),
            name,
            identity: Some(identity),
            flags,
            contribs,
            span,
            kind,
            kids: FxHashMap::default(),
        });
        self.tree.put_kid(owner, id, self.names)?;

        let declared = self.r.magnitude()?;
        if declared > 0 {
            let begin = self.r.position();
            ensure_sufficient_stack(|| self.parse_kids(id))?;
            let consumed = self.r.position() - begin;
            if consumed != declared {
                return Err(TreeError::NestedLength {
                    declared,
                    consumed,
                    span: self.r.span_from(begin),
                });
            }
        }
        Ok(id)
    }

    /// Check that the identity record fits the component format and the
    /// owner, and return the component's name.
    fn check_identity(
        &self,
        format: ComponentFormat,
        identity: ConstId,
        owner: PartId,
        span: Span,
    ) -> Result<Name, TreeError> {
        let entry = self.pool.entry(identity);
        let expected = match format {
            ComponentFormat::Module => ConstFormat::Module,
            ComponentFormat::Package => ConstFormat::Package,
            ComponentFormat::Typedef => ConstFormat::Typedef,
            ComponentFormat::Property => ConstFormat::Property,
            ComponentFormat::MultiMethod => ConstFormat::MultiMethod,
            ComponentFormat::Method => ConstFormat::Method,
            ComponentFormat::ReservedC | ComponentFormat::ReservedD | ComponentFormat::File => {
                return Err(TreeError::UnexpectedComponent { format, span });
            }
            _ => ConstFormat::Class,
        };
        if entry.format() != expected {
            return Err(TreeError::WrongIdentity {
                format,
                found: entry.format(),
                span,
            });
        }

        let parent = self.tree.get(owner).format();
        let is_method = format == ComponentFormat::Method;
        let under_multi = parent == ComponentFormat::MultiMethod;
        let misplaced = is_method != under_multi
            || (format == ComponentFormat::Module) != (parent == ComponentFormat::File);
        if misplaced {
            return Err(TreeError::Misplaced {
                format,
                parent,
                span,
            });
        }

        self.pool.name_of(identity).ok_or(TreeError::WrongIdentity {
            format,
            found: entry.format(),
            span,
        })
    }

    fn parse_body(
        &mut self,
        format: ComponentFormat,
        identity: ConstId,
        start: usize,
    ) -> Result<PartKind, TreeError> {
        Ok(match format {
            ComponentFormat::Module => PartKind::Module(self.parse_module(start)?),
            ComponentFormat::Package => PartKind::Package {
                import: self.module_ref()?,
            },
            ComponentFormat::Typedef => PartKind::Typedef {
                ty: required(self.r, self.pool)?,
            },
            ComponentFormat::Property => PartKind::Property(self.parse_property(start)?),
            ComponentFormat::MultiMethod => PartKind::MultiMethod,
            ComponentFormat::Method => PartKind::Method(self.parse_method(identity, start)?),
            _ => PartKind::Class(self.parse_class()?),
        })
    }

    fn module_ref(&mut self) -> Result<Option<ConstId>, TreeError> {
        let at = self.r.position();
        let Some(id) = optional(self.r, self.pool)? else {
            return Ok(None);
        };
        match self.pool.entry(id) {
            Const::Module { .. } => Ok(Some(id)),
            other => Err(TreeError::WrongConstant {
                expected: "a module",
                found: other.format(),
                span: self.r.span_from(at),
            }),
        }
    }

    fn version(&mut self) -> Result<Version, TreeError> {
        let at = self.r.position();
        let id = required(self.r, self.pool)?;
        self.pool
            .version(id)
            .cloned()
            .ok_or(TreeError::WrongConstant {
                expected: "a version",
                found: self.pool.entry(id).format(),
                span: self.r.span_from(at),
            })
    }

    fn parse_module(&mut self, start: usize) -> Result<ModuleInfo, TreeError> {
        let tag = self.r.u8()?;
        let kind = ModuleKind::from_tag(tag).ok_or(TreeError::BadTag {
            what: "module kind",
            tag,
            span: self.r.span_from(start),
        })?;

        let versions = if kind.is_fingerprint() {
            let count = self.r.count()?;
            let mut allowed = Vec::with_capacity(count);
            for _ in 0..count {
                let version = self.version()?;
                let exact = self.r.bool()?;
                allowed.push(AllowedVersion { version, exact });
            }
            let count = self.r.count()?;
            let preferred = (0..count)
                .map(|_| self.version())
                .collect::<Result<_, _>>()?;
            ModuleVersions::Fingerprint { allowed, preferred }
        } else if self.r.bool()? {
            ModuleVersions::Declared(Some(self.version()?))
        } else {
            ModuleVersions::Declared(None)
        };

        Ok(ModuleInfo {
            kind,
            versions,
            directory: optional(self.r, self.pool)?,
            timestamp: optional(self.r, self.pool)?,
        })
    }

    fn parse_class(&mut self) -> Result<ClassInfo, TreeError> {
        let count = self.r.count()?;
        let mut type_params = SmallVec::with_capacity(count);
        for _ in 0..count {
            let at = self.r.position();
            let name_id = required(self.r, self.pool)?;
            let name = self.pool.string(name_id).ok_or(TreeError::WrongConstant {
                expected: "a type parameter name",
                found: self.pool.entry(name_id).format(),
                span: self.r.span_from(at),
            })?;
            type_params.push((name, required(self.r, self.pool)?));
        }
        Ok(ClassInfo { type_params })
    }

    fn parse_property(&mut self, start: usize) -> Result<PropertyInfo, TreeError> {
        let access = match self.r.i8()? {
            -1 => None,
            raw => {
                let tag = u8::try_from(raw).unwrap_or(u8::MAX);
                Some(Access::from_tag(tag).ok_or(TreeError::BadTag {
                    what: "property access",
                    tag,
                    span: self.r.span_from(start),
                })?)
            }
        };
        Ok(PropertyInfo {
            access,
            ty: required(self.r, self.pool)?,
            initial: optional(self.r, self.pool)?,
        })
    }

    fn parse_parameter(&mut self) -> Result<Parameter, TreeError> {
        let annotations = self.id_list()?;
        let ty = required(self.r, self.pool)?;
        let name = optional(self.r, self.pool)?.and_then(|id| self.pool.string(id));
        let default = optional(self.r, self.pool)?;
        Ok(Parameter {
            annotations,
            ty,
            name,
            default,
        })
    }

    fn id_list(&mut self) -> Result<Vec<ConstId>, TreeError> {
        let count = self.r.count()?;
        (0..count).map(|_| required(self.r, self.pool)).collect()
    }

    fn parse_method(&mut self, identity: ConstId, start: usize) -> Result<MethodInfo, TreeError> {
        let (sig_params, sig_returns) = self.signature_of(identity, start)?;

        let annotations = self.id_list()?;
        let finally = optional(self.r, self.pool)?;
        let returns = (0..sig_returns.len())
            .map(|_| self.parse_parameter())
            .collect::<Result<Vec<_>, _>>()?;
        let type_param_count = self.r.magnitude()?;
        let default_count = self.r.magnitude()?;

        let count = self.r.count()?;
        if count != sig_params.len() {
            return Err(self.mismatch(
                identity,
                format!(
                    "{count} parameter(s) but the signature has {}",
                    sig_params.len()
                ),
                start,
            ));
        }
        let params = (0..count)
            .map(|_| self.parse_parameter())
            .collect::<Result<Vec<_>, _>>()?;
        if default_count > count {
            return Err(self.mismatch(
                identity,
                format!("{default_count} default(s) for {count} parameter(s)"),
                start,
            ));
        }

        let checks = [
            ("parameter", &params[..], &sig_params[..]),
            ("return", &returns[..], &sig_returns[..]),
        ];
        for (what, declared, signature) in checks {
            if let Some(i) = declared
                .iter()
                .zip(signature.iter())
                .position(|(p, &ty)| p.ty != ty)
            {
                return Err(self.mismatch(
                    identity,
                    format!("{what} {i} has a different type than the signature"),
                    start,
                ));
            }
        }

        let super_call = match optional(self.r, self.pool)? {
            Some(method) => Some(SuperCall {
                method,
                args: self.id_list()?,
            }),
            None => None,
        };
        let locals = self.id_list()?;
        let code = self.r.byte_array()?.into();

        let line_count = self.r.magnitude()?;
        let source = if line_count > 0 {
            let first_line = self.r.magnitude()?;
            let mut lines = Vec::with_capacity(line_count.min(self.r.remaining()));
            for _ in 0..line_count {
                let indent = self.r.magnitude()?;
                lines.push((indent, required(self.r, self.pool)?));
            }
            Some(SourceLines { first_line, lines })
        } else {
            None
        };

        Ok(MethodInfo {
            annotations,
            finally,
            returns,
            params,
            type_param_count,
            default_count,
            super_call,
            locals,
            code,
            source,
            next_sibling: None,
        })
    }

    fn signature_of(&self, identity: ConstId, start: usize) -> Result<SignatureTypes, TreeError> {
        let Const::Method { signature, .. } = self.pool.entry(identity) else {
            return Err(self.mismatch(identity, "identity is not a method".to_owned(), start));
        };
        match self.pool.entry(*signature) {
            Const::Signature {
                params, returns, ..
            } => Ok((params.clone(), returns.clone())),
            other => Err(TreeError::WrongConstant {
                expected: "a signature",
                found: other.format(),
                span: self.pool.span(*signature),
            }),
        }
    }

    fn mismatch(&self, identity: ConstId, detail: String, start: usize) -> TreeError {
        let method = self
            .pool
            .name_of(identity)
            .map_or_else(|| format!("{identity:?}"), |n| self.names.lookup(n).to_owned());
        TreeError::SignatureMismatch {
            method,
            detail,
            span: self.r.span_from(start),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

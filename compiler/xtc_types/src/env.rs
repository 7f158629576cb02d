//! Structural types of linked parts.
//!
//! [`TypeEnv`] borrows a [`LinkSession`] so that every type record it maps
//! is linked the same way the linker links it, and owns the [`TVarPool`]
//! the types live in.
//!
//! Class types and typedefs are memoized. Before a class's fields are
//! gathered its memo slot holds a placeholder leaf; self references see the
//! placeholder, which is unified with the finished struct afterwards. So a
//! `next: Node` field of `Node` ends up as `Node`'s own type.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use xtc_ir::{Composition, ConstFormat, ConstId, FileId, PartRef};
use xtc_part::{LinkSession, MethodInfo, PartKind};
use xtc_pool::Const;
use xtc_stack::ensure_sufficient_stack;

use crate::{Anchor, FieldKey, TVarId, TVarPool, TypeError, TypeErrorKind, UnifyError};

pub struct TypeEnv<'s, 'r> {
    session: &'s mut LinkSession<'r>,
    pool: TVarPool,
    setypes: FxHashMap<PartRef, TVarId>,
    typedefs: FxHashMap<PartRef, TVarId>,
    /// Type records being mapped since the last named type.
    in_progress: FxHashSet<(FileId, ConstId)>,
    errors: Vec<TypeError>,
}

impl<'s, 'r> TypeEnv<'s, 'r> {
    pub fn new(session: &'s mut LinkSession<'r>) -> Self {
        TypeEnv {
            session,
            pool: TVarPool::new(),
            setypes: FxHashMap::default(),
            typedefs: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            errors: Vec::new(),
        }
    }

    pub fn pool(&self) -> &TVarPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TVarPool {
        &mut self.pool
    }

    pub fn session(&mut self) -> &mut LinkSession<'r> {
        &mut *self.session
    }

    /// Compute the type of every class-family part of the repository.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn type_all(&mut self) {
        let repo = self.session.repo();
        for (file_id, file) in repo.files() {
            for (id, part) in file.tree().iter() {
                if part.is_class_family() {
                    self.setype(PartRef::new(file_id, id));
                }
            }
        }
        tracing::debug!(
            classes = self.setypes.len(),
            vars = self.pool.len(),
            errors = self.errors.len(),
            "typed repository"
        );
    }

    /// Structural type of a class-family part.
    ///
    /// Properties become fields of their declared type and every overload
    /// a `Method(name, arity)` lambda field. Fields of extended,
    /// implemented, `into` and incorporated classes are added unless a local
    /// declaration has the same key. Interfaces are open; other classes are
    /// closed.
    #[tracing::instrument(level = "debug", skip_all, fields(class = ?class))]
    pub fn setype(&mut self, class: PartRef) -> TVarId {
        let class = self.session.link(class);
        if let Some(&t) = self.setypes.get(&class) {
            return t;
        }
        let placeholder = self.pool.leaf();
        self.setypes.insert(class, placeholder);

        let fields = ensure_sufficient_stack(|| self.collect_fields(class));
        let open = self.session.repo().part(class).is_interface();
        tracing::trace!(fields = fields.len(), open, "class structure");
        let shape = self.pool.structure(fields, open);
        if let Err(err) = self.pool.unify(placeholder, shape) {
            self.mismatch(class, &err);
        }
        placeholder
    }

    fn collect_fields(&mut self, class: PartRef) -> FxHashMap<FieldKey, TVarId> {
        let repo = self.session.repo();
        let tree = repo.file(class.file).tree();
        let mut fields = FxHashMap::default();

        for kid in tree.kids_in_order(class.part) {
            let kid = PartRef::new(class.file, kid);
            let part = repo.part(kid);
            match &part.kind {
                PartKind::Property(info) => {
                    let ty = self.type_of(kid, info.ty);
                    fields.insert(FieldKey::Property(part.name), ty);
                }
                PartKind::MultiMethod => {
                    let Some(head) = tree.kid(kid.part, part.name) else {
                        continue;
                    };
                    for method in tree.overloads(head) {
                        let method = PartRef::new(class.file, method);
                        if let Some(info) = repo.part(method).as_method() {
                            let lambda = self.method_type(method, info);
                            fields
                                .entry(FieldKey::Method(part.name, info.params.len()))
                                .or_insert(lambda);
                        }
                    }
                }
                _ => {}
            }
        }

        let supers: SmallVec<[PartRef; 4]> = self
            .session
            .link_contribs(class)
            .iter()
            .filter(|c| {
                matches!(
                    c.composition,
                    Composition::Extends
                        | Composition::Implements
                        | Composition::Into
                        | Composition::Incorporates
                )
            })
            .filter_map(|c| c.ty)
            .collect();
        for parent in supers {
            if !repo.part(parent).is_class_family() {
                continue;
            }
            let inherited = self.setype(parent);
            for key in self.pool.fields(inherited) {
                if let Some(ty) = self.pool.field(inherited, key) {
                    fields.entry(key).or_insert(ty);
                }
            }
        }
        fields
    }

    fn method_type(&mut self, method: PartRef, info: &MethodInfo) -> TVarId {
        let params: SmallVec<[TVarId; 4]> = info
            .params
            .iter()
            .map(|p| self.type_of(method, p.ty))
            .collect();
        let returns: SmallVec<[TVarId; 2]> = info
            .returns
            .iter()
            .map(|r| self.type_of(method, r.ty))
            .collect();
        self.pool.lambda(&params, &returns)
    }

    /// Type denoted by a type record of `from`'s file.
    ///
    /// A record that contains itself without passing through a named type
    /// has no structure of its own and maps to a fresh leaf.
    pub fn type_of(&mut self, from: PartRef, id: ConstId) -> TVarId {
        let key = (from.file, id);
        if !self.in_progress.insert(key) {
            tracing::trace!(?id, "self-containing type record");
            return self.pool.leaf();
        }
        let t = ensure_sufficient_stack(|| self.compute_type(from, id));
        self.in_progress.remove(&key);
        t
    }

    fn compute_type(&mut self, from: PartRef, id: ConstId) -> TVarId {
        let repo = self.session.repo();
        let pool = repo.file(from.file).pool();
        match pool.entry(id) {
            Const::TerminalType { def: ty } | Const::RecursiveType { typedef: ty } => {
                self.named_type(from, *ty)
            }
            Const::ParameterizedType { base, .. } => self.type_of(from, *base),
            Const::Wrapped { ty, .. }
            | Const::AccessType { ty, .. }
            | Const::AnnotatedType { ty, .. } => self.type_of(from, *ty),
            Const::Relational {
                format,
                first,
                second,
            } => {
                let format = *format;
                if format == ConstFormat::DifferenceType {
                    self.report(from, TypeErrorKind::Unsupported(format!("{format}")));
                    return self.pool.leaf();
                }
                let a = self.type_of(from, *first);
                let b = self.type_of(from, *second);
                let combined = if format == ConstFormat::UnionType {
                    self.pool.union(a, b)
                } else {
                    self.pool.intersect(a, b)
                };
                combined.unwrap_or_else(|err| {
                    self.mismatch(from, &err);
                    self.pool.leaf()
                })
            }
            Const::TypeParameter { .. }
            | Const::FormalTypeChild { .. }
            | Const::DynamicFormal { .. } => self.pool.leaf(),
            Const::Module { .. }
            | Const::Named { .. }
            | Const::ThisClass { .. }
            | Const::ParentClass { .. }
            | Const::ChildClass { .. }
            | Const::VirtualChildType { .. }
            | Const::ChildType { .. }
            | Const::DecoratedClass { .. }
            | Const::PropertyClassType { .. } => self.named_type(from, id),
            _ => self.pool.base(Anchor::Const {
                file: from.file,
                id,
            }),
        }
    }

    /// Type of the part an identity-like record links to.
    fn named_type(&mut self, from: PartRef, id: ConstId) -> TVarId {
        let repo = self.session.repo();
        let Some(target) = self.session.link_const(from, id) else {
            let pool = repo.file(from.file).pool();
            let name = match pool.name_of(id) {
                Some(name) => repo.name(name).to_owned(),
                None => pool.entry(id).format().to_string(),
            };
            self.report(from, TypeErrorKind::Unresolved { name });
            return self.pool.leaf();
        };
        // Classes and typedefs are memoized, so records met again below
        // them are fresh uses rather than cycles.
        let outer = std::mem::take(&mut self.in_progress);
        let t = match &repo.part(target).kind {
            PartKind::Class(_) => self.setype(target),
            PartKind::Typedef { ty } => self.typedef(target, *ty),
            _ => self.pool.base(Anchor::Part(target)),
        };
        self.in_progress = outer;
        t
    }

    fn typedef(&mut self, typedef: PartRef, ty: ConstId) -> TVarId {
        if let Some(&t) = self.typedefs.get(&typedef) {
            return t;
        }
        let placeholder = self.pool.leaf();
        self.typedefs.insert(typedef, placeholder);
        let body = self.type_of(typedef, ty);
        if let Err(err) = self.pool.unify(placeholder, body) {
            self.mismatch(typedef, &err);
        }
        placeholder
    }

    /// Field labels of a struct type in text order: `name` or `name/arity`.
    pub fn field_labels(&self, t: TVarId) -> Vec<String> {
        let repo = self.session.repo();
        let mut labels: Vec<String> = self
            .pool
            .fields(t)
            .into_iter()
            .map(|key| match key {
                FieldKey::Property(name) => repo.name(name).to_owned(),
                FieldKey::Method(name, arity) => format!("{}/{arity}", repo.name(name)),
            })
            .collect();
        labels.sort_unstable();
        labels
    }

    fn mismatch(&mut self, at: PartRef, err: &UnifyError) {
        let detail = err.render(self.session.repo().interner());
        self.report(at, TypeErrorKind::Mismatch { detail });
    }

    fn report(&mut self, at: PartRef, kind: TypeErrorKind) {
        let repo = self.session.repo();
        let file = repo.file(at.file);
        let error = TypeError {
            kind,
            path: repo.path(at),
            file: file.label().to_owned(),
            span: file.part(at.part).span,
        };
        tracing::debug!(%error, "type error");
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<TypeError> {
        self.errors
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

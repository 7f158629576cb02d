//! Linking: turning pool references into parts across a repository.
//!
//! A [`LinkSession`] borrows a sealed [`Repository`] and keeps every piece of
//! mutable link state itself:
//!
//! - `memo`: part to linked part. A part is mapped to itself before its
//!   innards are linked, which breaks cycles; a fingerprint module is mapped
//!   to the primary module that replaces it. Child lookups go through the
//!   memo, so a substituted kid is seen as its replacement.
//! - `substitutes`: module to the module standing for it, decided once.
//! - `consts`: per `(file, constant)` part a record resolves to, with an
//!   in-progress marker for self-referential records. Resolving a record
//!   never links the part it finds; [`LinkSession::link_const`] links it
//!   afterwards, so lookups that reenter through a part being linked still
//!   find their target.
//! - `contribs`: linked contribution lists of class-family parts.
//!
//! Problems are collected as [`LinkError`]s; linking never stops at the
//! first one. A record that failed to resolve keeps its failures, and every
//! other part referencing it gets them reported against itself.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use xtc_ir::{Composition, ConstFormat, ConstId, FileId, ModuleKind, Name, PartId, PartRef};
use xtc_pool::Const;
use xtc_stack::ensure_sufficient_stack;

use crate::{ContribData, LinkError, LinkErrorKind, ModuleVersions, PartKind, Repository};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    /// Collected errors beyond this many are counted but not kept.
    pub error_limit: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig { error_limit: 50 }
    }
}

/// A contribution with its references linked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedContrib {
    pub composition: Composition,
    /// The contributed class; `None` when it did not link.
    pub ty: Option<PartRef>,
    /// Annotation class or delegate property.
    pub data: Option<PartRef>,
    /// `Incorporates` parameter bindings, by parameter name.
    pub bindings: FxHashMap<Name, Option<PartRef>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ConstLink {
    InProgress,
    Done(Option<PartRef>),
}

/// A failure met while resolving a record, kept for later referrers.
#[derive(Clone, Debug)]
struct Failure {
    /// Record whose resolution reported it.
    origin: ConstId,
    kind: LinkErrorKind,
}

/// A record being resolved on behalf of `from`.
struct Resolution {
    from: PartRef,
    id: ConstId,
    failures: Vec<Failure>,
}

/// Outcome of looking for a replacement of a part.
enum LinkAs {
    Itself,
    Substitute(PartRef),
    /// A fingerprint with no acceptable primary.
    Failed,
}

pub struct LinkSession<'r> {
    repo: &'r Repository,
    config: LinkConfig,
    memo: FxHashMap<PartRef, PartRef>,
    substitutes: FxHashMap<PartRef, PartRef>,
    consts: FxHashMap<(FileId, ConstId), ConstLink>,
    failures: FxHashMap<(FileId, ConstId), Vec<Failure>>,
    /// Referring parts already told about a record's failures.
    reported: FxHashSet<(PartRef, ConstId)>,
    /// Records being resolved since the last part was entered, innermost
    /// last.
    resolving: Vec<Resolution>,
    contribs: FxHashMap<PartRef, Vec<LinkedContrib>>,
    errors: Vec<LinkError>,
    suppressed: usize,
    /// Parts whose innards are being linked, innermost last.
    stack: Vec<PartRef>,
}

impl<'r> LinkSession<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self::with_config(repo, LinkConfig::default())
    }

    pub fn with_config(repo: &'r Repository, config: LinkConfig) -> Self {
        LinkSession {
            repo,
            config,
            memo: FxHashMap::default(),
            substitutes: FxHashMap::default(),
            consts: FxHashMap::default(),
            failures: FxHashMap::default(),
            reported: FxHashSet::default(),
            resolving: Vec::new(),
            contribs: FxHashMap::default(),
            errors: Vec::new(),
            suppressed: 0,
            stack: Vec::new(),
        }
    }

    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    /// Link every module of the repository, fingerprints included.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn link_all(&mut self) {
        let repo = self.repo;
        for (file_id, file) in repo.files() {
            for module in file.tree().kids_in_order(PartId::ROOT) {
                self.link(PartRef::new(file_id, module));
            }
        }
        tracing::debug!(
            parts = self.memo.len(),
            errors = self.errors.len() + self.suppressed,
            "linked repository"
        );
    }

    /// Link a part and everything below it, returning the part that stands
    /// for it: itself, or the primary module replacing a fingerprint.
    ///
    /// Linking an already linked part only returns the memoized result.
    pub fn link(&mut self, part: PartRef) -> PartRef {
        if let Some(&done) = self.memo.get(&part) {
            return done;
        }
        let target = self.stand_in(part);
        if target != part {
            self.memo.insert(part, target);
            let linked = ensure_sufficient_stack(|| self.link(target));
            self.memo.insert(part, linked);
            return linked;
        }

        // A failed fingerprint stands for itself and still links its stubs,
        // so references below it are reported too.
        self.memo.insert(part, part);
        let outer = std::mem::take(&mut self.resolving);
        self.stack.push(part);
        ensure_sufficient_stack(|| {
            self.link_innards(part);
            let tree = self.repo.file(part.file).tree();
            for kid in tree.kids_in_order(part.part) {
                self.link(PartRef::new(part.file, kid));
            }
        });
        self.stack.pop();
        self.resolving = outer;
        part
    }

    /// Whether `part` has been linked, or is being linked.
    pub fn is_linked(&self, part: PartRef) -> bool {
        self.memo.contains_key(&part)
    }

    /// The part standing for `part` so far: its substitute once linked or
    /// looked up.
    pub fn resolved(&self, part: PartRef) -> PartRef {
        self.memo
            .get(&part)
            .or_else(|| self.substitutes.get(&part))
            .copied()
            .unwrap_or(part)
    }

    /// The part standing for `part`, without linking either: the primary
    /// module replacing a fingerprint, otherwise `part` itself.
    fn stand_in(&mut self, part: PartRef) -> PartRef {
        if self.repo.part(part).as_module().is_none() {
            return part;
        }
        if let Some(&to) = self.substitutes.get(&part) {
            return to;
        }
        let to = match self.link_as(part) {
            LinkAs::Substitute(primary) => {
                tracing::debug!(
                    fingerprint = ?part,
                    ?primary,
                    module = self.repo.path(primary),
                    "substituted fingerprint"
                );
                primary
            }
            LinkAs::Itself | LinkAs::Failed => part,
        };
        self.substitutes.insert(part, to);
        to
    }

    fn link_as(&mut self, part: PartRef) -> LinkAs {
        let repo = self.repo;
        let node = repo.part(part);
        let Some(info) = node.as_module() else {
            return LinkAs::Itself;
        };
        let ModuleVersions::Fingerprint { allowed, .. } = &info.versions else {
            return LinkAs::Itself;
        };

        let name = repo.name(node.name);
        let primary = repo.get(node.name).filter(|&primary| {
            primary != part
                && repo
                    .part(primary)
                    .as_module()
                    .is_some_and(|m| m.kind == ModuleKind::Primary)
        });
        let Some(primary) = primary else {
            self.report(
                part,
                LinkErrorKind::Unresolved {
                    what: "module",
                    name: name.to_owned(),
                    detail: None,
                },
            );
            return LinkAs::Failed;
        };

        if !allowed.is_empty() {
            let version = repo.part(primary).as_module().and_then(|m| m.version());
            if !version.is_some_and(|v| allowed.iter().any(|a| a.accepts(v))) {
                let wanted: Vec<String> = allowed
                    .iter()
                    .map(|a| {
                        if a.exact {
                            a.version.to_string()
                        } else {
                            format!("{} or newer", a.version)
                        }
                    })
                    .collect();
                let found = version.map_or_else(
                    || "declares no version".to_owned(),
                    |v| format!("has version {v}"),
                );
                self.report(
                    part,
                    LinkErrorKind::Unresolved {
                        what: "module",
                        name: name.to_owned(),
                        detail: Some(format!(
                            "{} {found}; allowed: {}",
                            repo.file(primary.file).label(),
                            wanted.join(", ")
                        )),
                    },
                );
                return LinkAs::Failed;
            }
        }
        LinkAs::Substitute(primary)
    }

    fn link_innards(&mut self, part: PartRef) {
        let repo = self.repo;
        let node = repo.part(part);
        match &node.kind {
            PartKind::File | PartKind::MultiMethod => {}
            PartKind::Module(_) => {
                self.link_contribs(part);
            }
            PartKind::Package { import } => {
                if let Some(module) = import {
                    self.link_const(part, *module);
                }
            }
            PartKind::Class(info) => {
                self.link_contribs(part);
                for &(_, constraint) in &info.type_params {
                    self.link_const(part, constraint);
                }
            }
            PartKind::Property(info) => {
                self.link_const(part, info.ty);
                self.link_contribs(part);
            }
            PartKind::Method(info) => {
                for &annotation in &info.annotations {
                    self.link_const(part, annotation);
                }
                for param in info.params.iter().chain(&info.returns) {
                    self.link_const(part, param.ty);
                }
                if let Some(next) = info.next_sibling {
                    self.link(PartRef::new(part.file, next));
                }
                if let Some(call) = &info.super_call {
                    self.link_const(part, call.method);
                }
                if let Some(finally) = info.finally {
                    self.link_const(part, finally);
                }
            }
            PartKind::Typedef { ty } => {
                self.link_const(part, *ty);
            }
        }
    }

    /// Link the contributions of `part`, once.
    ///
    /// Import and rebase contributions are reported as unsupported and
    /// link to nothing.
    pub fn link_contribs(&mut self, part: PartRef) -> &[LinkedContrib] {
        if !self.contribs.contains_key(&part) {
            // Seen by lookups that reenter while the list is being built.
            self.contribs.insert(part, Vec::new());
            let outer = std::mem::take(&mut self.resolving);
            let linked = self.compute_contribs(part);
            self.resolving = outer;
            self.contribs.insert(part, linked);
        }
        self.contribs
            .get(&part)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn compute_contribs(&mut self, part: PartRef) -> Vec<LinkedContrib> {
        let repo = self.repo;
        let node = repo.part(part);
        let mut linked = Vec::with_capacity(node.contribs.len());
        for contrib in &node.contribs {
            let composition = contrib.composition;
            if composition.is_import() || composition == Composition::RebasesOnto {
                self.report(
                    part,
                    LinkErrorKind::Unsupported(format!("{composition} contribution")),
                );
                linked.push(LinkedContrib {
                    composition,
                    ty: None,
                    data: None,
                    bindings: FxHashMap::default(),
                });
                continue;
            }

            let ty = self.link_const(part, contrib.ty);
            let mut data = None;
            let mut bindings = FxHashMap::default();
            match &contrib.data {
                ContribData::Annotation(id) | ContribData::Delegate(id) => {
                    data = self.link_const(part, *id);
                }
                ContribData::Bindings(list) => {
                    for &(name, ty) in list {
                        let bound = ty.and_then(|ty| self.link_const(part, ty));
                        bindings.insert(name, bound);
                    }
                }
                ContribData::Import(_) | ContribData::None => {}
            }
            linked.push(LinkedContrib {
                composition,
                ty,
                data,
                bindings,
            });
        }
        linked
    }

    /// The class a class-family part extends.
    pub fn super_class(&mut self, class: PartRef) -> Option<PartRef> {
        self.link_contribs(class)
            .iter()
            .find(|c| c.composition == Composition::Extends)
            .and_then(|c| c.ty)
    }

    /// Mixins a class-family part incorporates, in declaration order.
    pub fn mixins(&mut self, class: PartRef) -> SmallVec<[PartRef; 2]> {
        self.link_contribs(class)
            .iter()
            .filter(|c| c.composition == Composition::Incorporates)
            .filter_map(|c| c.ty)
            .collect()
    }

    /// Child of `part` named `name`.
    ///
    /// A class-family part that has no such kid searches the classes it
    /// extends, implements, delegates to or is mixed into. The search must
    /// end in one part; several distinct matches are reported as ambiguous.
    pub fn child(&mut self, part: PartRef, name: Name) -> Option<PartRef> {
        let part = self.resolved(part);
        let mut visited = FxHashSet::default();
        let found = self.search(part, name, &mut visited);
        match found.as_slice() {
            [] => None,
            [one] => Some(*one),
            many => {
                let candidates = many.iter().map(|&p| self.repo.path(p)).collect();
                let at = self.stack.last().copied().unwrap_or(part);
                self.report(
                    at,
                    LinkErrorKind::Ambiguous {
                        name: self.repo.name(name).to_owned(),
                        candidates,
                    },
                );
                None
            }
        }
    }

    fn search(
        &mut self,
        part: PartRef,
        name: Name,
        visited: &mut FxHashSet<PartRef>,
    ) -> SmallVec<[PartRef; 2]> {
        let mut found = SmallVec::new();
        if !visited.insert(part) {
            return found;
        }
        let repo = self.repo;
        if let Some(kid) = repo.file(part.file).child(part.part, name) {
            found.push(self.resolved(PartRef::new(part.file, kid)));
            return found;
        }
        if !repo.part(part).is_class_family() {
            return found;
        }

        let targets: SmallVec<[PartRef; 4]> = self
            .link_contribs(part)
            .iter()
            .filter(|c| c.composition.is_searched())
            .filter_map(|c| c.ty)
            .collect();
        for target in targets {
            let target = self.resolved(target);
            for hit in ensure_sufficient_stack(|| self.search(target, name, visited)) {
                if !found.contains(&hit) {
                    found.push(hit);
                }
            }
        }
        found
    }

    /// The overload of method `name` on `owner` that accepts `arity`
    /// arguments.
    ///
    /// An overload whose parameter count equals `arity` wins over ones that
    /// reach it through default values.
    pub fn find_method(&mut self, owner: PartRef, name: Name, arity: usize) -> Option<PartRef> {
        let multi = self.child(owner, name).filter(|&m| {
            matches!(self.repo.part(m).kind, PartKind::MultiMethod)
        });
        let Some(multi) = multi else {
            self.report(
                owner,
                LinkErrorKind::Unresolved {
                    what: "method",
                    name: self.repo.name(name).to_owned(),
                    detail: None,
                },
            );
            return None;
        };
        self.select_overload(owner, multi, arity)
    }

    fn select_overload(&mut self, from: PartRef, multi: PartRef, arity: usize) -> Option<PartRef> {
        let repo = self.repo;
        let tree = repo.file(multi.file).tree();
        let name = repo.part(multi).name;
        let head = tree.kid(multi.part, name)?;

        let mut exact: SmallVec<[PartId; 2]> = SmallVec::new();
        let mut accepting: SmallVec<[PartId; 2]> = SmallVec::new();
        for id in tree.overloads(head) {
            let Some(method) = tree.get(id).as_method() else {
                continue;
            };
            if method.params.len() == arity {
                exact.push(id);
            }
            if method.accepts_arity(arity) {
                accepting.push(id);
            }
        }

        let chosen = if exact.is_empty() { &accepting } else { &exact };
        match chosen.as_slice() {
            [one] => Some(PartRef::new(multi.file, *one)),
            [] => {
                self.report(
                    from,
                    LinkErrorKind::Unresolved {
                        what: "method",
                        name: repo.name(name).to_owned(),
                        detail: Some(format!("no overload takes {arity} argument(s)")),
                    },
                );
                None
            }
            many => {
                let candidates = many
                    .iter()
                    .map(|&id| {
                        let params = tree.get(id).as_method().map_or(0, |m| m.params.len());
                        format!("{}/{params}", repo.path(PartRef::new(multi.file, id)))
                    })
                    .collect();
                self.report(
                    from,
                    LinkErrorKind::Ambiguous {
                        name: repo.name(name).to_owned(),
                        candidates,
                    },
                );
                None
            }
        }
    }

    /// Link a constant of `from`'s file to the part it names.
    ///
    /// Identity records resolve to their part, type records to the part
    /// defining the type. Records that name no part (literals, formal type
    /// parameters, keywords) link their references and give `None`, as does
    /// any reference that failed; failures are reported against `from`.
    pub fn link_const(&mut self, from: PartRef, id: ConstId) -> Option<PartRef> {
        let target = self.resolve_const(from, id)?;
        Some(self.link(target))
    }

    /// The part a constant of `from`'s file names, unlinked.
    fn resolve_const(&mut self, from: PartRef, id: ConstId) -> Option<PartRef> {
        let key = (from.file, id);
        match self.consts.get(&key) {
            Some(&ConstLink::Done(result)) => {
                self.replay_failures(from, key);
                return result;
            }
            // Only a record that contains itself gets here.
            Some(ConstLink::InProgress) => return None,
            None => {}
        }
        self.consts.insert(key, ConstLink::InProgress);
        self.resolving.push(Resolution {
            from,
            id,
            failures: Vec::new(),
        });
        let result = ensure_sufficient_stack(|| self.compute_const(from, id));
        self.consts.insert(key, ConstLink::Done(result));

        if let Some(done) = self.resolving.pop() {
            if let Some(outer) = self.resolving.last_mut() {
                outer.failures.extend(done.failures.iter().cloned());
            }
            if !done.failures.is_empty() {
                self.failures.insert(key, done.failures);
            }
        }
        result
    }

    /// Report the failures kept for a record against `from`, once per
    /// failing record.
    fn replay_failures(&mut self, from: PartRef, key: (FileId, ConstId)) {
        let Some(failures) = self.failures.get(&key).cloned() else {
            return;
        };
        for failure in failures {
            if let Some(outer) = self.resolving.last_mut() {
                outer.failures.push(failure.clone());
            }
            if self.reported.insert((from, failure.origin)) {
                self.emit(from, failure.kind);
            }
        }
    }

    fn compute_const(&mut self, from: PartRef, id: ConstId) -> Option<PartRef> {
        let repo = self.repo;
        let file = repo.file(from.file);
        let pool = file.pool();
        match pool.entry(id) {
            Const::Module { name } => {
                let local = file
                    .child(PartId::ROOT, *name)
                    .map(|kid| PartRef::new(from.file, kid));
                match local.or_else(|| repo.get(*name)) {
                    Some(module) => Some(self.stand_in(module)),
                    None => {
                        self.unresolved(from, "module", *name);
                        None
                    }
                }
            }
            Const::Named {
                format,
                parent,
                name,
            } => {
                let parent = self.resolve_const(from, *parent)?;
                match self.child(parent, *name) {
                    Some(kid) => Some(kid),
                    None => {
                        self.unresolved(from, what(*format), *name);
                        None
                    }
                }
            }
            Const::ChildClass { parent, name }
            | Const::VirtualChildType { parent, name, .. } => {
                let parent = self.resolve_const(from, *parent)?;
                match self.child(parent, *name) {
                    Some(kid) => Some(kid),
                    None => {
                        self.unresolved(from, "class", *name);
                        None
                    }
                }
            }
            Const::Method {
                multi, signature, ..
            } => {
                let multi = self.resolve_const(from, *multi)?;
                let tree = repo.file(multi.file).tree();
                // The record's own method when it is declared in this file.
                let own = (multi.file == from.file)
                    .then(|| {
                        let head = tree.kid(multi.part, repo.part(multi).name)?;
                        tree.overloads(head)
                            .find(|&m| tree.get(m).identity == Some(id))
                    })
                    .flatten();
                match own {
                    Some(method) => Some(PartRef::new(multi.file, method)),
                    None => {
                        let arity = match pool.entry(*signature) {
                            Const::Signature { params, .. } => params.len(),
                            _ => 0,
                        };
                        self.select_overload(from, multi, arity)
                    }
                }
            }
            Const::ParentClass { child } => {
                let child = self.resolve_const(from, *child)?;
                repo.part(child)
                    .parent
                    .map(|parent| self.stand_in(PartRef::new(child.file, parent)))
            }
            Const::ThisClass { class: ty }
            | Const::DecoratedClass { ty }
            | Const::TerminalType { def: ty }
            | Const::Wrapped { ty, .. }
            | Const::AccessType { ty, .. }
            | Const::RecursiveType { typedef: ty }
            | Const::ChildType { class: ty, .. }
            | Const::PropertyClassType { property: ty, .. } => self.resolve_const(from, *ty),
            Const::Annotation { class, args } => {
                for &arg in args.iter() {
                    self.link_const(from, arg);
                }
                self.resolve_const(from, *class)
            }
            Const::AnnotatedType { annotation, ty } => {
                self.link_const(from, *annotation);
                self.resolve_const(from, *ty)
            }
            Const::ParameterizedType { base, params } => {
                for &param in params {
                    self.link_const(from, param);
                }
                self.resolve_const(from, *base)
            }
            Const::Relational { first, second, .. } => {
                self.link_const(from, *first);
                self.link_const(from, *second);
                None
            }
            Const::Singleton { class, .. } => {
                self.link_const(from, *class);
                None
            }
            Const::Any { ty } | Const::Aggregate { ty, .. } | Const::Map { ty, .. } => {
                self.link_const(from, *ty);
                None
            }
            Const::Literal { .. }
            | Const::Version(_)
            | Const::Int { .. }
            | Const::FloatBits { .. }
            | Const::Char(_)
            | Const::String(_)
            | Const::Bytes(_)
            | Const::MapEntry { .. }
            | Const::Range { .. }
            | Const::TypeParameter { .. }
            | Const::FormalTypeChild { .. }
            | Const::DynamicFormal { .. }
            | Const::Signature { .. }
            | Const::Keyword(_)
            | Const::ConditionNot { .. }
            | Const::Conditions { .. }
            | Const::ConditionNamed { .. }
            | Const::ConditionPresent { .. }
            | Const::ConditionVersionMatches { .. }
            | Const::ConditionVersioned { .. } => None,
        }
    }

    fn unresolved(&mut self, from: PartRef, what: &'static str, name: Name) {
        let name = self.repo.name(name).to_owned();
        self.report(
            from,
            LinkErrorKind::Unresolved {
                what,
                name,
                detail: None,
            },
        );
    }

    /// Report a problem found at `at`, keeping it with the record being
    /// resolved on `at`'s behalf.
    fn report(&mut self, at: PartRef, kind: LinkErrorKind) {
        if let Some(resolution) = self.resolving.last_mut().filter(|r| r.from == at) {
            self.reported.insert((at, resolution.id));
            resolution.failures.push(Failure {
                origin: resolution.id,
                kind: kind.clone(),
            });
        }
        self.emit(at, kind);
    }

    fn emit(&mut self, at: PartRef, kind: LinkErrorKind) {
        if self.errors.len() >= self.config.error_limit {
            self.suppressed += 1;
            return;
        }
        let file = self.repo.file(at.file);
        let error = LinkError {
            kind,
            path: self.repo.path(at),
            file: file.label().to_owned(),
            span: file.part(at.part).span,
        };
        tracing::debug!(%error, path = %error.path, "link error");
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[LinkError] {
        &self.errors
    }

    /// Errors dropped after the configured limit was reached.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.suppressed > 0
    }

    pub fn is_success(&self) -> bool {
        !self.has_errors()
    }

    pub fn into_errors(self) -> Vec<LinkError> {
        self.errors
    }
}

/// What an identity record of `format` names, for messages.
fn what(format: ConstFormat) -> &'static str {
    match format {
        ConstFormat::Package => "package",
        ConstFormat::Typedef => "typedef",
        ConstFormat::Property => "property",
        ConstFormat::MultiMethod | ConstFormat::Method => "method",
        _ => "class",
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

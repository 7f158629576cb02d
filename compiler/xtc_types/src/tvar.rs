//! Union-find pool of type variables.
//!
//! A type variable is either a leader carrying a [`TVarKind`] or a member
//! pointing (possibly through a chain) at its leader. [`TVarPool::find`]
//! rolls chains up so later lookups are one step.
//!
//! Struct unification follows the openness of each side: a field only one
//! side has is kept when the other side is open and dropped when it is
//! closed. So unifying two closed structs leaves their shared fields, and
//! unifying two open ones leaves all of them.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use xtc_ir::{ConstId, FileId, Name, PartRef};
use xtc_stack::ensure_sufficient_stack;

use crate::UnifyError;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TVarId(u32);

impl TVarId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// What a base type stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// A scalar or literal pool record.
    Const { file: FileId, id: ConstId },
    /// A module or package used as a type.
    Part(PartRef),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Property(Name),
    /// Method name and parameter count.
    Method(Name, usize),
}

impl FieldKey {
    pub fn name(self) -> Name {
        match self {
            FieldKey::Property(name) | FieldKey::Method(name, _) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TVarKind {
    /// Unconstrained; unifies with anything.
    Leaf,
    Base(Anchor),
    Struct {
        fields: FxHashMap<FieldKey, TVarId>,
        /// Open structs absorb fields of the structs they unify with.
        open: bool,
    },
    Lambda {
        params: SmallVec<[TVarId; 4]>,
        returns: SmallVec<[TVarId; 2]>,
    },
}

#[derive(Clone, Debug)]
struct Node {
    /// Set once this variable has been merged into another.
    parent: Option<TVarId>,
    kind: TVarKind,
}

#[derive(Clone, Debug, Default)]
pub struct TVarPool {
    nodes: Vec<Node>,
}

impl TVarPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: TVarKind) -> TVarId {
        let id = u32::try_from(self.nodes.len()).unwrap_or_else(|_| {
            panic!("type variable overflow: {} exceeds u32::MAX", self.nodes.len())
        });
        self.nodes.push(Node { parent: None, kind });
        TVarId(id)
    }

    pub fn leaf(&mut self) -> TVarId {
        self.push(TVarKind::Leaf)
    }

    pub fn base(&mut self, anchor: Anchor) -> TVarId {
        self.push(TVarKind::Base(anchor))
    }

    pub fn structure(&mut self, fields: FxHashMap<FieldKey, TVarId>, open: bool) -> TVarId {
        self.push(TVarKind::Struct { fields, open })
    }

    pub fn lambda(&mut self, params: &[TVarId], returns: &[TVarId]) -> TVarId {
        self.push(TVarKind::Lambda {
            params: params.into(),
            returns: returns.into(),
        })
    }

    /// Leader of `t`, shortening the chain to it.
    pub fn find(&mut self, t: TVarId) -> TVarId {
        let leader = self.find_readonly(t);
        let mut cursor = t;
        while let Some(next) = self.nodes[cursor.index()].parent {
            self.nodes[cursor.index()].parent = Some(leader);
            if next == leader {
                break;
            }
            cursor = next;
        }
        leader
    }

    /// Leader of `t` without touching the chain.
    pub fn find_readonly(&self, t: TVarId) -> TVarId {
        let mut cursor = t;
        while let Some(next) = self.nodes[cursor.index()].parent {
            cursor = next;
        }
        cursor
    }

    /// Kind of `t`'s leader.
    pub fn kind(&self, t: TVarId) -> &TVarKind {
        &self.nodes[self.find_readonly(t).index()].kind
    }

    /// Whether `a` and `b` have been unified.
    pub fn same(&self, a: TVarId, b: TVarId) -> bool {
        self.find_readonly(a) == self.find_readonly(b)
    }

    /// Field keys of a struct, sorted; empty for anything else.
    pub fn fields(&self, t: TVarId) -> Vec<FieldKey> {
        let mut keys: Vec<FieldKey> = match self.kind(t) {
            TVarKind::Struct { fields, .. } => fields.keys().copied().collect(),
            _ => Vec::new(),
        };
        keys.sort_unstable();
        keys
    }

    /// Leader of a struct's field.
    pub fn field(&self, t: TVarId, key: FieldKey) -> Option<TVarId> {
        match self.kind(t) {
            TVarKind::Struct { fields, .. } => {
                fields.get(&key).map(|&f| self.find_readonly(f))
            }
            _ => None,
        }
    }

    /// Openness of a struct; `None` for anything else.
    pub fn is_open(&self, t: TVarId) -> Option<bool> {
        match self.kind(t) {
            TVarKind::Struct { open, .. } => Some(*open),
            _ => None,
        }
    }

    /// Force the openness of a struct; no effect on other kinds.
    pub fn set_open(&mut self, t: TVarId, value: bool) {
        let t = self.find(t);
        if let TVarKind::Struct { open, .. } = &mut self.nodes[t.index()].kind {
            *open = value;
        }
    }

    fn link(&mut self, from: TVarId, to: TVarId) {
        let node = &mut self.nodes[from.index()];
        node.parent = Some(to);
        node.kind = TVarKind::Leaf;
    }

    /// Make `a` and `b` the same type.
    ///
    /// Pairs already being unified are assumed equal, which is what lets
    /// recursive types unify in finite time.
    pub fn unify(&mut self, a: TVarId, b: TVarId) -> Result<(), UnifyError> {
        let mut visited = FxHashSet::default();
        self.unify_inner(a, b, &mut visited)
    }

    fn unify_inner(
        &mut self,
        a: TVarId,
        b: TVarId,
        visited: &mut FxHashSet<(TVarId, TVarId)>,
    ) -> Result<(), UnifyError> {
        let a = self.find(a);
        let b = self.find(b);
        if a == b || !visited.insert((a, b)) {
            return Ok(());
        }

        match (&self.nodes[a.index()].kind, &self.nodes[b.index()].kind) {
            (TVarKind::Leaf, _) => {
                self.link(a, b);
                Ok(())
            }
            (_, TVarKind::Leaf) => {
                self.link(b, a);
                Ok(())
            }
            (TVarKind::Base(x), TVarKind::Base(y)) => {
                if x == y {
                    self.link(a, b);
                    Ok(())
                } else {
                    Err(self.mismatch(a, b))
                }
            }
            (
                TVarKind::Struct {
                    fields: fa,
                    open: oa,
                },
                TVarKind::Struct {
                    fields: fb,
                    open: ob,
                },
            ) => {
                let (oa, ob) = (*oa, *ob);
                let mut fields = FxHashMap::default();
                let mut shared: SmallVec<[(FieldKey, TVarId, TVarId); 8]> = SmallVec::new();
                for (&key, &ta) in fa {
                    match fb.get(&key) {
                        Some(&tb) => {
                            fields.insert(key, tb);
                            shared.push((key, ta, tb));
                        }
                        None if ob => {
                            fields.insert(key, ta);
                        }
                        None => {}
                    }
                }
                if oa {
                    for (&key, &tb) in fb {
                        if !fa.contains_key(&key) {
                            fields.insert(key, tb);
                        }
                    }
                }

                self.nodes[b.index()].kind = TVarKind::Struct {
                    fields,
                    open: oa && ob,
                };
                self.link(a, b);
                for (key, x, y) in shared {
                    ensure_sufficient_stack(|| self.unify_inner(x, y, visited)).map_err(
                        |err| UnifyError::InField {
                            field: key,
                            source: Box::new(err),
                        },
                    )?;
                }
                Ok(())
            }
            (
                TVarKind::Lambda {
                    params: pa,
                    returns: ra,
                },
                TVarKind::Lambda {
                    params: pb,
                    returns: rb,
                },
            ) => {
                if pa.len() != pb.len() || ra.len() != rb.len() {
                    return Err(UnifyError::Arity {
                        left: pa.len(),
                        right: pb.len(),
                    });
                }
                let pairs: SmallVec<[(TVarId, TVarId); 6]> = pa
                    .iter()
                    .zip(pb)
                    .chain(ra.iter().zip(rb))
                    .map(|(&x, &y)| (x, y))
                    .collect();
                self.link(a, b);
                for (x, y) in pairs {
                    ensure_sufficient_stack(|| self.unify_inner(x, y, visited))?;
                }
                Ok(())
            }
            _ => Err(self.mismatch(a, b)),
        }
    }

    fn mismatch(&self, a: TVarId, b: TVarId) -> UnifyError {
        UnifyError::Mismatch {
            left: self.describe(a),
            right: self.describe(b),
        }
    }

    /// Deep copy of `t`; shared and cyclic structure is copied once.
    pub fn fresh(&mut self, t: TVarId) -> TVarId {
        let mut memo = FxHashMap::default();
        self.fresh_inner(t, &mut memo)
    }

    fn fresh_inner(&mut self, t: TVarId, memo: &mut FxHashMap<TVarId, TVarId>) -> TVarId {
        let t = self.find(t);
        if let Some(&copy) = memo.get(&t) {
            return copy;
        }
        let copy = self.leaf();
        memo.insert(t, copy);

        let kind = match self.nodes[t.index()].kind.clone() {
            TVarKind::Leaf => TVarKind::Leaf,
            TVarKind::Base(anchor) => TVarKind::Base(anchor),
            TVarKind::Struct { fields, open } => TVarKind::Struct {
                fields: fields
                    .into_iter()
                    .map(|(key, f)| (key, ensure_sufficient_stack(|| self.fresh_inner(f, memo))))
                    .collect(),
                open,
            },
            TVarKind::Lambda { params, returns } => TVarKind::Lambda {
                params: params
                    .into_iter()
                    .map(|p| self.fresh_inner(p, memo))
                    .collect(),
                returns: returns
                    .into_iter()
                    .map(|r| self.fresh_inner(r, memo))
                    .collect(),
            },
        };
        self.nodes[copy.index()].kind = kind;
        copy
    }

    /// A type either operand satisfies: the fields both have, open.
    ///
    /// Works on fresh copies; neither operand changes.
    pub fn union(&mut self, a: TVarId, b: TVarId) -> Result<TVarId, UnifyError> {
        let (x, y) = (self.fresh(a), self.fresh(b));
        self.set_open(x, false);
        self.set_open(y, false);
        self.unify(x, y)?;
        self.set_open(x, true);
        Ok(self.find(x))
    }

    /// A type satisfying both operands: every field of either.
    ///
    /// Works on fresh copies; neither operand changes.
    pub fn intersect(&mut self, a: TVarId, b: TVarId) -> Result<TVarId, UnifyError> {
        let (x, y) = (self.fresh(a), self.fresh(b));
        self.set_open(x, true);
        self.set_open(y, true);
        self.unify(x, y)?;
        Ok(self.find(x))
    }

    /// Short description of `t`'s shape, for messages.
    pub fn describe(&self, t: TVarId) -> String {
        match self.kind(t) {
            TVarKind::Leaf => "an unconstrained type".to_owned(),
            TVarKind::Base(Anchor::Const { id, .. }) => format!("base type {id:?}"),
            TVarKind::Base(Anchor::Part(part)) => format!("base type {part:?}"),
            TVarKind::Struct { fields, open } => format!(
                "{} struct with {} field(s)",
                if *open { "an open" } else { "a closed" },
                fields.len()
            ),
            TVarKind::Lambda { params, returns } => {
                format!("a lambda of {} -> {}", params.len(), returns.len())
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

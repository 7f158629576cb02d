//! Nodes of a component tree.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use xtc_ir::{Access, ComponentFlags, ComponentFormat, ConstId, ModuleKind, Name, PartId, Span};
use xtc_pool::Version;

use crate::Contrib;

/// One component: the File root, a module, a class, a method, ...
#[derive(Clone, Debug)]
pub struct Part {
    pub parent: Option<PartId>,
    pub name: Name,
    /// Identity record; `None` only for the File root.
    pub identity: Option<ConstId>,
    pub flags: ComponentFlags,
    pub contribs: Vec<Contrib>,
    /// Byte range of the component record header and body.
    pub span: Span,
    pub kind: PartKind,
    pub(crate) kids: FxHashMap<Name, PartId>,
}

impl Part {
    pub fn format(&self) -> ComponentFormat {
        match self.kind {
            PartKind::File => ComponentFormat::File,
            _ => self.flags.format(),
        }
    }

    pub fn is_class_family(&self) -> bool {
        matches!(self.kind, PartKind::Class(_))
    }

    /// Interfaces have open structural types; every other class is closed.
    pub fn is_interface(&self) -> bool {
        self.format() == ComponentFormat::Interface
    }

    pub fn kid_count(&self) -> usize {
        self.kids.len()
    }

    pub fn as_module(&self) -> Option<&ModuleInfo> {
        match &self.kind {
            PartKind::Module(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassInfo> {
        match &self.kind {
            PartKind::Class(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyInfo> {
        match &self.kind {
            PartKind::Property(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodInfo> {
        match &self.kind {
            PartKind::Method(info) => Some(info),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum PartKind {
    File,
    Module(ModuleInfo),
    Package {
        /// Module this package imports, if any.
        import: Option<ConstId>,
    },
    /// Interface, class, const, enum, enum value, mixin or service.
    Class(ClassInfo),
    Property(PropertyInfo),
    /// Owner of one overload chain; its only kid is the chain's head.
    MultiMethod,
    Method(MethodInfo),
    Typedef {
        ty: ConstId,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub kind: ModuleKind,
    pub versions: ModuleVersions,
    pub directory: Option<ConstId>,
    pub timestamp: Option<ConstId>,
}

impl ModuleInfo {
    /// The version a primary or embedded module declares.
    pub fn version(&self) -> Option<&Version> {
        match &self.versions {
            ModuleVersions::Declared(version) => version.as_ref(),
            ModuleVersions::Fingerprint { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleVersions {
    /// Version of a primary or embedded module.
    Declared(Option<Version>),
    /// Constraints of a fingerprint on the module it stands for.
    Fingerprint {
        allowed: Vec<AllowedVersion>,
        preferred: Vec<Version>,
    },
}

/// One entry of a fingerprint's allowed-version list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedVersion {
    pub version: Version,
    /// Only this exact version; otherwise this version or a newer one.
    pub exact: bool,
}

impl AllowedVersion {
    pub fn accepts(&self, actual: &Version) -> bool {
        if self.exact {
            actual.is_same_as(&self.version)
        } else {
            actual.is_substitutable_for(&self.version)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ClassInfo {
    /// Formal type parameters with their constraint types.
    pub type_params: SmallVec<[(Name, ConstId); 2]>,
}

#[derive(Clone, Debug)]
pub struct PropertyInfo {
    /// Access of the getter/setter pair, when it differs from the property's.
    pub access: Option<Access>,
    pub ty: ConstId,
    pub initial: Option<ConstId>,
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub annotations: Vec<ConstId>,
    pub ty: ConstId,
    pub name: Option<Name>,
    pub default: Option<ConstId>,
}

#[derive(Clone, Debug)]
pub struct SuperCall {
    pub method: ConstId,
    pub args: Vec<ConstId>,
}

#[derive(Clone, Debug, Default)]
pub struct SourceLines {
    pub first_line: usize,
    /// Indentation and text record of each line.
    pub lines: Vec<(usize, ConstId)>,
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub annotations: Vec<ConstId>,
    pub finally: Option<ConstId>,
    pub returns: Vec<Parameter>,
    pub params: Vec<Parameter>,
    pub type_param_count: usize,
    pub default_count: usize,
    pub super_call: Option<SuperCall>,
    pub locals: Vec<ConstId>,
    /// Opaque code bytes.
    pub code: Box<[u8]>,
    pub source: Option<SourceLines>,
    /// Next overload of the same name.
    pub next_sibling: Option<PartId>,
}

impl MethodInfo {
    /// Arguments that must be supplied.
    pub fn required_params(&self) -> usize {
        self.params.len().saturating_sub(self.default_count)
    }

    /// Whether a call with `arity` arguments can select this method.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        (self.required_params()..=self.params.len()).contains(&arity)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use super::*;

    fn method(params: usize, defaults: usize) -> MethodInfo {
        let param = Parameter {
            annotations: Vec::new(),
            ty: ConstId::from_raw(0),
            name: None,
            default: None,
        };
        MethodInfo {
            annotations: Vec::new(),
            finally: None,
            returns: Vec::new(),
            params: vec![param; params],
            type_param_count: 0,
            default_count: defaults,
            super_call: None,
            locals: Vec::new(),
            code: Box::default(),
            source: None,
            next_sibling: None,
        }
    }

    #[test]
    fn arity_with_defaults() {
        let m = method(3, 1);
        assert_eq!(m.required_params(), 2);
        assert!(!m.accepts_arity(1));
        assert!(m.accepts_arity(2));
        assert!(m.accepts_arity(3));
        assert!(!m.accepts_arity(4));
    }

    #[test]
    fn allowed_versions() {
        let v = |s: &str| Version::parse(s).unwrap();
        let exact = AllowedVersion {
            version: v("1.2"),
            exact: true,
        };
        assert!(exact.accepts(&v("1.2.0")));
        assert!(!exact.accepts(&v("1.3")));

        let newer = AllowedVersion {
            version: v("1.2"),
            exact: false,
        };
        assert!(newer.accepts(&v("1.3")));
        assert!(!newer.accepts(&v("2.0")));
        assert!(!newer.accepts(&v("1.1")));
    }
}

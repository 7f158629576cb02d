//! Programmatic construction of module files.
//!
//! [`FileBuilder`] is the writing counterpart of
//! [`ModuleFile::load`](crate::ModuleFile::load): it collects pool records
//! and components and encodes them in the wire layout the loader reads.
//!
//! ```ignore
//! let mut b = FileBuilder::new("Shapes");
//! let point = b.class(b.module(), "Point", ComponentFormat::Class);
//! let int = b.string("Int");
//! b.property(point, "x", int);
//! let bytes = b.build();
//! ```

use rustc_hash::FxHashMap;
use xtc_ir::{Access, ComponentFlags, ComponentFormat, Composition, ConstFormat, ModuleKind};
use xtc_wire::{RawConst, Writer};

use crate::file::{MAGIC, VERSION_MAJOR, VERSION_MINOR};

/// Handle of a component added to a [`FileBuilder`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum Body {
    Module {
        kind: ModuleKind,
        version: Option<u32>,
        allowed: Vec<(u32, bool)>,
    },
    Package {
        import: Option<u32>,
    },
    Class {
        type_params: Vec<(u32, u32)>,
    },
    Typedef {
        ty: u32,
    },
    Property {
        ty: u32,
    },
    MultiMethod,
    Method {
        params: Vec<u32>,
        returns: Vec<u32>,
        defaults: usize,
    },
    /// Body bytes written verbatim.
    Raw(Vec<u8>),
}

#[derive(Clone, Debug)]
struct Node {
    flags: ComponentFlags,
    identity: u32,
    contribs: Vec<ContribSpec>,
    body: Body,
    kids: Vec<usize>,
}

/// One contribution to encode.
#[derive(Clone, Debug)]
pub struct ContribSpec {
    pub composition: Composition,
    pub ty: u32,
    /// Annotation, delegate property or imported module, when the
    /// composition carries one.
    pub extra: Option<u32>,
    /// Parameter bindings of `Incorporates`.
    pub bindings: Vec<(u32, Option<u32>)>,
}

impl ContribSpec {
    pub fn new(composition: Composition, ty: u32) -> Self {
        ContribSpec {
            composition,
            ty,
            extra: None,
            bindings: Vec::new(),
        }
    }
}

pub struct FileBuilder {
    pool: Vec<RawConst>,
    strings: FxHashMap<String, u32>,
    modules: FxHashMap<String, u32>,
    nodes: Vec<Node>,
    /// Top-level components (modules) in file order.
    roots: Vec<usize>,
    module: NodeId,
    trailing: Vec<u8>,
}

impl FileBuilder {
    /// A file defining the primary module `name`.
    pub fn new(name: &str) -> Self {
        let mut b = FileBuilder {
            pool: Vec::new(),
            strings: FxHashMap::default(),
            modules: FxHashMap::default(),
            nodes: Vec::new(),
            roots: Vec::new(),
            module: NodeId(0),
            trailing: Vec::new(),
        };
        b.module = b.add_module(name, ModuleKind::Primary, Vec::new());
        b
    }

    /// The primary module component.
    pub fn module(&self) -> NodeId {
        self.module
    }

    /// Append a pool record, returning its index.
    pub fn constant(&mut self, record: RawConst) -> u32 {
        let index = u32::try_from(self.pool.len()).unwrap_or(u32::MAX);
        self.pool.push(record);
        index
    }

    /// A String record, shared between uses of the same text.
    pub fn string(&mut self, text: &str) -> u32 {
        if let Some(&index) = self.strings.get(text) {
            return index;
        }
        let index = self.constant(RawConst::String(text.to_owned()));
        self.strings.insert(text.to_owned(), index);
        index
    }

    /// A Module record, shared between uses of the same name.
    pub fn module_const(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.modules.get(name) {
            return index;
        }
        let text = self.string(name);
        let index = self.constant(RawConst::Module { name: text });
        self.modules.insert(name.to_owned(), index);
        index
    }

    pub fn version(&mut self, text: &str) -> u32 {
        let text = self.string(text);
        self.constant(RawConst::Literal {
            format: ConstFormat::Version,
            text,
        })
    }

    /// Identity record of a component.
    pub fn identity(&self, node: NodeId) -> u32 {
        self.nodes[node.0].identity
    }

    /// A TerminalType record naming a component.
    pub fn type_of(&mut self, node: NodeId) -> u32 {
        let def = self.identity(node);
        self.constant(RawConst::TerminalType { def })
    }

    fn add_module(&mut self, name: &str, kind: ModuleKind, allowed: Vec<(u32, bool)>) -> NodeId {
        let identity = self.module_const(name);
        let id = self.push(
            ComponentFormat::Module,
            identity,
            Body::Module {
                kind,
                version: None,
                allowed,
            },
        );
        self.roots.push(id.0);
        id
    }

    /// A fingerprint module standing for `name`, with allowed versions as
    /// `(version, exact)` pairs.
    pub fn fingerprint(&mut self, name: &str, kind: ModuleKind, allowed: &[(&str, bool)]) -> NodeId {
        let allowed = allowed
            .iter()
            .map(|&(text, exact)| (self.version(text), exact))
            .collect();
        self.add_module(name, kind, allowed)
    }

    /// Declare the version of a primary module.
    pub fn set_version(&mut self, module: NodeId, text: &str) {
        let version = self.version(text);
        if let Body::Module { version: slot, .. } = &mut self.nodes[module.0].body {
            *slot = Some(version);
        }
    }

    fn push(&mut self, format: ComponentFormat, identity: u32, body: Body) -> NodeId {
        self.nodes.push(Node {
            flags: ComponentFlags::encode(format, Access::Public),
            identity,
            contribs: Vec::new(),
            body,
            kids: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn named(&mut self, parent: NodeId, format: ConstFormat, name: &str) -> u32 {
        let parent = self.identity(parent);
        let name = self.string(name);
        self.constant(RawConst::Named {
            format,
            parent,
            name,
        })
    }

    fn add_kid(&mut self, parent: NodeId, format: ComponentFormat, identity: u32, body: Body) -> NodeId {
        let id = self.push(format, identity, body);
        self.nodes[parent.0].kids.push(id.0);
        id
    }

    /// A class-family component of the given format.
    pub fn class(&mut self, parent: NodeId, name: &str, format: ComponentFormat) -> NodeId {
        let identity = self.named(parent, ConstFormat::Class, name);
        self.add_kid(
            parent,
            format,
            identity,
            Body::Class {
                type_params: Vec::new(),
            },
        )
    }

    pub fn type_param(&mut self, class: NodeId, name: &str, constraint: u32) {
        let name = self.string(name);
        if let Body::Class { type_params } = &mut self.nodes[class.0].body {
            type_params.push((name, constraint));
        }
    }

    pub fn package(&mut self, parent: NodeId, name: &str, import: Option<u32>) -> NodeId {
        let identity = self.named(parent, ConstFormat::Package, name);
        self.add_kid(parent, ComponentFormat::Package, identity, Body::Package { import })
    }

    pub fn typedef(&mut self, parent: NodeId, name: &str, ty: u32) -> NodeId {
        let identity = self.named(parent, ConstFormat::Typedef, name);
        self.add_kid(parent, ComponentFormat::Typedef, identity, Body::Typedef { ty })
    }

    pub fn property(&mut self, parent: NodeId, name: &str, ty: u32) -> NodeId {
        let identity = self.named(parent, ConstFormat::Property, name);
        self.add_kid(parent, ComponentFormat::Property, identity, Body::Property { ty })
    }

    /// The multi-method `name` under `parent`, created on first use.
    pub fn multi_method(&mut self, parent: NodeId, name: &str) -> NodeId {
        let text = self.string(name);
        let existing = self.nodes[parent.0].kids.iter().copied().find(|&kid| {
            let node = &self.nodes[kid];
            matches!(node.body, Body::MultiMethod)
                && matches!(
                    self.pool[node.identity as usize],
                    RawConst::Named { name, .. } if name == text
                )
        });
        if let Some(kid) = existing {
            return NodeId(kid);
        }
        let identity = self.named(parent, ConstFormat::MultiMethod, name);
        self.add_kid(parent, ComponentFormat::MultiMethod, identity, Body::MultiMethod)
    }

    /// A method overload with parameter and return types; the last
    /// `defaults` parameters have default values.
    pub fn method(
        &mut self,
        parent: NodeId,
        name: &str,
        params: &[u32],
        returns: &[u32],
        defaults: usize,
    ) -> NodeId {
        let multi = self.multi_method(parent, name);
        let name = self.string(name);
        let signature = self.constant(RawConst::Signature {
            name,
            params: params.to_vec(),
            returns: returns.to_vec(),
        });
        let identity = self.constant(RawConst::Method {
            multi: self.identity(multi),
            signature,
            lambda: false,
        });
        self.add_kid(
            multi,
            ComponentFormat::Method,
            identity,
            Body::Method {
                params: params.to_vec(),
                returns: returns.to_vec(),
                defaults,
            },
        )
    }

    /// A component with a hand-written identity and body.
    pub fn raw_component(
        &mut self,
        parent: NodeId,
        flags: ComponentFlags,
        identity: u32,
        body: Vec<u8>,
    ) -> NodeId {
        let id = self.add_kid(parent, flags.format(), identity, Body::Raw(body));
        self.nodes[id.0].flags = flags;
        id
    }

    pub fn contribute(&mut self, node: NodeId, composition: Composition, ty: u32) {
        self.contribute_spec(node, ContribSpec::new(composition, ty));
    }

    pub fn contribute_spec(&mut self, node: NodeId, spec: ContribSpec) {
        self.nodes[node.0].contribs.push(spec);
    }

    /// Bytes appended after the component tree.
    pub fn trailing(&mut self, bytes: &[u8]) {
        self.trailing.extend_from_slice(bytes);
    }

    /// Encode the whole file.
    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u32(MAGIC).u32(VERSION_MAJOR).u32(VERSION_MINOR);
        w.magnitude(self.pool.len());
        for record in &self.pool {
            record.encode(&mut w);
        }
        w.required_index(self.identity(self.module));
        self.write_kids(&mut w, &self.roots);
        w.bytes(&self.trailing);
        w.into_bytes()
    }

    fn write_kids(&self, w: &mut Writer, kids: &[usize]) {
        w.magnitude(kids.len());
        for &kid in kids {
            self.write_node(w, &self.nodes[kid]);
        }
    }

    fn write_node(&self, w: &mut Writer, node: &Node) {
        w.u16(node.flags.bits()).magnitude(node.identity as usize);

        w.magnitude(node.contribs.len());
        for c in &node.contribs {
            w.u8(c.composition.tag()).required_index(c.ty);
            match c.composition {
                Composition::Incorporates => {
                    w.magnitude(c.bindings.len());
                    for &(name, ty) in &c.bindings {
                        w.required_index(name).index(ty);
                    }
                }
                Composition::Annotation
                | Composition::Delegates
                | Composition::ImportOptional
                | Composition::ImportDesired
                | Composition::ImportRequired
                | Composition::ImportEmbedded => {
                    w.required_index(c.extra.unwrap_or(c.ty));
                }
                Composition::Extends
                | Composition::Implements
                | Composition::Into
                | Composition::RebasesOnto => {}
            }
        }

        match &node.body {
            Body::Module {
                kind,
                version,
                allowed,
            } => {
                w.u8(kind.tag());
                if kind.is_fingerprint() {
                    w.magnitude(allowed.len());
                    for &(version, exact) in allowed {
                        w.required_index(version).bool(exact);
                    }
                    w.magnitude(0);
                } else {
                    w.bool(version.is_some());
                    if let Some(version) = version {
                        w.required_index(*version);
                    }
                }
                w.index(None).index(None);
            }
            Body::Package { import } => {
                w.index(*import);
            }
            Body::Class { type_params } => {
                w.magnitude(type_params.len());
                for &(name, ty) in type_params {
                    w.required_index(name).required_index(ty);
                }
            }
            Body::Typedef { ty } => {
                w.required_index(*ty);
            }
            Body::Property { ty } => {
                w.i8(-1).required_index(*ty).index(None);
            }
            Body::MultiMethod => {}
            Body::Method {
                params,
                returns,
                defaults,
            } => {
                // annotations, finally
                w.magnitude(0).index(None);
                for &ty in returns {
                    write_parameter(w, ty, None);
                }
                w.magnitude(0).magnitude(*defaults).magnitude(params.len());
                let first_default = params.len().saturating_sub(*defaults);
                for (i, &ty) in params.iter().enumerate() {
                    write_parameter(w, ty, (i >= first_default).then_some(ty));
                }
                // super method, locals, code, source lines
                w.index(None).magnitude(0).byte_array(&[]).magnitude(0);
            }
            Body::Raw(bytes) => {
                w.bytes(bytes);
            }
        }

        if node.kids.is_empty() {
            w.magnitude(0);
        } else {
            let mut nested = Writer::new();
            self.write_kids(&mut nested, &node.kids);
            w.magnitude(nested.len()).bytes(nested.as_bytes());
        }
    }
}

fn write_parameter(w: &mut Writer, ty: u32, default: Option<u32>) {
    w.magnitude(0).required_index(ty).index(None).index(default);
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

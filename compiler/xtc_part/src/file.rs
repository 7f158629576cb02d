//! Loading one module file.

use xtc_diagnostic::{Diagnostic, ErrorCode};
use xtc_ir::{ConstId, ModuleKind, Name, PartId, Span, StringInterner};
use xtc_pool::{Const, Pool};
use xtc_wire::Reader;

use crate::tree::TreeBuilder;
use crate::{ModuleInfo, Part, PartTree, TreeError};

pub const MAGIC: u32 = 0xEC57_A5EE;
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 20_230_724;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Accept bytes after the component tree instead of failing.
    pub allow_trailing: bool,
}

/// A decoded module file: its constant pool and component tree.
#[derive(Debug)]
pub struct ModuleFile {
    label: String,
    pool: Pool,
    tree: PartTree,
    module_id: ConstId,
    module_name: Name,
    module: PartId,
    /// Offset and length of bytes accepted after the component tree.
    trailing: Option<(usize, usize)>,
}

impl ModuleFile {
    /// Decode a whole module file.
    ///
    /// Checks the header before anything else, then reads the constant pool,
    /// resolves it, and builds the component tree.
    #[tracing::instrument(level = "debug", skip_all, fields(len = bytes.len()))]
    pub fn load(
        bytes: &[u8],
        interner: &StringInterner,
        options: LoadOptions,
    ) -> Result<ModuleFile, TreeError> {
        let mut r = Reader::new(bytes);
        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(TreeError::BadMagic(magic));
        }
        let major = r.u32()?;
        let minor = r.u32()?;
        if (major, minor) != (VERSION_MAJOR, VERSION_MINOR) {
            return Err(TreeError::VersionMismatch { major, minor });
        }

        let mut pool = Pool::parse(&mut r)?;
        pool.resolve(interner)?;

        let at = r.position();
        let index = r.required_index()?;
        let module_id = pool.checked(index, r.span_from(at))?;
        let module_name = match pool.entry(module_id) {
            Const::Module { name } => *name,
            other => {
                return Err(TreeError::NotAModule {
                    found: other.format(),
                })
            }
        };

        let mut builder = TreeBuilder {
            r: &mut r,
            pool: &pool,
            names: interner,
            tree: PartTree::new(),
        };
        builder.parse_kids(PartId::ROOT)?;
        let tree = builder.tree;

        let trailing = (!r.is_at_end()).then(|| (r.position(), r.remaining()));
        if let (Some((offset, remaining)), false) = (trailing, options.allow_trailing) {
            return Err(TreeError::TrailingBytes { offset, remaining });
        }

        let module = tree
            .kid(PartId::ROOT, module_name)
            .filter(|&id| tree.get(id).identity == Some(module_id))
            .ok_or_else(|| TreeError::MissingModule {
                name: interner.lookup(module_name).to_owned(),
            })?;

        tracing::debug!(
            module = interner.lookup(module_name),
            constants = pool.len(),
            parts = tree.len(),
            "loaded module file"
        );
        Ok(ModuleFile {
            label: "<memory>".to_owned(),
            pool,
            tree,
            module_id,
            module_name,
            module,
            trailing,
        })
    }

    /// Name this file by, in diagnostics.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    pub fn part(&self, id: PartId) -> &Part {
        self.tree.get(id)
    }

    /// Direct child of `parent` by exact name.
    pub fn child(&self, parent: PartId, name: Name) -> Option<PartId> {
        self.tree.kid(parent, name)
    }

    /// The module this file defines.
    pub fn module(&self) -> PartId {
        self.module
    }

    pub fn module_id(&self) -> ConstId {
        self.module_id
    }

    pub fn module_name(&self) -> Name {
        self.module_name
    }

    pub fn module_info(&self) -> Option<&ModuleInfo> {
        self.part(self.module).as_module()
    }

    pub fn module_kind(&self) -> Option<ModuleKind> {
        self.module_info().map(|info| info.kind)
    }

    /// Bytes after the component tree that [`LoadOptions::allow_trailing`]
    /// let through, as a warning.
    pub fn trailing_warning(&self) -> Option<Diagnostic> {
        let (offset, remaining) = self.trailing?;
        Some(
            Diagnostic::warning(ErrorCode::E0004)
                .with_message(format!(
                    "ignoring {remaining} trailing byte(s) after the component tree"
                ))
                .with_label(
                    Span::from_range_saturating(offset..offset + remaining),
                    "not part of the module",
                )
                .in_file(&self.label),
        )
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

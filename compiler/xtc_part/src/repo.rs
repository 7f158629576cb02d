//! The set of module files a link session works over.
//!
//! Files are added to a [`RepoBuilder`], possibly from several loader
//! threads' results, and sealed into an immutable [`Repository`] before any
//! linking starts.

use rustc_hash::FxHashMap;
use xtc_ir::{FileId, Name, PartRef, SharedInterner};

use crate::{ModuleFile, Part, TreeError};

pub struct RepoBuilder {
    interner: SharedInterner,
    files: Vec<ModuleFile>,
}

impl RepoBuilder {
    pub fn new(interner: SharedInterner) -> Self {
        RepoBuilder {
            interner,
            files: Vec::new(),
        }
    }

    pub fn add(&mut self, file: ModuleFile) -> FileId {
        let id = FileId::from_usize(self.files.len());
        self.files.push(file);
        id
    }

    /// Index every file's module by name.
    pub fn seal(self) -> Result<Repository, TreeError> {
        let mut index: FxHashMap<Name, PartRef> = FxHashMap::default();
        for (i, file) in self.files.iter().enumerate() {
            let id = FileId::from_usize(i);
            let name = file.module_name();
            if let Some(previous) = index.insert(name, PartRef::new(id, file.module())) {
                return Err(TreeError::DuplicateModule {
                    name: self.interner.lookup(name).to_owned(),
                    first: self.files[previous.file.index()].label().to_owned(),
                    second: file.label().to_owned(),
                });
            }
        }
        tracing::debug!(files = self.files.len(), "sealed repository");
        Ok(Repository {
            interner: self.interner,
            files: self.files,
            index,
        })
    }
}

/// Loaded module files, indexed by the name of the module each defines.
pub struct Repository {
    interner: SharedInterner,
    files: Vec<ModuleFile>,
    index: FxHashMap<Name, PartRef>,
}

impl Repository {
    /// The module part defined under `name`.
    pub fn get(&self, name: Name) -> Option<PartRef> {
        self.index.get(&name).copied()
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn file(&self, id: FileId) -> &ModuleFile {
        &self.files[id.index()]
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &ModuleFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, file)| (FileId::from_usize(i), file))
    }

    #[inline]
    pub fn part(&self, part: PartRef) -> &Part {
        self.file(part.file).part(part.part)
    }

    /// Module parts of every file, in file order.
    pub fn modules(&self) -> impl Iterator<Item = PartRef> + '_ {
        self.files().map(|(id, file)| PartRef::new(id, file.module()))
    }

    pub fn name(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    /// Dotted path of a part, for messages.
    pub fn path(&self, part: PartRef) -> String {
        self.file(part.file)
            .tree()
            .path(part.part, &self.interner)
    }
}

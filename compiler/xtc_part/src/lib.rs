//! Component trees, the module repository and the linker.
//!
//! - [`ModuleFile::load`]: header, constant pool and component tree of one
//!   file
//! - [`PartTree`] / [`Part`]: the component arena of a file
//! - [`RepoBuilder`] / [`Repository`]: every loaded file, indexed by module
//!   name, sealed before linking
//! - [`LinkSession`]: links parts and pool references across the
//!   repository, substituting fingerprint modules by their primaries

/// Module file writer for tests of this and dependent crates. Not part of
/// the supported API.
#[doc(hidden)]
pub mod build;
mod contrib;
mod error;
mod file;
mod link;
mod part;
mod repo;
mod tree;

pub use contrib::{Contrib, ContribData};
pub use error::{LinkError, LinkErrorKind, TreeError};
pub use file::{LoadOptions, ModuleFile, MAGIC, VERSION_MAJOR, VERSION_MINOR};
pub use link::{LinkConfig, LinkSession, LinkedContrib};
pub use part::{
    AllowedVersion, ClassInfo, MethodInfo, ModuleInfo, ModuleVersions, Parameter, Part, PartKind,
    PropertyInfo, SourceLines, SuperCall,
};
pub use repo::{RepoBuilder, Repository};
pub use tree::PartTree;

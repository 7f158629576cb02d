//! One run of the driver: load, seal, link, type.

use std::path::Path;

use rayon::prelude::*;
use xtc_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorCode, ErrorGuaranteed};
use xtc_ir::{PartId, PartRef, SharedInterner};
use xtc_part::{LinkSession, ModuleFile, RepoBuilder, Repository};
use xtc_types::TypeEnv;

use crate::Options;

/// Bytes of one module file and the label diagnostics name it by.
#[derive(Clone, Debug)]
pub struct Input {
    pub label: String,
    pub bytes: Vec<u8>,
}

impl Input {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Input {
            label: label.into(),
            bytes,
        }
    }
}

/// Structural type of one class, as printed by `--types`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassType {
    pub path: String,
    pub fields: Vec<String>,
    pub open: bool,
}

#[derive(Debug, Default)]
pub struct Outcome {
    pub diagnostics: Vec<Diagnostic>,
    /// Errors reported, including link errors past the configured limit.
    pub error_count: usize,
    /// Qualified names of the loaded modules, in input order.
    pub modules: Vec<String>,
    pub linked: bool,
    pub classes: Vec<ClassType>,
}

impl Outcome {
    fn failed(queue: &mut DiagnosticQueue) -> Self {
        let error_count = queue.error_count();
        Outcome {
            diagnostics: queue.flush(),
            error_count,
            ..Outcome::default()
        }
    }

    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    pub fn is_success(&self) -> bool {
        self.has_errors().is_none()
    }

    /// Process exit status: 0 on success, 1 on any error.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }
}

fn queue() -> DiagnosticQueue {
    // Link sessions apply their own limit.
    DiagnosticQueue::with_config(DiagnosticConfig {
        error_limit: 0,
        deduplicate: true,
    })
}

/// Read every file named in `options` and process them.
#[tracing::instrument(level = "debug", skip_all, fields(files = options.files.len()))]
pub fn run(options: &Options) -> Outcome {
    let read: Vec<Result<Input, Diagnostic>> =
        options.files.par_iter().map(|path| read_input(path)).collect();
    let mut queue = queue();
    let mut inputs = Vec::with_capacity(read.len());
    for result in read {
        match result {
            Ok(input) => inputs.push(input),
            Err(diag) => {
                queue.add(diag);
            }
        }
    }
    if queue.has_errors().is_some() {
        return Outcome::failed(&mut queue);
    }
    process(inputs, options)
}

fn read_input(path: &Path) -> Result<Input, Diagnostic> {
    let label = path.display().to_string();
    match std::fs::read(path) {
        Ok(bytes) => Ok(Input::new(label, bytes)),
        Err(err) => Err(Diagnostic::error(ErrorCode::E9001)
            .with_message(format!("cannot read {label}: {err}"))),
    }
}

/// Load, link and type in-memory module files.
///
/// Files load in parallel; a file that fails to load is reported and
/// stops the run before linking.
pub fn process(inputs: Vec<Input>, options: &Options) -> Outcome {
    let interner = SharedInterner::new();
    let loaded: Vec<Result<ModuleFile, Diagnostic>> = inputs
        .par_iter()
        .map(|input| {
            ModuleFile::load(&input.bytes, &interner, options.load)
                .map(|file| file.with_label(input.label.clone()))
                .map_err(|err| err.into_diagnostic().in_file(&input.label))
        })
        .collect();

    let mut queue = queue();
    let mut builder = RepoBuilder::new(interner.clone());
    for result in loaded {
        match result {
            Ok(file) => {
                if let Some(warning) = file.trailing_warning() {
                    queue.add(warning);
                }
                builder.add(file);
            }
            Err(diag) => {
                queue.add(diag);
            }
        }
    }
    if queue.has_errors().is_some() {
        return Outcome::failed(&mut queue);
    }
    let repo = match builder.seal() {
        Ok(repo) => repo,
        Err(err) => {
            queue.add(err.into_diagnostic());
            return Outcome::failed(&mut queue);
        }
    };

    let modules = repo.modules().map(|module| repo.path(module)).collect();
    if !options.link {
        return Outcome {
            modules,
            ..Outcome::default()
        };
    }

    let mut session = LinkSession::with_config(&repo, options.link_config);
    session.link_all();

    let mut classes = Vec::new();
    let mut type_diags = Vec::new();
    if options.types {
        let mut env = TypeEnv::new(&mut session);
        env.type_all();
        classes = class_types(&repo, &mut env);
        type_diags = env
            .into_errors()
            .into_iter()
            .map(xtc_types::TypeError::into_diagnostic)
            .collect();
    }

    let suppressed = session.suppressed();
    queue.extend(
        session
            .into_errors()
            .into_iter()
            .map(xtc_part::LinkError::into_diagnostic),
    );
    queue.extend(type_diags);
    let error_count = queue.error_count() + suppressed;
    if suppressed > 0 {
        tracing::debug!(suppressed, "link errors past the limit");
    }
    Outcome {
        diagnostics: queue.flush(),
        error_count,
        modules,
        linked: true,
        classes,
    }
}

fn class_types(repo: &Repository, env: &mut TypeEnv<'_, '_>) -> Vec<ClassType> {
    let mut classes = Vec::new();
    for (file_id, file) in repo.files() {
        for (id, part) in file.tree().iter() {
            if !part.is_class_family() || in_fingerprint(file, id) {
                continue;
            }
            let class = PartRef::new(file_id, id);
            let ty = env.setype(class);
            classes.push(ClassType {
                path: repo.path(class),
                fields: env.field_labels(ty),
                open: env.pool().is_open(ty).unwrap_or(false),
            });
        }
    }
    classes
}

/// Whether `id` is a stub declared under a fingerprint module.
fn in_fingerprint(file: &ModuleFile, id: PartId) -> bool {
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        let part = file.part(current);
        if let Some(module) = part.as_module() {
            return module.kind.is_fingerprint();
        }
        cursor = part.parent;
    }
    false
}

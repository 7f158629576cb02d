//! Collection of diagnostics across all files of one run.
//!
//! - Error limit to keep output bounded
//! - Deduplication of identical diagnostics (the same unresolved symbol is
//!   often reached from several referencing parts)
//! - `ErrorGuaranteed` proof that errors were emitted

use rustc_hash::FxHashSet;

use crate::{Diagnostic, ErrorGuaranteed};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited).
    pub error_limit: usize,
    /// Drop diagnostics equal to one already queued.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 50,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// No limits, no deduplication (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<Diagnostic>,
    error_count: usize,
    suppressed: usize,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            seen: FxHashSet::default(),
            error_count: 0,
            suppressed: 0,
            config,
        }
    }

    /// Queue a diagnostic; returns `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        if diag.is_error() && self.limit_reached() {
            self.suppressed += 1;
            return false;
        }

        if self.config.deduplicate && !self.seen.insert(diag.clone()) {
            return false;
        }

        if diag.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    /// Queue an error and get proof it was reported.
    ///
    /// Filtered errors still count: a duplicate means the same error is
    /// already queued, and past the limit the run has errors anyway.
    pub fn emit_error(&mut self, diag: Diagnostic) -> ErrorGuaranteed {
        debug_assert!(diag.is_error());
        self.add(diag);
        ErrorGuaranteed::new()
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.add(diag);
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Errors dropped because the limit was reached.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count + self.suppressed)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Take all queued diagnostics in insertion order and reset the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.seen.clear();
        self.error_count = 0;
        self.suppressed = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests;

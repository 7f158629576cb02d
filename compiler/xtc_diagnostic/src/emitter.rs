//! Rendering of diagnostics.

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

/// Sink for rendered diagnostics.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic);

    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(diag);
        }
    }

    fn flush(&mut self);

    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}

mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const NOTE: &str = "\x1b[1;36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m";
    pub const RESET: &str = "\x1b[0m";
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Human-readable output with optional ANSI colors.
///
/// ```text
/// error[E3001]: module not found: Lib
///   --> app.xtc @ 0x2A..0x31: referenced from Lib
///   = note: lib.xtc has version 1.0; allowed: 2.0 or newer
/// ```
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
        }
    }

    /// Give the writer back (tests inspect rendered output).
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&self, color: &'static str) -> &'static str {
        if self.colors {
            color
        } else {
            ""
        }
    }

    fn severity_color(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Error => self.paint(colors::ERROR),
            Severity::Warning => self.paint(colors::WARNING),
            Severity::Note => self.paint(colors::NOTE),
        }
    }

    fn write_diagnostic(&mut self, diag: &Diagnostic) -> io::Result<()> {
        let color = self.severity_color(diag.severity);
        let bold = self.paint(colors::BOLD);
        let secondary = self.paint(colors::SECONDARY);
        let reset = self.paint(colors::RESET);

        writeln!(
            self.writer,
            "{color}{}[{}]{reset}{bold}: {}{reset}",
            diag.severity, diag.code, diag.message
        )?;

        for label in &diag.labels {
            let marker = if label.is_primary { "-->" } else { "..." };
            let file = label.file.as_deref().unwrap_or("<module>");
            writeln!(
                self.writer,
                "  {secondary}{marker}{reset} {file} @ {}: {}",
                label.span, label.message
            )?;
        }

        for note in &diag.notes {
            writeln!(self.writer, "  {secondary}={reset} note: {note}")?;
        }

        for suggestion in &diag.suggestions {
            writeln!(self.writer, "  {secondary}={reset} help: {suggestion}")?;
        }

        Ok(())
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        // A closed stderr leaves nowhere to report to.
        let _ = self.write_diagnostic(diagnostic);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }
        let color = self.severity_color(if error_count > 0 {
            Severity::Error
        } else {
            Severity::Warning
        });
        let reset = self.paint(colors::RESET);
        let _ = writeln!(
            self.writer,
            "{color}{error_count} error{}, {warning_count} warning{}{reset}",
            plural_s(error_count),
            plural_s(warning_count)
        );
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

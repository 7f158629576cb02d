//! `xtcc [options] <file.xtc>...`

use std::io::IsTerminal;
use std::process::ExitCode;

use xtc_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use xtcc::{Options, Outcome, UsageError, USAGE};

fn main() -> ExitCode {
    xtcc::init_tracing();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(UsageError::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let outcome = xtcc::run(&options);
    report(&outcome);
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(outcome: &Outcome) {
    let is_tty = std::io::stderr().is_terminal();
    let mut emitter = TerminalEmitter::with_color_mode(std::io::stderr(), ColorMode::Auto, is_tty);
    emitter.emit_all(&outcome.diagnostics);
    let warnings = outcome
        .diagnostics
        .iter()
        .filter(|d| !d.is_error())
        .count();
    emitter.emit_summary(outcome.error_count, warnings);
    emitter.flush();

    for class in &outcome.classes {
        let mut fields = class.fields.join(", ");
        if class.open {
            fields.push_str(if fields.is_empty() { ".." } else { ", .." });
        }
        println!("{} {{ {fields} }}", class.path);
    }
    if outcome.is_success() {
        let action = if outcome.linked { "linked" } else { "loaded" };
        println!(
            "OK: {action} {} module(s): {}",
            outcome.modules.len(),
            outcome.modules.join(", ")
        );
    }
}

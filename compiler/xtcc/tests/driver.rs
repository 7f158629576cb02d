// Test code uses unwrap for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used)]

//! End-to-end runs of the driver over module files written with
//! [`FileBuilder`].

use std::process::Command;

use pretty_assertions::assert_eq;
use xtc_diagnostic::ErrorCode;
use xtc_ir::{ComponentFormat, Composition, ConstFormat, ModuleKind};
use xtc_part::build::FileBuilder;
use xtc_wire::RawConst;
use xtcc::{process, ClassType, Input, Options, Outcome};

fn literal(b: &mut FileBuilder, text: &str) -> u32 {
    let text = b.string(text);
    b.constant(RawConst::Literal {
        format: ConstFormat::IntLiteral,
        text,
    })
}

/// `Lib` at version 1.0 with `Widget { size }`.
fn lib() -> FileBuilder {
    let mut b = FileBuilder::new("Lib");
    let module = b.module();
    b.set_version(module, "1.0");
    let int = literal(&mut b, "0");
    let widget = b.class(module, "Widget", ComponentFormat::Class);
    b.property(widget, "size", int);
    b
}

/// `App` with `Main extends Lib.Widget` and `resize(Int)`, reaching `Lib`
/// through a required fingerprint.
fn app(allowed: &[(&str, bool)]) -> FileBuilder {
    let mut b = FileBuilder::new("App");
    let fingerprint = b.fingerprint("Lib", ModuleKind::Required, allowed);
    let stub = b.class(fingerprint, "Widget", ComponentFormat::Class);
    let stub_ty = b.type_of(stub);
    let int = literal(&mut b, "0");
    let module = b.module();
    let main = b.class(module, "Main", ComponentFormat::Class);
    b.contribute(main, Composition::Extends, stub_ty);
    b.method(main, "resize", &[int], &[], 0);
    b
}

fn inputs(files: &[(&str, &FileBuilder)]) -> Vec<Input> {
    files
        .iter()
        .map(|(label, b)| Input::new(*label, b.build()))
        .collect()
}

fn options(args: &[&str]) -> Options {
    let mut all: Vec<&str> = args.to_vec();
    all.push("unused.xtc");
    Options::parse(all).unwrap()
}

fn codes(outcome: &Outcome) -> Vec<ErrorCode> {
    outcome.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn links_a_fingerprint_to_its_primary() {
    let (lib, app) = (lib(), app(&[("1.0", false)]));
    let outcome = process(
        inputs(&[("lib.xtc", &lib), ("app.xtc", &app)]),
        &options(&[]),
    );
    assert!(outcome.is_success(), "{:?}", outcome.diagnostics);
    assert!(outcome.linked);
    assert_eq!(outcome.modules, vec!["Lib", "App"]);
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn missing_dependency_fails_the_run() {
    let app = app(&[]);
    let outcome = process(inputs(&[("app.xtc", &app)]), &options(&[]));
    assert!(!outcome.is_success());
    assert_eq!(outcome.exit_code(), 1);
    assert!(codes(&outcome).contains(&ErrorCode::E3001));
    let diag = &outcome.diagnostics[0];
    assert_eq!(diag.message, "module not found: Lib");
    assert_eq!(diag.labels[0].file.as_deref(), Some("app.xtc"));
    assert_eq!(
        diag.suggestions,
        vec!["add the file defining module Lib".to_owned()]
    );
}

#[test]
fn version_constraint_is_checked() {
    let (lib, app) = (lib(), app(&[("2.0", false)]));
    let outcome = process(
        inputs(&[("lib.xtc", &lib), ("app.xtc", &app)]),
        &options(&[]),
    );
    assert_eq!(codes(&outcome)[0], ErrorCode::E3001);
    assert_eq!(
        outcome.diagnostics[0].notes,
        vec!["lib.xtc has version 1.0; allowed: 2.0 or newer".to_owned()]
    );
}

#[test]
fn no_link_only_loads() {
    let app = app(&[]);
    let outcome = process(inputs(&[("app.xtc", &app)]), &options(&["--no-link"]));
    assert!(outcome.is_success());
    assert!(!outcome.linked);
    assert_eq!(outcome.modules, vec!["App"]);
}

#[test]
fn load_failure_stops_before_linking() {
    let lib = lib();
    let mut inputs = inputs(&[("lib.xtc", &lib)]);
    inputs.push(Input::new("junk.xtc", vec![0xDE, 0xAD, 0xBE, 0xEF]));
    let outcome = process(inputs, &options(&[]));
    assert_eq!(codes(&outcome), vec![ErrorCode::E0001]);
    assert_eq!(outcome.diagnostics[0].labels[0].file.as_deref(), Some("junk.xtc"));
    assert!(!outcome.linked);
    assert!(outcome.modules.is_empty());
}

#[test]
fn trailing_bytes_warn_when_allowed() {
    let mut lib = lib();
    lib.trailing(&[0, 0]);
    let strict = process(inputs(&[("lib.xtc", &lib)]), &options(&[]));
    assert_eq!(codes(&strict), vec![ErrorCode::E0004]);

    let lenient = process(inputs(&[("lib.xtc", &lib)]), &options(&["--allow-trailing"]));
    assert!(lenient.is_success(), "{:?}", lenient.diagnostics);
    assert_eq!(lenient.diagnostics.len(), 1);
    assert!(!lenient.diagnostics[0].is_error());
    assert_eq!(lenient.modules, vec!["Lib"]);
}

#[test]
fn duplicate_modules_are_rejected() {
    let (a, b) = (lib(), lib());
    let outcome = process(inputs(&[("a.xtc", &a), ("b.xtc", &b)]), &options(&[]));
    assert_eq!(codes(&outcome), vec![ErrorCode::E2001]);
    assert_eq!(
        outcome.diagnostics[0].notes,
        vec!["defined in a.xtc and b.xtc".to_owned()]
    );
}

#[test]
fn types_of_every_class() {
    let (lib, app) = (lib(), app(&[]));
    let outcome = process(
        inputs(&[("lib.xtc", &lib), ("app.xtc", &app)]),
        &options(&["--types"]),
    );
    assert!(outcome.is_success(), "{:?}", outcome.diagnostics);
    let main = outcome
        .classes
        .iter()
        .find(|c| c.path == "App.Main")
        .unwrap();
    assert_eq!(
        main,
        &ClassType {
            path: "App.Main".to_owned(),
            fields: vec!["resize/1".to_owned(), "size".to_owned()],
            open: false,
        }
    );
    // The fingerprint's stub is not listed next to the real class.
    assert_eq!(
        outcome
            .classes
            .iter()
            .filter(|c| c.path == "Lib.Widget")
            .count(),
        1
    );
}

#[test]
fn error_limit_counts_suppressed_errors() {
    let mut b = FileBuilder::new("Many");
    let module = b.module();
    for i in 0..4 {
        let ghost = b.module_const(&format!("Ghost{i}"));
        b.package(module, &format!("p{i}"), Some(ghost));
    }
    let outcome = process(inputs(&[("many.xtc", &b)]), &options(&["--error-limit=2"]));
    assert_eq!(outcome.diagnostics.len(), 2);
    assert_eq!(outcome.error_count, 4);
}

#[test]
fn run_reads_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let lib_path = dir.path().join("lib.xtc");
    std::fs::write(&lib_path, lib().build()).unwrap();
    let missing = dir.path().join("missing.xtc");

    let options = Options::parse([lib_path.display().to_string()]).unwrap();
    assert!(xtcc::run(&options).is_success());

    let options = Options::parse([
        lib_path.display().to_string(),
        missing.display().to_string(),
    ])
    .unwrap();
    let outcome = xtcc::run(&options);
    assert_eq!(codes(&outcome), vec![ErrorCode::E9001]);
    assert!(outcome.diagnostics[0].message.starts_with("cannot read "));
}

#[test]
fn binary_exit_codes() {
    let bin = env!("CARGO_BIN_EXE_xtcc");
    let dir = tempfile::tempdir().unwrap();
    let lib_path = dir.path().join("lib.xtc");
    std::fs::write(&lib_path, lib().build()).unwrap();
    let app_path = dir.path().join("app.xtc");
    std::fs::write(&app_path, app(&[]).build()).unwrap();

    let usage = Command::new(bin).output().unwrap();
    assert_eq!(usage.status.code(), Some(2));

    let ok = Command::new(bin).arg(&lib_path).arg(&app_path).output().unwrap();
    assert_eq!(ok.status.code(), Some(0));
    let stdout = String::from_utf8(ok.stdout).unwrap();
    assert!(stdout.contains("OK: linked 2 module(s): Lib, App"), "{stdout}");

    let broken = Command::new(bin).arg(&app_path).output().unwrap();
    assert_eq!(broken.status.code(), Some(1));
    let stderr = String::from_utf8(broken.stderr).unwrap();
    assert!(stderr.contains("error[E3001]: module not found: Lib"), "{stderr}");
}

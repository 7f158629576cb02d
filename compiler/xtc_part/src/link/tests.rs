use pretty_assertions::assert_eq;
use xtc_diagnostic::ErrorCode;
use xtc_ir::{ComponentFormat, SharedInterner};

use super::*;
use crate::build::{ContribSpec, FileBuilder};
use crate::{LoadOptions, ModuleFile, RepoBuilder};

fn repo(files: &[&FileBuilder]) -> Repository {
    let interner = SharedInterner::new();
    let mut builder = RepoBuilder::new(interner.clone());
    for (i, b) in files.iter().enumerate() {
        let file = ModuleFile::load(&b.build(), &interner, LoadOptions::default())
            .unwrap()
            .with_label(format!("file{i}.xtc"));
        builder.add(file);
    }
    builder.seal().unwrap()
}

/// Part at a dotted path from the root of file `file`.
fn find(repo: &Repository, file: u32, path: &str) -> PartRef {
    let file = FileId::from_raw(file);
    let mut part = PartId::ROOT;
    for segment in path.split('.') {
        let name = repo.interner().get(segment).unwrap();
        part = repo.file(file).child(part, name).unwrap();
    }
    PartRef::new(file, part)
}

fn name(repo: &Repository, text: &str) -> Name {
    repo.interner().get(text).unwrap()
}

fn codes(session: &LinkSession<'_>) -> Vec<ErrorCode> {
    session.errors().iter().map(LinkError::code).collect()
}

/// `Lib` with class `Widget`, optionally versioned.
fn lib(version: Option<&str>) -> FileBuilder {
    let mut b = FileBuilder::new("Lib");
    let module = b.module();
    b.class(module, "Widget", ComponentFormat::Class);
    if let Some(version) = version {
        b.set_version(module, version);
    }
    b
}

/// `App` whose class `Main` extends `Lib.Widget` through a fingerprint.
fn app(kind: ModuleKind, allowed: &[(&str, bool)]) -> FileBuilder {
    let mut b = FileBuilder::new("App");
    let fingerprint = b.fingerprint("Lib", kind, allowed);
    let widget = b.class(fingerprint, "Widget", ComponentFormat::Class);
    let widget_ty = b.type_of(widget);
    let module = b.module();
    let main = b.class(module, "Main", ComponentFormat::Class);
    b.contribute(main, Composition::Extends, widget_ty);
    b
}

#[test]
fn required_fingerprint_links_to_the_primary() {
    let lib = lib(None);
    let app = app(ModuleKind::Required, &[]);
    let repo = repo(&[&lib, &app]);
    let mut session = LinkSession::new(&repo);
    session.link_all();
    assert!(session.is_success(), "{:?}", session.errors());

    let fingerprint = find(&repo, 1, "Lib");
    assert_eq!(session.link(fingerprint), find(&repo, 0, "Lib"));
    assert_eq!(session.resolved(fingerprint), find(&repo, 0, "Lib"));

    let main = find(&repo, 1, "App.Main");
    assert_eq!(session.super_class(main), Some(find(&repo, 0, "Lib.Widget")));
}

#[test]
fn missing_primary_is_unresolved() {
    let app = app(ModuleKind::Required, &[]);
    let repo = repo(&[&app]);
    let mut session = LinkSession::new(&repo);
    session.link_all();

    assert!(!session.is_success());
    let first = &session.errors()[0];
    assert_eq!(first.code(), ErrorCode::E3001);
    assert_eq!(first.to_string(), "module not found: Lib");
    assert_eq!(first.path, "Lib");
    assert_eq!(first.file, "file0.xtc");

    let fingerprint = find(&repo, 0, "Lib");
    assert_eq!(session.link(fingerprint), fingerprint);
}

#[test]
fn version_constraints() {
    let cases: &[(Option<&str>, &[(&str, bool)], bool)] = &[
        (Some("1.2"), &[("1.0", false)], true),
        (Some("1.2"), &[("1.2", true)], true),
        (Some("1.2.0"), &[("1.2", true)], true),
        (Some("1.2"), &[("1.3", true)], false),
        (Some("1.2"), &[("2.0", false)], false),
        (Some("1.2"), &[("2.0", false), ("1.1", false)], true),
        (None, &[("1.0", false)], false),
        (None, &[], true),
    ];
    for &(version, allowed, linked) in cases {
        let lib = lib(version);
        let app = app(ModuleKind::Required, allowed);
        let repo = repo(&[&lib, &app]);
        let mut session = LinkSession::new(&repo);
        session.link_all();
        assert_eq!(
            session.is_success(),
            linked,
            "version {version:?} against {allowed:?}: {:?}",
            session.errors()
        );
        if !linked {
            assert!(matches!(
                &session.errors()[0].kind,
                LinkErrorKind::Unresolved {
                    what: "module",
                    detail: Some(_),
                    ..
                }
            ));
        }
    }
}

#[test]
fn unsatisfied_version_detail() {
    let lib = lib(Some("1.2"));
    let app = app(ModuleKind::Desired, &[("2.0", false), ("1.5", true)]);
    let repo = repo(&[&lib, &app]);
    let mut session = LinkSession::new(&repo);
    session.link_all();
    let diag = session.into_errors().remove(0).into_diagnostic();
    assert_eq!(
        diag.notes,
        vec!["file0.xtc has version 1.2; allowed: 2.0 or newer, 1.5".to_owned()]
    );
}

#[test]
fn linking_is_idempotent() {
    let lib = lib(None);
    let app = app(ModuleKind::Required, &[]);
    let repo = repo(&[&lib, &app]);
    let mut session = LinkSession::new(&repo);

    let main = find(&repo, 1, "App.Main");
    let first = session.link(main);
    let errors = session.errors().len();
    assert_eq!(session.link(main), first);
    session.link_all();
    session.link_all();
    assert_eq!(session.link(main), first);
    assert_eq!(session.errors().len(), errors);
    assert!(session.is_linked(find(&repo, 0, "Lib.Widget")));
}

#[test]
fn missing_class_names_the_referencing_part() {
    let mut lib = FileBuilder::new("Lib");
    lib.class(lib.module(), "Other", ComponentFormat::Class);
    let app = app(ModuleKind::Required, &[]);
    let repo = repo(&[&lib, &app]);
    let mut session = LinkSession::new(&repo);
    session.link_all();

    assert_eq!(codes(&session), vec![ErrorCode::E3001]);
    let error = &session.errors()[0];
    assert_eq!(error.to_string(), "class not found: Widget");
    assert_eq!(error.path, "App.Main");
}

/// Class `Calc` in module `M` with overloads of `f`, `g` and `h`.
fn calc() -> FileBuilder {
    let mut b = FileBuilder::new("M");
    let module = b.module();
    let int = b.class(module, "Int", ComponentFormat::Class);
    let int_ty = b.type_of(int);
    let calc = b.class(module, "Calc", ComponentFormat::Class);
    b.method(calc, "f", &[int_ty], &[], 0);
    b.method(calc, "f", &[int_ty, int_ty], &[int_ty], 0);
    b.method(calc, "g", &[int_ty, int_ty], &[], 1);
    b.method(calc, "g", &[int_ty], &[], 0);
    b.method(calc, "h", &[int_ty, int_ty], &[], 1);
    b.method(calc, "h", &[int_ty, int_ty, int_ty], &[], 2);
    b
}

fn overload(repo: &Repository, path: &str, nth: usize) -> PartRef {
    let head = find(repo, 0, path);
    let tree = repo.file(head.file).tree();
    PartRef::new(head.file, tree.overloads(head.part).nth(nth).unwrap())
}

#[test]
fn overload_selected_by_arity() {
    let b = calc();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let calc = find(&repo, 0, "M.Calc");
    let f = name(&repo, "f");

    assert_eq!(
        session.find_method(calc, f, 1),
        Some(overload(&repo, "M.Calc.f.f", 0))
    );
    assert_eq!(
        session.find_method(calc, f, 2),
        Some(overload(&repo, "M.Calc.f.f", 1))
    );
    assert!(session.is_success());

    assert_eq!(session.find_method(calc, f, 3), None);
    assert_eq!(codes(&session), vec![ErrorCode::E3001]);
    assert_eq!(session.errors()[0].to_string(), "method not found: f");
}

#[test]
fn exact_count_beats_defaults() {
    let b = calc();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let calc = find(&repo, 0, "M.Calc");
    let g = name(&repo, "g");

    assert_eq!(
        session.find_method(calc, g, 1),
        Some(overload(&repo, "M.Calc.g.g", 1))
    );
    assert_eq!(
        session.find_method(calc, g, 2),
        Some(overload(&repo, "M.Calc.g.g", 0))
    );
    assert!(session.is_success());
}

#[test]
fn several_default_matches_are_ambiguous() {
    let b = calc();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let calc = find(&repo, 0, "M.Calc");

    assert_eq!(session.find_method(calc, name(&repo, "h"), 1), None);
    assert_eq!(codes(&session), vec![ErrorCode::E2002]);
    match &session.errors()[0].kind {
        LinkErrorKind::Ambiguous { name, candidates } => {
            assert_eq!(name, "h");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn unknown_method_name() {
    let b = calc();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let calc = find(&repo, 0, "M.Calc");
    assert_eq!(session.find_method(calc, name(&repo, "Int"), 0), None);
    assert_eq!(codes(&session), vec![ErrorCode::E3001]);
}

#[test]
fn method_identity_links_to_its_own_overload() {
    let b = calc();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    session.link_all();
    assert!(session.is_success(), "{:?}", session.errors());

    let calc = find(&repo, 0, "M.Calc");
    for nth in 0..2 {
        let method = overload(&repo, "M.Calc.h.h", nth);
        let identity = repo.part(method).identity.unwrap();
        assert_eq!(session.link_const(calc, identity), Some(method));
    }
}

/// `Base` with property `size`, `Derived` extending it, and two interfaces
/// that both declare `name`.
fn hierarchy() -> FileBuilder {
    let mut b = FileBuilder::new("H");
    let module = b.module();
    let int = b.class(module, "Int", ComponentFormat::Class);
    let int_ty = b.type_of(int);

    let base = b.class(module, "Base", ComponentFormat::Class);
    b.property(base, "size", int_ty);
    let base_ty = b.type_of(base);
    let derived = b.class(module, "Derived", ComponentFormat::Class);
    b.contribute(derived, Composition::Extends, base_ty);
    b.property(derived, "size2", int_ty);

    let named = b.class(module, "Named", ComponentFormat::Interface);
    b.property(named, "name", int_ty);
    let titled = b.class(module, "Titled", ComponentFormat::Interface);
    b.property(titled, "name", int_ty);
    let both = b.class(module, "Both", ComponentFormat::Class);
    let named_ty = b.type_of(named);
    let titled_ty = b.type_of(titled);
    b.contribute(both, Composition::Implements, named_ty);
    b.contribute(both, Composition::Implements, titled_ty);
    b
}

#[test]
fn child_searches_contributions() {
    let b = hierarchy();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let derived = find(&repo, 0, "H.Derived");

    assert_eq!(
        session.child(derived, name(&repo, "size")),
        Some(find(&repo, 0, "H.Base.size"))
    );
    assert_eq!(
        session.child(derived, name(&repo, "size2")),
        Some(find(&repo, 0, "H.Derived.size2"))
    );
    assert_eq!(session.child(derived, name(&repo, "Int")), None);
    assert!(session.is_success());
}

#[test]
fn two_inherited_matches_are_ambiguous() {
    let b = hierarchy();
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let both = find(&repo, 0, "H.Both");

    assert_eq!(session.child(both, name(&repo, "name")), None);
    assert_eq!(codes(&session), vec![ErrorCode::E2002]);
    match &session.errors()[0].kind {
        LinkErrorKind::Ambiguous { candidates, .. } => {
            assert_eq!(
                candidates,
                &vec!["H.Named.name".to_owned(), "H.Titled.name".to_owned()]
            );
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn inheritance_cycle_terminates() {
    let mut b = FileBuilder::new("C");
    let module = b.module();
    let a = b.class(module, "A", ComponentFormat::Class);
    let c = b.class(module, "B", ComponentFormat::Class);
    let a_ty = b.type_of(a);
    let c_ty = b.type_of(c);
    b.contribute(a, Composition::Extends, c_ty);
    b.contribute(c, Composition::Extends, a_ty);
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    session.link_all();
    assert!(session.is_success(), "{:?}", session.errors());

    let a = find(&repo, 0, "C.A");
    assert_eq!(session.super_class(a), Some(find(&repo, 0, "C.B")));
    assert_eq!(session.child(a, name(&repo, "missing")), None);
}

#[test]
fn lookup_through_a_class_being_linked_keeps_its_contributions() {
    // `A extends B`, `B { next: C; size: C }`, `C extends B`: linking `A`
    // reaches `C` while the reference to `B` is still being linked.
    let mut b = FileBuilder::new("P");
    let module = b.module();
    let a = b.class(module, "A", ComponentFormat::Class);
    let b_class = b.class(module, "B", ComponentFormat::Class);
    let c = b.class(module, "C", ComponentFormat::Class);
    let b_ty = b.type_of(b_class);
    let c_ty = b.type_of(c);
    b.contribute(a, Composition::Extends, b_ty);
    b.property(b_class, "next", c_ty);
    b.property(b_class, "size", c_ty);
    b.contribute(c, Composition::Extends, b_ty);
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    session.link_all();
    assert!(session.is_success(), "{:?}", session.errors());

    let b_part = find(&repo, 0, "P.B");
    let c = find(&repo, 0, "P.C");
    assert_eq!(session.super_class(c), Some(b_part));
    assert_eq!(session.super_class(find(&repo, 0, "P.A")), Some(b_part));
    assert_eq!(
        session.child(c, name(&repo, "size")),
        Some(find(&repo, 0, "P.B.size"))
    );
    let size = repo.part(find(&repo, 0, "P.B.size")).as_property().unwrap().ty;
    assert_eq!(session.link_const(b_part, size), Some(c));
}

#[test]
fn every_referencing_part_reports_a_missing_class() {
    let mut b = FileBuilder::new("Gone");
    let module = b.module();
    let parent = b.identity(module);
    let ghost_name = b.string("Ghost");
    let ghost = b.constant(xtc_wire::RawConst::Named {
        format: ConstFormat::Class,
        parent,
        name: ghost_name,
    });
    let ghost_ty = b.constant(xtc_wire::RawConst::TerminalType { def: ghost });
    let x = b.class(module, "X", ComponentFormat::Class);
    b.contribute(x, Composition::Extends, ghost_ty);
    let y = b.class(module, "Y", ComponentFormat::Class);
    b.contribute(y, Composition::Extends, ghost_ty);
    b.contribute(y, Composition::Implements, ghost);
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    session.link_all();

    assert_eq!(codes(&session), vec![ErrorCode::E3001, ErrorCode::E3001]);
    let paths: Vec<&str> = session.errors().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["Gone.X", "Gone.Y"]);
    assert_eq!(session.errors()[1].to_string(), "class not found: Ghost");

    // Asking again from a part already told adds nothing.
    let y = find(&repo, 0, "Gone.Y");
    assert_eq!(session.link_const(y, ConstId::from_raw(ghost_ty)), None);
    assert_eq!(session.errors().len(), 2);
}

#[test]
fn contribution_data_is_linked() {
    let mut b = FileBuilder::new("D");
    let module = b.module();
    let int = b.class(module, "Int", ComponentFormat::Class);
    let int_ty = b.type_of(int);
    let list = b.class(module, "List", ComponentFormat::Mixin);
    let list_ty = b.type_of(list);
    let holder = b.class(module, "Holder", ComponentFormat::Class);
    let inner = b.property(holder, "inner", int_ty);
    let element = b.string("Element");
    b.contribute_spec(
        holder,
        ContribSpec {
            composition: Composition::Incorporates,
            ty: list_ty,
            extra: None,
            bindings: vec![(element, Some(int_ty))],
        },
    );
    let inner_id = b.identity(inner);
    b.contribute_spec(
        holder,
        ContribSpec {
            composition: Composition::Delegates,
            ty: int_ty,
            extra: Some(inner_id),
            bindings: Vec::new(),
        },
    );
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    let holder = find(&repo, 0, "D.Holder");
    let int = find(&repo, 0, "D.Int");

    let linked = session.link_contribs(holder).to_vec();
    assert_eq!(linked.len(), 2);
    assert_eq!(linked[0].ty, Some(find(&repo, 0, "D.List")));
    assert_eq!(
        linked[0].bindings.get(&name(&repo, "Element")),
        Some(&Some(int))
    );
    assert_eq!(linked[1].ty, Some(int));
    assert_eq!(linked[1].data, Some(find(&repo, 0, "D.Holder.inner")));
    assert_eq!(session.mixins(holder).as_slice(), &[find(&repo, 0, "D.List")]);
    assert_eq!(session.super_class(holder), None);
    assert!(session.is_success());
}

#[test]
fn rebase_and_import_are_unsupported() {
    let mut b = FileBuilder::new("U");
    let module = b.module();
    let base = b.class(module, "Base", ComponentFormat::Class);
    let base_ty = b.type_of(base);
    let class = b.class(module, "C", ComponentFormat::Class);
    b.contribute(class, Composition::RebasesOnto, base_ty);
    let other = b.module_const("Other");
    b.contribute_spec(
        class,
        ContribSpec {
            composition: Composition::ImportRequired,
            ty: base_ty,
            extra: Some(other),
            bindings: Vec::new(),
        },
    );
    let repo = repo(&[&b]);
    let mut session = LinkSession::new(&repo);
    session.link_all();

    assert_eq!(codes(&session), vec![ErrorCode::E4001, ErrorCode::E4001]);
    assert_eq!(
        session.errors()[0].to_string(),
        "unsupported construct: RebasesOnto contribution"
    );
    // The rest of the module still links.
    assert!(session.is_linked(find(&repo, 0, "U.Base")));
}

#[test]
fn error_limit_counts_the_rest() {
    let mut b = FileBuilder::new("E");
    let module = b.module();
    for class in ["A", "B", "C"] {
        let missing = b.module_const(&format!("Missing{class}"));
        let name = b.string("T");
        let ty = b.constant(xtc_wire::RawConst::Named {
            format: ConstFormat::Class,
            parent: missing,
            name,
        });
        let node = b.class(module, class, ComponentFormat::Class);
        b.contribute(node, Composition::Implements, ty);
    }
    let repo = repo(&[&b]);
    let mut session = LinkSession::with_config(&repo, LinkConfig { error_limit: 2 });
    session.link_all();

    assert_eq!(session.errors().len(), 2);
    assert_eq!(session.suppressed(), 1);
    assert!(session.has_errors());
}

#[test]
fn default_config() {
    assert_eq!(LinkConfig::default().error_limit, 50);
}

use pretty_assertions::assert_eq;
use xtc_diagnostic::ErrorCode;
use xtc_ir::{ComponentFormat, ConstFormat};
use xtc_wire::{RawConst, Writer};

use super::*;
use crate::build::FileBuilder;

fn header() -> Writer {
    let mut w = Writer::new();
    w.u32(MAGIC).u32(VERSION_MAJOR).u32(VERSION_MINOR);
    w
}

#[test]
fn loads_primary_module() {
    let interner = StringInterner::new();
    let mut b = FileBuilder::new("Shapes");
    let module = b.module();
    b.class(module, "Point", ComponentFormat::Class);
    let file = ModuleFile::load(&b.build(), &interner, LoadOptions::default()).unwrap();

    assert_eq!(interner.lookup(file.module_name()), "Shapes");
    assert_eq!(file.module_kind(), Some(ModuleKind::Primary));
    assert_eq!(file.part(file.module()).identity, Some(file.module_id()));
    assert_eq!(file.label(), "<memory>");
    assert_eq!(file.with_label("shapes.xtc").label(), "shapes.xtc");
}

#[test]
fn bad_magic_fails_before_the_pool() {
    let interner = StringInterner::new();
    let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0xFF, 0xFF, 0xFF];
    let err = ModuleFile::load(&bytes, &interner, LoadOptions::default()).unwrap_err();
    assert_eq!(err, TreeError::BadMagic(0xDEAD_BEEF));
    assert_eq!(err.code(), ErrorCode::E0001);
    assert!(interner.get("Shapes").is_none());
}

#[test]
fn version_must_match_exactly() {
    let interner = StringInterner::new();
    let mut bytes = FileBuilder::new("Shapes").build();
    bytes[8..12].copy_from_slice(&(VERSION_MINOR + 1).to_be_bytes());
    let err = ModuleFile::load(&bytes, &interner, LoadOptions::default()).unwrap_err();
    assert_eq!(
        err,
        TreeError::VersionMismatch {
            major: VERSION_MAJOR,
            minor: VERSION_MINOR + 1,
        }
    );
    assert_eq!(err.code(), ErrorCode::E0002);
    let diag = err.into_diagnostic();
    assert!(diag.notes.iter().any(|n| n.contains("20230724")));
}

#[test]
fn truncated_file() {
    let interner = StringInterner::new();
    let bytes = FileBuilder::new("Shapes").build();
    let err =
        ModuleFile::load(&bytes[..bytes.len() - 1], &interner, LoadOptions::default())
            .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0003);
}

#[test]
fn trailing_bytes() {
    let interner = StringInterner::new();
    let mut b = FileBuilder::new("Shapes");
    b.trailing(&[0, 0, 0]);
    let bytes = b.build();

    let err = ModuleFile::load(&bytes, &interner, LoadOptions::default()).unwrap_err();
    assert_eq!(
        err,
        TreeError::TrailingBytes {
            offset: bytes.len() - 3,
            remaining: 3,
        }
    );
    assert_eq!(err.code(), ErrorCode::E0004);

    let lenient = LoadOptions {
        allow_trailing: true,
    };
    let file = ModuleFile::load(&bytes, &interner, lenient)
        .unwrap()
        .with_label("shapes.xtc");
    let warning = file.trailing_warning().unwrap();
    assert!(!warning.is_error());
    assert_eq!(
        warning.message,
        "ignoring 3 trailing byte(s) after the component tree"
    );
    assert_eq!(warning.labels[0].file.as_deref(), Some("shapes.xtc"));

    let clean = ModuleFile::load(&FileBuilder::new("Shapes").build(), &interner, lenient).unwrap();
    assert!(clean.trailing_warning().is_none());
}

#[test]
fn root_index_must_name_a_module() {
    let interner = StringInterner::new();
    let mut w = header();
    w.magnitude(1);
    RawConst::String("Shapes".into()).encode(&mut w);
    w.required_index(0).magnitude(0);
    let err = ModuleFile::load(w.as_bytes(), &interner, LoadOptions::default()).unwrap_err();
    assert_eq!(
        err,
        TreeError::NotAModule {
            found: ConstFormat::String,
        }
    );
}

#[test]
fn method_naming_itself_fails_to_load() {
    let interner = StringInterner::new();
    let mut w = header();
    w.magnitude(2);
    RawConst::String("f".into()).encode(&mut w);
    RawConst::Method {
        multi: 1,
        signature: 0,
        lambda: false,
    }
    .encode(&mut w);
    w.required_index(1).magnitude(0);
    let err = ModuleFile::load(w.as_bytes(), &interner, LoadOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0004);
    assert!(matches!(
        err,
        TreeError::Pool(xtc_pool::PoolError::WrongKind {
            index: 1,
            expected: "a MultiMethod",
            ..
        })
    ));
}

#[test]
fn module_component_must_exist() {
    let interner = StringInterner::new();
    let mut w = header();
    w.magnitude(2);
    RawConst::String("Shapes".into()).encode(&mut w);
    RawConst::Module { name: 0 }.encode(&mut w);
    w.required_index(1).magnitude(0);
    let err = ModuleFile::load(w.as_bytes(), &interner, LoadOptions::default()).unwrap_err();
    assert_eq!(
        err,
        TreeError::MissingModule {
            name: "Shapes".to_owned(),
        }
    );
}

#[test]
fn fingerprints_sit_beside_the_primary() {
    let interner = StringInterner::new();
    let mut b = FileBuilder::new("App");
    b.fingerprint("Lib", ModuleKind::Required, &[("1.2", false)]);
    let file = ModuleFile::load(&b.build(), &interner, LoadOptions::default()).unwrap();

    let lib = file
        .child(PartId::ROOT, interner.get("Lib").unwrap())
        .unwrap();
    let info = file.part(lib).as_module().unwrap();
    assert_eq!(info.kind, ModuleKind::Required);
    match &info.versions {
        crate::ModuleVersions::Fingerprint { allowed, preferred } => {
            assert_eq!(allowed.len(), 1);
            assert_eq!(allowed[0].version.to_string(), "1.2");
            assert!(!allowed[0].exact);
            assert!(preferred.is_empty());
        }
        other => panic!("expected fingerprint versions, got {other:?}"),
    }
    assert_eq!(info.version(), None);
}

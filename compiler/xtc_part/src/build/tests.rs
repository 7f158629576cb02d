use pretty_assertions::assert_eq;
use xtc_ir::{ConstId, PartId, StringInterner};

use super::*;
use crate::{LoadOptions, ModuleFile, PartKind};

#[test]
fn strings_and_modules_are_shared() {
    let mut b = FileBuilder::new("Shapes");
    let first = b.string("Point");
    assert_eq!(b.string("Point"), first);
    assert_eq!(b.module_const("Shapes"), b.identity(b.module()));
}

#[test]
fn header_comes_first() {
    let bytes = FileBuilder::new("Shapes").build();
    assert_eq!(&bytes[..4], &MAGIC.to_be_bytes());
    assert_eq!(&bytes[4..8], &VERSION_MAJOR.to_be_bytes());
    assert_eq!(&bytes[8..12], &VERSION_MINOR.to_be_bytes());
}

#[test]
fn built_file_loads_back() {
    let mut b = FileBuilder::new("Shapes");
    let module = b.module();
    let point = b.class(module, "Point", ComponentFormat::Const);
    let int = b.class(module, "Int", ComponentFormat::Class);
    let int_ty = b.type_of(int);
    b.property(point, "x", int_ty);
    b.method(point, "move", &[int_ty, int_ty], &[], 1);
    b.set_version(module, "1.0");

    let interner = StringInterner::new();
    let file = ModuleFile::load(&b.build(), &interner, LoadOptions::default()).unwrap();
    assert_eq!(interner.lookup(file.module_name()), "Shapes");
    assert_eq!(
        file.module_info().and_then(|m| m.version()).map(ToString::to_string),
        Some("1.0".to_owned())
    );

    let name = |s: &str| interner.get(s).unwrap();
    let point = file.child(file.module(), name("Point")).unwrap();
    assert_eq!(file.part(point).format(), ComponentFormat::Const);
    let x = file.child(point, name("x")).unwrap();
    assert_eq!(
        file.part(x).as_property().map(|p| p.ty),
        Some(ConstId::from_raw(int_ty))
    );

    let multi = file.child(point, name("move")).unwrap();
    assert!(matches!(file.part(multi).kind, PartKind::MultiMethod));
    let method = file.child(multi, name("move")).unwrap();
    let info = file.part(method).as_method().unwrap();
    assert_eq!(info.params.len(), 2);
    assert_eq!(info.default_count, 1);
    assert_eq!(info.params[1].default, Some(ConstId::from_raw(int_ty)));
    assert_eq!(file.part(method).parent, Some(multi));
    assert_eq!(file.part(file.module()).parent, Some(PartId::ROOT));
}

#[test]
fn multi_method_is_reused() {
    let mut b = FileBuilder::new("M");
    let module = b.module();
    let class = b.class(module, "C", ComponentFormat::Class);
    let first = b.multi_method(class, "f");
    assert_eq!(b.multi_method(class, "f"), first);
    assert_ne!(b.multi_method(class, "g"), first);
}

use super::*;

#[test]
fn test_const_format_ordinals() {
    assert_eq!(ConstFormat::IntLiteral.tag(), 0);
    assert_eq!(ConstFormat::Int16.tag(), 4);
    assert_eq!(ConstFormat::String.tag(), 29);
    assert_eq!(ConstFormat::Module.tag(), 56);
    assert_eq!(ConstFormat::Signature.tag(), 74);
    assert_eq!(ConstFormat::ConditionVersioned.tag(), 105);
    assert_eq!(ConstFormat::ALL.len(), 106);
}

#[test]
fn test_from_tag_rejects_unknown() {
    assert_eq!(ConstFormat::from_tag(29), Some(ConstFormat::String));
    assert_eq!(ConstFormat::from_tag(106), None);
    assert_eq!(ConstFormat::from_tag(0xFF), None);
}

#[test]
fn test_every_variant_roundtrips_its_tag() {
    for &format in ConstFormat::ALL {
        assert_eq!(ConstFormat::from_tag(format.tag()), Some(format));
    }
    for &format in ComponentFormat::ALL {
        assert_eq!(ComponentFormat::from_tag(format.tag()), Some(format));
    }
}

#[test]
fn test_component_format_table() {
    assert_eq!(ComponentFormat::ALL.len(), 16);
    assert_eq!(ComponentFormat::Module.tag(), 8);
    assert_eq!(ComponentFormat::MultiMethod.tag(), 14);
    assert!(ComponentFormat::Mixin.is_class_family());
    assert!(!ComponentFormat::Typedef.is_class_family());
}

#[test]
fn test_composition_table() {
    assert_eq!(Composition::Incorporates.tag(), 5);
    assert_eq!(Composition::ImportEmbedded.tag(), 10);
    assert_eq!(Composition::from_tag(11), None);
    assert!(Composition::ImportDesired.is_import());
    assert!(Composition::Delegates.is_searched());
    assert!(!Composition::Incorporates.is_searched());
}

#[test]
fn test_module_kind_fingerprints() {
    assert!(ModuleKind::Required.is_fingerprint());
    assert!(!ModuleKind::Primary.is_fingerprint());
    assert!(!ModuleKind::Embedded.is_fingerprint());
}

#[test]
fn test_display_names() {
    assert_eq!(ConstFormat::ParameterizedType.to_string(), "ParameterizedType");
    assert_eq!(Access::Protected.to_string(), "Protected");
}

use super::*;

#[test]
fn format_of_grouped_variants() {
    let class = Const::Named {
        format: ConstFormat::Class,
        parent: ConstId::from_raw(0),
        name: Name::EMPTY,
    };
    assert_eq!(class.format(), ConstFormat::Class);
    assert!(class.is_identity());

    let union = Const::Relational {
        format: ConstFormat::UnionType,
        first: ConstId::from_raw(1),
        second: ConstId::from_raw(2),
    };
    assert_eq!(union.format(), ConstFormat::UnionType);
    assert!(!union.is_identity());
}

#[test]
fn own_name() {
    let name = Name::from_raw(7);
    assert_eq!(Const::Module { name }.own_name(), Some(name));
    assert_eq!(
        Const::Signature {
            name,
            params: SmallVec::new(),
            returns: SmallVec::new(),
        }
        .own_name(),
        Some(name)
    );
    assert_eq!(Const::Char('x').own_name(), None);
    assert_eq!(
        Const::Method {
            multi: ConstId::from_raw(0),
            signature: ConstId::from_raw(1),
            lambda: false,
        }
        .own_name(),
        None
    );
}

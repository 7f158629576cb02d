use pretty_assertions::assert_eq;
use xtc_diagnostic::ErrorCode;
use xtc_wire::{PackedInt, WireErrorKind, Writer};

use super::*;

fn pool_bytes(records: &[RawConst]) -> Vec<u8> {
    let mut w = Writer::new();
    w.magnitude(records.len());
    for record in records {
        record.encode(&mut w);
    }
    w.into_bytes()
}

fn parse(records: &[RawConst]) -> Pool {
    let bytes = pool_bytes(records);
    let mut r = Reader::new(&bytes);
    let pool = Pool::parse(&mut r).unwrap();
    assert!(r.is_at_end());
    pool
}

fn resolved(records: &[RawConst], interner: &StringInterner) -> Pool {
    let mut pool = parse(records);
    pool.resolve(interner).unwrap();
    pool
}

#[test]
fn module_name_resolves_through_string() {
    let interner = StringInterner::new();
    let pool = resolved(
        &[RawConst::String("Foo".into()), RawConst::Module { name: 0 }],
        &interner,
    );
    let module = ConstId::from_raw(1);
    let name = pool.name_of(module).unwrap();
    assert_eq!(interner.lookup(name), "Foo");
    assert_eq!(pool.entry(module), &Const::Module { name });
    assert_eq!(pool.get(1).unwrap(), Some(&Const::Module { name }));
}

#[test]
fn forward_and_cyclic_references() {
    let interner = StringInterner::new();
    // 0: class whose parent is 2 (forward), 2: module, 1 and 3: names
    let pool = resolved(
        &[
            RawConst::Named {
                format: ConstFormat::Class,
                parent: 2,
                name: 1,
            },
            RawConst::String("Point".into()),
            RawConst::Module { name: 3 },
            RawConst::String("geo".into()),
            RawConst::Relational {
                format: ConstFormat::UnionType,
                first: 4,
                second: 4,
            },
        ],
        &interner,
    );
    let Const::Named { parent, name, .. } = pool.entry(ConstId::from_raw(0)) else {
        panic!("expected a named identity");
    };
    assert_eq!(*parent, ConstId::from_raw(2));
    assert_eq!(interner.lookup(*name), "Point");
    assert_eq!(
        pool.entry(ConstId::from_raw(4)).format(),
        ConstFormat::UnionType
    );
}

#[test]
fn method_name_is_its_multi_method_name() {
    let interner = StringInterner::new();
    let pool = resolved(
        &[
            RawConst::String("m".into()),
            RawConst::Module { name: 0 },
            RawConst::String("f".into()),
            RawConst::Named {
                format: ConstFormat::MultiMethod,
                parent: 1,
                name: 2,
            },
            RawConst::Signature {
                name: 2,
                params: vec![],
                returns: vec![],
            },
            RawConst::Method {
                multi: 3,
                signature: 4,
                lambda: false,
            },
        ],
        &interner,
    );
    let name = pool.name_of(ConstId::from_raw(5)).unwrap();
    assert_eq!(interner.lookup(name), "f");
    assert_eq!(pool.name_of(ConstId::from_raw(0)), None);
}

#[test]
fn get_sentinel_and_bounds() {
    let interner = StringInterner::new();
    let pool = resolved(&[RawConst::Char('a')], &interner);
    assert_eq!(pool.get(-1).unwrap(), None);
    assert_eq!(pool.get(0).unwrap(), Some(&Const::Char('a')));

    let err = pool.get(1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1002);
    assert!(matches!(err, PoolError::IndexOutOfRange { index: 1, len: 1, .. }));
    assert!(pool.get(-2).is_err());
}

#[test]
fn get_before_resolve() {
    let pool = parse(&[RawConst::Char('a')]);
    assert_eq!(pool.get(0).unwrap_err(), PoolError::Unresolved);
    assert_eq!(pool.get(-1).unwrap(), None);
}

#[test]
fn dangling_reference_is_range_error() {
    let interner = StringInterner::new();
    let mut pool = parse(&[RawConst::Module { name: 5 }]);
    let err = pool.resolve(&interner).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1002);
    assert!(matches!(
        err,
        PoolError::IndexOutOfRange {
            index: 5,
            len: 1,
            span: Some(_)
        }
    ));
    assert!(!pool.is_resolved());
}

#[test]
fn name_must_be_a_string() {
    let interner = StringInterner::new();
    let mut pool = parse(&[RawConst::Char('x'), RawConst::Module { name: 0 }]);
    let err = pool.resolve(&interner).unwrap_err();
    assert_eq!(
        err,
        PoolError::WrongKind {
            index: 0,
            expected: "a String",
            found: ConstFormat::Char,
            span: pool.span(ConstId::from_raw(1)),
        }
    );
    assert_eq!(err.code(), ErrorCode::E0004);
}

#[test]
fn method_must_name_a_multi_method_and_signature() {
    let interner = StringInterner::new();
    // A method whose multi-method is itself.
    let mut pool = parse(&[
        RawConst::String("f".into()),
        RawConst::Method {
            multi: 1,
            signature: 0,
            lambda: false,
        },
    ]);
    let err = pool.resolve(&interner).unwrap_err();
    assert_eq!(
        err,
        PoolError::WrongKind {
            index: 1,
            expected: "a MultiMethod",
            found: ConstFormat::Method,
            span: pool.span(ConstId::from_raw(1)),
        }
    );
    assert_eq!(err.code(), ErrorCode::E0004);

    let mut pool = parse(&[
        RawConst::String("m".into()),
        RawConst::Module { name: 0 },
        RawConst::Named {
            format: ConstFormat::MultiMethod,
            parent: 1,
            name: 0,
        },
        RawConst::Method {
            multi: 2,
            signature: 0,
            lambda: false,
        },
    ]);
    let err = pool.resolve(&interner).unwrap_err();
    assert!(matches!(
        err,
        PoolError::WrongKind {
            index: 0,
            expected: "a Signature",
            found: ConstFormat::String,
            ..
        }
    ));
}

#[test]
fn terminal_type_must_name_a_definition() {
    let interner = StringInterner::new();
    let mut pool = parse(&[RawConst::TerminalType { def: 0 }]);
    let err = pool.resolve(&interner).unwrap_err();
    assert_eq!(
        err.to_string(),
        "constant #0 should be a type definition, found TerminalType"
    );

    let mut pool = parse(&[RawConst::String("t".into()), RawConst::RecursiveType { typedef: 0 }]);
    let err = pool.resolve(&interner).unwrap_err();
    assert!(matches!(err, PoolError::WrongKind { expected: "a Typedef", .. }));
}

#[test]
fn lowest_failing_entry_is_reported() {
    let interner = StringInterner::new();
    let mut pool = parse(&[
        RawConst::Module { name: 9 },
        RawConst::Module { name: 8 },
    ]);
    let err = pool.resolve(&interner).unwrap_err();
    assert!(matches!(err, PoolError::IndexOutOfRange { index: 9, .. }));
}

#[test]
fn resolve_is_idempotent() {
    let interner = StringInterner::new();
    let mut pool = resolved(
        &[RawConst::String("x".into()), RawConst::Module { name: 0 }],
        &interner,
    );
    let before: Vec<Const> = pool.iter().map(|(_, c)| c.clone()).collect();
    pool.resolve(&interner).unwrap();
    let after: Vec<Const> = pool.iter().map(|(_, c)| c.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(after.len(), 2);
}

#[test]
fn version_literals_are_parsed() {
    let interner = StringInterner::new();
    let pool = resolved(
        &[
            RawConst::String("1.2-beta3".into()),
            RawConst::Literal {
                format: ConstFormat::Version,
                text: 0,
            },
        ],
        &interner,
    );
    let version = pool.version(ConstId::from_raw(1)).unwrap();
    assert_eq!(version.parts(), &[1, 2]);
    assert!(!version.is_release());
}

#[test]
fn malformed_version_is_format_error() {
    let interner = StringInterner::new();
    let mut pool = parse(&[
        RawConst::String("1.x".into()),
        RawConst::Literal {
            format: ConstFormat::Version,
            text: 0,
        },
    ]);
    let err = pool.resolve(&interner).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0004);
    assert!(err.to_string().contains("illegal version \"1.x\""));
}

#[test]
fn int16_out_of_range_fails_the_parse() {
    let mut w = Writer::new();
    w.magnitude(1).u8(ConstFormat::Int16.tag()).packed_i64(70_000);
    let bytes = w.into_bytes();
    let err = Pool::parse(&mut Reader::new(&bytes)).err().unwrap();
    assert_eq!(err.code(), ErrorCode::E1001);
    let PoolError::Wire(wire) = err else {
        panic!("expected a wire error");
    };
    assert_eq!(
        wire.kind,
        WireErrorKind::IntOutOfRange {
            format: ConstFormat::Int16,
            value: PackedInt::Small(70_000),
        }
    );
}

#[test]
fn unknown_tag_fails_the_parse() {
    let bytes = [1, 250];
    let err = Pool::parse(&mut Reader::new(&bytes)).err().unwrap();
    assert_eq!(err.code(), ErrorCode::E0005);
    assert!(err.to_string().contains("unsupported constant format"));
}

#[test]
fn spans_cover_each_record() {
    let pool = parse(&[RawConst::String("abc".into()), RawConst::Char('z')]);
    // count byte, then tag + length + 3 bytes
    assert_eq!(pool.span(ConstId::from_raw(0)), Span::new(1, 6));
    assert_eq!(pool.span(ConstId::from_raw(1)), Span::new(6, 8));
}

#[test]
fn id_checks_bounds() {
    let pool = Pool::from_records(vec![RawConst::Char('a')]);
    assert_eq!(pool.id(-1, Span::DUMMY).unwrap(), None);
    assert_eq!(pool.id(0, Span::DUMMY).unwrap(), Some(ConstId::from_raw(0)));
    assert!(pool.id(1, Span::DUMMY).is_err());
}

#[test]
fn checked_ids() {
    let pool = Pool::from_records(vec![RawConst::Char('a'), RawConst::Char('b')]);
    assert_eq!(pool.checked(1, Span::DUMMY).unwrap(), ConstId::from_raw(1));
    let err = pool.checked(2, Span::new(3, 4)).unwrap_err();
    assert_eq!(err.span(), Some(Span::new(3, 4)));
}

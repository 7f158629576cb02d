use super::*;
use crate::Writer;
use pretty_assertions::assert_eq;

#[test]
fn test_fixed_width_big_endian() {
    let mut r = Reader::new(&[0xEC, 0x57, 0xA5, 0xEE, 0x01, 0x02, 0xFE]);
    assert_eq!(r.u32().unwrap(), 0xEC57_A5EE);
    assert_eq!(r.u16().unwrap(), 0x0102);
    assert_eq!(r.i8().unwrap(), -2);
    assert!(r.is_at_end());
}

#[test]
fn test_truncation_reports_offset() {
    let mut r = Reader::new(&[0x00, 0x01]);
    r.u8().unwrap();
    let err = r.u32().unwrap_err();
    assert_eq!(
        err,
        WireError::new(
            WireErrorKind::Truncated {
                needed: 4,
                remaining: 1
            },
            1
        )
    );
}

#[test]
fn test_index_none_and_bad() {
    let mut w = Writer::new();
    w.index(None).index(Some(300)).packed_i64(-2);
    let bytes = w.into_bytes();
    let mut r = Reader::new(&bytes);
    assert_eq!(r.index().unwrap(), None);
    assert_eq!(r.index().unwrap(), Some(300));
    assert_eq!(r.index().unwrap_err().kind, WireErrorKind::BadIndex(-2));
}

#[test]
fn test_required_index_rejects_none() {
    let mut r = Reader::new(&[0xFF]);
    assert_eq!(
        r.required_index().unwrap_err().kind,
        WireErrorKind::MissingReference
    );
}

#[test]
fn test_count_larger_than_file() {
    let mut w = Writer::new();
    w.magnitude(1000).u8(1);
    let bytes = w.into_bytes();
    let mut r = Reader::new(&bytes);
    assert!(matches!(
        r.count().unwrap_err().kind,
        WireErrorKind::Truncated { needed: 1000, .. }
    ));
}

#[test]
fn test_utf8() {
    let mut w = Writer::new();
    w.utf8("Foo").utf8("ñ");
    let bytes = w.into_bytes();
    let mut r = Reader::new(&bytes);
    assert_eq!(r.utf8().unwrap(), "Foo");
    assert_eq!(r.utf8().unwrap(), "ñ");

    let mut bad = Reader::new(&[0x02, 0xC3, 0x28]);
    assert_eq!(bad.utf8().unwrap_err().kind, WireErrorKind::InvalidUtf8);
}

#[test]
fn test_bool_and_access() {
    let mut r = Reader::new(&[0x01, 0x00, 0x07, 0x02, 0x09]);
    assert!(r.bool().unwrap());
    assert!(!r.bool().unwrap());
    assert_eq!(r.bool().unwrap_err().kind, WireErrorKind::InvalidBool(7));
    assert_eq!(r.access().unwrap(), Access::Protected);
    assert_eq!(r.access().unwrap_err().kind, WireErrorKind::InvalidAccess(9));
}

#[test]
fn test_seek_and_span() {
    let mut r = Reader::new(&[1, 2, 3, 4]);
    r.seek(2).unwrap();
    assert_eq!(r.u8().unwrap(), 3);
    assert_eq!(r.span_from(2), Span::new(2, 3));
    assert!(r.seek(5).is_err());
}

#[test]
fn test_magnitude_rejects_negative() {
    let mut r = Reader::new(&[0xFE]);
    assert_eq!(r.magnitude().unwrap_err().kind, WireErrorKind::BadLength(-2));
}

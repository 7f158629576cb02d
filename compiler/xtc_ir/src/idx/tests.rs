use super::*;

#[test]
fn test_debug_prefixes() {
    assert_eq!(format!("{:?}", ConstId::from_raw(5)), "#5");
    assert_eq!(format!("{:?}", PartId::from_raw(2)), "part2");
    let part = PartRef::new(FileId::from_raw(1), PartId::ROOT);
    assert_eq!(format!("{part:?}"), "file1/part0");
}

#[test]
fn test_from_usize() {
    assert_eq!(ConstId::from_usize(42).index(), 42);
    assert_eq!(FileId::from_usize(3).raw(), 3);
}

#[test]
#[should_panic(expected = "ConstId overflow")]
fn test_from_usize_overflow() {
    let _ = ConstId::from_usize(u32::MAX as usize + 1);
}

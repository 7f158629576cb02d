use pretty_assertions::assert_eq;

use super::*;

fn v(text: &str) -> Version {
    Version::parse(text).unwrap_or_else(|e| panic!("{text}: {e}"))
}

#[test]
fn release_versions() {
    let ver = v("1.2.3");
    assert_eq!(ver.parts(), &[1, 2, 3]);
    assert!(ver.is_release());
    assert_eq!(ver.build(), None);
    assert_eq!(ver.to_string(), "1.2.3");
}

#[test]
fn pre_release_forms() {
    assert_eq!(v("1.0-beta2").pre_release(), Some((PreRelease::Beta, Some(2))));
    assert_eq!(v("2.1.rc").pre_release(), Some((PreRelease::Rc, None)));
    assert_eq!(v("3-CI").pre_release(), Some((PreRelease::Ci, None)));
    assert_eq!(v("0.4.qc7").pre_release(), Some((PreRelease::Qc, Some(7))));
    assert!(!v("1.0-alpha").is_release());
}

#[test]
fn build_metadata() {
    let ver = v("1.0-dev3+20230724");
    assert_eq!(ver.pre_release(), Some((PreRelease::Dev, Some(3))));
    assert_eq!(ver.build(), Some("20230724"));
    assert_eq!(v("1.0+abc").build(), Some("abc"));
}

#[test]
fn malformed_versions() {
    assert_eq!(Version::parse(""), Err(VersionError::Empty));
    assert_eq!(Version::parse("beta"), Err(VersionError::Empty));
    assert_eq!(Version::parse("1."), Err(VersionError::DanglingSeparator));
    assert_eq!(Version::parse("1-"), Err(VersionError::DanglingSeparator));
    assert_eq!(
        Version::parse("1..2"),
        Err(VersionError::Unexpected { at: 2, found: '.' })
    );
    assert_eq!(
        Version::parse("1.0-gamma"),
        Err(VersionError::UnknownTag("gamma".into()))
    );
    assert!(matches!(
        Version::parse("99999999999"),
        Err(VersionError::Overflow(_))
    ));
    assert_eq!(
        Version::parse("1.0-beta2x"),
        Err(VersionError::Unexpected { at: 9, found: 'x' })
    );
}

#[test]
fn same_version_ignores_trailing_zeros() {
    assert!(v("1.2").is_same_as(&v("1.2.0.0")));
    assert!(v("1.2.0").is_same_as(&v("1.2")));
    assert!(!v("1.2").is_same_as(&v("1.2.1")));
    assert!(!v("1.2").is_same_as(&v("1.2-rc")));
}

#[test]
fn substitution_of_release_segments() {
    let requested = v("1.2");
    for actual in ["1.2", "1.2.1", "1.2.1.7", "1.3"] {
        assert!(v(actual).is_substitutable_for(&requested), "{actual}");
    }
    for actual in ["2.0", "2.1", "1.1", "1"] {
        assert!(!v(actual).is_substitutable_for(&requested), "{actual}");
    }

    let pinned = v("1.2.0");
    assert!(v("1.2.1").is_substitutable_for(&pinned));
    assert!(!v("1.3").is_substitutable_for(&pinned));
    assert!(v("1.2").is_substitutable_for(&v("1.2.0.0.0")));
}

#[test]
fn substitution_of_pre_releases() {
    assert!(v("1.0").is_substitutable_for(&v("1.0-rc")));
    assert!(!v("1.0-rc").is_substitutable_for(&v("1.0")));
    assert!(v("1.0-rc").is_substitutable_for(&v("1.0-beta3")));
    assert!(!v("1.0-alpha").is_substitutable_for(&v("1.0-beta")));
    assert!(v("1.0-beta2").is_substitutable_for(&v("1.0-beta1")));
    assert!(!v("1.0-beta1").is_substitutable_for(&v("1.0-beta2")));
    assert!(v("1.0-beta1").is_substitutable_for(&v("1.0-beta")));
    assert!(!v("1.0-beta").is_substitutable_for(&v("1.0-beta1")));
}

#[test]
fn from_str() {
    let ver: Version = "4.5".parse().unwrap();
    assert_eq!(ver.parts(), &[4, 5]);
}

//! Package identity and ordering.

use std::cmp::Ordering;

use pkit_catalog::PackageRecord;

/// True when both records name the same package at the same version.
pub fn pkg_equal(a: &PackageRecord, b: &PackageRecord) -> bool {
    a.name == b.name && a.version == b.version
}

/// Matches `record` against a name and, when given, an exact version.
pub fn equals_to(record: &PackageRecord, name: &str, version: Option<&str>) -> bool {
    record.name == name && version.is_none_or(|v| record.version == v)
}

fn segments(version: &str) -> impl Iterator<Item = &str> {
    version
        .split(|c: char| matches!(c, '.' | '-' | '_' | '+' | ':'))
        .filter(|s| !s.is_empty())
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let a_num = a.bytes().all(|c| c.is_ascii_digit());
    let b_num = b.bytes().all(|c| c.is_ascii_digit());

    match (a_num, b_num) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        // A numeric segment is newer than an alphabetic one (1.0.1 > 1.0.rc1).
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

/// Segment-wise version comparison.
///
/// Versions are split on `.`, `-`, `_`, `+` and `:`. Numeric segments compare
/// numerically, anything else byte-wise. When all shared segments are equal the
/// version with more segments is newer; versions that are still equal fall back
/// to byte order so the result is a total order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);

    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => {
                let ord = compare_segment(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return a.cmp(b),
        }
    }
}

/// Result ordering: name first, then version.
pub fn compare_packages(a: &PackageRecord, b: &PackageRecord) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| compare_versions(&a.version, &b.version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkg_equal() {
        let a = PackageRecord::new("foo", "1.0");
        let b = PackageRecord::new("foo", "1.0").with_repo("core");
        let c = PackageRecord::new("foo", "2.0");
        assert!(pkg_equal(&a, &b));
        assert!(!pkg_equal(&a, &c));
        assert!(!pkg_equal(&a, &PackageRecord::new("Foo", "1.0")));
    }

    #[test]
    fn test_equals_to_optional_version() {
        let rec = PackageRecord::new("foo", "1.0");
        assert!(equals_to(&rec, "foo", None));
        assert!(equals_to(&rec, "foo", Some("1.0")));
        assert!(!equals_to(&rec, "foo", Some("2.0")));
        assert!(!equals_to(&rec, "bar", None));
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.0", "2.0"), Ordering::Less);
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
        assert_eq!(compare_versions("2.0-1", "2.0-2"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0.rc1"), Ordering::Greater);
        assert_eq!(compare_versions("010", "9"), Ordering::Greater);
        assert_ne!(compare_versions("1.0", "1.00"), Ordering::Equal);
    }

    #[test]
    fn test_compare_packages_name_first() {
        let a = PackageRecord::new("bar", "9.0");
        let b = PackageRecord::new("foo", "1.0");
        let c = PackageRecord::new("foo", "2.0");
        assert_eq!(compare_packages(&a, &b), Ordering::Less);
        assert_eq!(compare_packages(&b, &c), Ordering::Less);
        assert_eq!(compare_packages(&c, &c), Ordering::Equal);
    }
}

use std::cmp::Ordering;

/// Compare two dotted build identifiers segment by segment.
///
/// Segments that parse as integers are compared numerically, so "1.10.0"
/// sorts after "1.2.0" and "10" after "9". Non-numeric segments fall back
/// to string comparison; a missing segment counts as zero.
pub fn compare_builds(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let (l, r) = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => (l.unwrap_or("0"), r.unwrap_or("0")),
        };
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(ln), Ok(rn)) => ln.cmp(&rn),
            _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(compare_builds("10", "9"), Ordering::Greater);
        assert_eq!(compare_builds("1.10.0", "1.2.0"), Ordering::Greater);
    }

    #[test]
    fn test_equal_builds() {
        assert_eq!(compare_builds("3.2.0", "3.2.0"), Ordering::Equal);
    }

    #[test]
    fn test_missing_segments_count_as_zero() {
        assert_eq!(compare_builds("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_builds("1.2.1", "1.2"), Ordering::Greater);
    }

    #[test]
    fn test_four_segment_build_ids() {
        assert_eq!(compare_builds("3.2.0.23.0", "3.2.0.9.0"), Ordering::Greater);
    }

    #[test]
    fn test_non_numeric_falls_back_to_string_order() {
        assert_eq!(compare_builds("1.0-beta", "1.0-alpha"), Ordering::Greater);
    }

    #[test]
    fn test_sort_picks_highest() {
        let mut builds = vec!["1.0.0", "1.10.0", "1.2.0"];
        builds.sort_by(|a, b| compare_builds(a, b));
        assert_eq!(builds.last(), Some(&"1.10.0"));
    }
}

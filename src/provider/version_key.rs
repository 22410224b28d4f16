/// One segment of a split version string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Number(u64),
    /// Non-numeric segment; sorts after every number at the same position
    Max,
}

/// Orderable key derived from a dotted/segmented version string.
///
/// Comparison is segment-wise with a shorter key sorting first when it is a
/// prefix of the longer one, so `1.20 < 1.20.1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey(Vec<Segment>);

impl VersionKey {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

/// Split a version on `.`, `-`, `+` and `_` into an orderable key.
///
/// Examples:
/// - "1.20.1" -> [1, 20, 1]
/// - "1.20-pre1" -> [1, 20, Max]
/// - "1.20.1+build_7" -> [1, 20, 1, Max, 7]
pub fn version_key(version: &str) -> VersionKey {
    VersionKey(
        version
            .split(['.', '-', '+', '_'])
            .map(|segment| match segment.parse::<u64>() {
                Ok(n) => Segment::Number(n),
                Err(_) => Segment::Max,
            })
            .collect(),
    )
}

/// Pick the newest version from a list
pub fn find_newest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .map(|v| (version_key(v), v))
        .max_by(|(a, a_raw), (b, b_raw)| a.cmp(b).then_with(|| b_raw.cmp(a_raw)))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.20.1", "1.20")]
    #[case("1.20", "1.19.4")]
    #[case("1.20.1", "1.19.4")]
    #[case("1.10", "1.9")]
    #[case("1.20-pre1", "1.20.4")]
    #[case("1.20-rc1", "1.20")]
    #[case("1.21", "1.20.6")]
    fn version_key_orders_numerically(#[case] newer: &str, #[case] older: &str) {
        assert!(version_key(newer) > version_key(older));
    }

    #[test]
    fn version_key_parses_segments() {
        assert_eq!(
            version_key("1.20.1+build_7").segments(),
            &[
                Segment::Number(1),
                Segment::Number(20),
                Segment::Number(1),
                Segment::Max,
                Segment::Number(7),
            ]
        );
    }

    #[test]
    fn version_key_treats_empty_segments_as_max() {
        assert_eq!(
            version_key("1..2").segments(),
            &[Segment::Number(1), Segment::Max, Segment::Number(2)]
        );
    }

    #[rstest]
    #[case(vec![], None)]
    #[case(vec!["1.19.4", "1.20.1", "1.20"], Some("1.20.1"))]
    #[case(vec!["1.9", "1.10"], Some("1.10"))]
    fn find_newest_returns_expected(#[case] versions: Vec<&str>, #[case] expected: Option<&str>) {
        assert_eq!(find_newest(versions), expected);
    }
}

//! Tokenized shape of a candidate reference.
//!
//! Classification rules never look at raw text; they inspect the shape
//! produced here: the path segments before any fragment, whether a fragment
//! delimiter (`#` or `%23`) was present, and the query string.

/// Longest digit run accepted as a catalog ID.
pub const MAX_ID_DIGITS: usize = 8;

/// Shape of a candidate token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenShape<'a> {
    /// The leading token of a line, consisting only of ASCII digits
    BareDigits(&'a str),
    /// A link-shaped token
    Link(LinkShape<'a>),
}

/// Decomposed link without scheme and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkShape<'a> {
    /// Non-empty path segments that precede any fragment delimiter
    pub segments: Vec<&'a str>,
    /// Whether a `#` or percent-encoded `%23` follows the path
    pub has_fragment: bool,
    /// Query string (without the leading `?`), if any
    pub query: Option<&'a str>,
}

impl<'a> LinkShape<'a> {
    /// Decomposes a link-shaped token (with or without scheme).
    #[must_use]
    pub fn parse(token: &'a str) -> Self {
        let without_scheme = token.split_once("://").map_or(token, |(_, rest)| rest);
        let rest = without_scheme
            .find('/')
            .map_or("", |slash| &without_scheme[slash..]);

        let (before_fragment, has_fragment) = match fragment_position(rest) {
            Some(pos) => (&rest[..pos], true),
            None => (rest, false),
        };

        let (path, query) = match before_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (before_fragment, None),
        };

        Self {
            segments: path.split('/').filter(|s| !s.is_empty()).collect(),
            has_fragment,
            query,
        }
    }
}

/// Finds the earliest fragment delimiter: `#` or `%23` (any case).
fn fragment_position(rest: &str) -> Option<usize> {
    let hash = rest.find('#');
    let encoded = rest
        .as_bytes()
        .windows(3)
        .position(|w| w[0] == b'%' && w[1] == b'2' && w[2] == b'3');
    match (hash, encoded) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Parses a run of 1 to [`MAX_ID_DIGITS`] ASCII digits into a positive ID.
#[must_use]
pub fn digit_run(value: &str) -> Option<u32> {
    if value.is_empty()
        || value.len() > MAX_ID_DIGITS
        || !value.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    value.parse().ok().filter(|id| *id > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_link_shape_with_scheme() {
        let shape = LinkShape::parse("https://osu.ppy.sh/beatmapsets/123");
        assert_eq!(shape.segments, vec!["beatmapsets", "123"]);
        assert!(!shape.has_fragment);
        assert_eq!(shape.query, None);
    }

    #[test]
    fn test_link_shape_without_scheme() {
        let shape = LinkShape::parse("osu.ppy.sh/s/42");
        assert_eq!(shape.segments, vec!["s", "42"]);
    }

    #[test]
    fn test_link_shape_fragment_splits_path() {
        let shape = LinkShape::parse("https://osu.ppy.sh/beatmapsets/1#osu/2");
        assert_eq!(shape.segments, vec!["beatmapsets", "1"]);
        assert!(shape.has_fragment);
    }

    #[test]
    fn test_link_shape_percent_encoded_fragment() {
        let shape = LinkShape::parse("osu.ppy.sh/beatmapsets/1%23osu/2");
        assert_eq!(shape.segments, vec!["beatmapsets", "1"]);
        assert!(shape.has_fragment);
    }

    #[test]
    fn test_link_shape_query() {
        let shape = LinkShape::parse("http://osu.ppy.sh/p/beatmap?b=77&m=0");
        assert_eq!(shape.segments, vec!["p", "beatmap"]);
        assert_eq!(shape.query, Some("b=77&m=0"));
    }

    #[test]
    fn test_link_shape_host_only() {
        let shape = LinkShape::parse("https://osu.ppy.sh/");
        assert!(shape.segments.is_empty());
    }

    #[test]
    fn test_digit_run_bounds() {
        assert_eq!(digit_run("1"), Some(1));
        assert_eq!(digit_run("12345678"), Some(12_345_678));
        assert_eq!(digit_run("123456789"), None);
        assert_eq!(digit_run(""), None);
        assert_eq!(digit_run("12a"), None);
        assert_eq!(digit_run("007"), Some(7));
        assert_eq!(digit_run("0"), None);
        assert_eq!(digit_run("00000000"), None);
    }
}

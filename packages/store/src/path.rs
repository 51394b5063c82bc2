//! Delimited path strings addressing nodes in the configuration tree.

use std::fmt;

/// Segment delimiter in path strings.
pub const DELIMITER: char = '|';

/// Errors from parsing a path string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment was empty after trimming surrounding whitespace: two
    /// consecutive delimiters, or a delimiter at either end of the
    /// string.
    #[error("empty segment at position {position} in path '{path}'")]
    EmptySegment { path: String, position: usize },
}

/// A parsed path: an ordered list of trimmed segments.
///
/// Paths address nodes in the configuration tree. A segment is an
/// object key, or an array index when it is a base-10 integer and the
/// node being traversed is an array. The empty string parses to the
/// empty path, which addresses the tree root.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parse a `|`-delimited path string.
    ///
    /// Surrounding whitespace on each segment is stripped, so
    /// `"a | b"` and `"a|b"` are the same path. A segment that trims
    /// to nothing is an error rather than being silently skipped.
    pub fn parse(s: &str) -> Result<Path, PathError> {
        if s.is_empty() {
            return Ok(Path {
                segments: Vec::new(),
            });
        }

        let mut segments = Vec::new();
        for (position, raw) in s.split(DELIMITER).enumerate() {
            let segment = raw.trim();
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    path: s.to_string(),
                    position,
                });
            }
            segments.push(segment.to_string());
        }

        Ok(Path { segments })
    }

    /// Check if this is the empty (root) path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over segments.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.segments.iter()
    }

    /// Interpret a segment as an array index: base-10 digits only, no
    /// sign, no surrounding characters.
    pub fn as_index(segment: &str) -> Option<usize> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse::<usize>().ok()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("|"))
    }
}

impl std::ops::Index<usize> for Path {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// Macro for creating paths from trusted literals.
///
/// # Example
///
/// ```rust
/// use devconf_store::path;
///
/// let p = path!("wifi|ap|ssid");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(Path::parse("").unwrap().len(), 0);
        assert_eq!(Path::parse("foo").unwrap().len(), 1);
        assert_eq!(Path::parse("foo|bar").unwrap().len(), 2);
        assert_eq!(Path::parse("foo|bar|baz").unwrap().len(), 3);
    }

    #[test]
    fn segments_are_trimmed() {
        assert_eq!(
            Path::parse("a | b |c").unwrap(),
            Path::parse("a|b|c").unwrap()
        );
        assert_eq!(Path::parse("  foo  ").unwrap(), Path::parse("foo").unwrap());
    }

    #[test]
    fn empty_segments_rejected() {
        assert!(Path::parse("a||b").is_err());
        assert!(Path::parse("|a").is_err());
        assert!(Path::parse("a|").is_err());
        assert!(Path::parse("|").is_err());
        assert!(Path::parse("   ").is_err());
        assert!(Path::parse("a| |b").is_err());
    }

    #[test]
    fn error_reports_position() {
        let err = Path::parse("a||b").unwrap_err();
        assert_eq!(
            err,
            PathError::EmptySegment {
                path: "a||b".to_string(),
                position: 1,
            }
        );
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn as_index_accepts_digits_only() {
        assert_eq!(Path::as_index("0"), Some(0));
        assert_eq!(Path::as_index("42"), Some(42));
        assert_eq!(Path::as_index("-1"), None);
        assert_eq!(Path::as_index("+3"), None);
        assert_eq!(Path::as_index("3a"), None);
        assert_eq!(Path::as_index(""), None);
    }

    #[test]
    fn display_joins_with_delimiter() {
        let p = path!("a | b|c");
        assert_eq!(format!("{}", p), "a|b|c");
        assert_eq!(format!("{}", path!("")), "");
    }

    #[test]
    fn index_trait() {
        let p = path!("foo|bar");
        assert_eq!(&p[0], "foo");
        assert_eq!(&p[1], "bar");
    }

    #[test]
    fn path_hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(path!("foo|bar"));
        set.insert(path!("foo | bar"));
        assert_eq!(set.len(), 1);
    }
}

//! Schema/instance location paths (spec.md §4.2): an ordered sequence of
//! unescaped string tokens plus an absolute/relative flag, with JSON
//! Pointer string-form conversions and RFC 3986 §5.2.4 style normalization.
use std::fmt;

use referencing::{decode_token, encode_token, split_pointer};

/// A location within a schema or instance: either absolute (rooted at the
/// document, JSON-Pointer string form) or relative (a bare sequence of
/// keyword/property names appended during evaluation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    tokens: Vec<String>,
    absolute: bool,
}

impl JsonPath {
    #[must_use]
    pub fn absolute() -> Self {
        JsonPath {
            tokens: Vec::new(),
            absolute: true,
        }
    }

    #[must_use]
    pub fn relative() -> Self {
        JsonPath {
            tokens: Vec::new(),
            absolute: false,
        }
    }

    #[must_use]
    pub fn from_element(element: impl Into<String>) -> Self {
        JsonPath {
            tokens: vec![element.into()],
            absolute: false,
        }
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Parses a path written in `toString` form: a leading `/` makes it
    /// absolute, an empty string yields the empty relative path. Tokens are
    /// taken verbatim — no JSON Pointer unescaping, unlike
    /// [`JsonPath::from_json_pointer`].
    #[must_use]
    pub fn from_path(s: &str) -> Self {
        if s.is_empty() {
            return JsonPath::relative();
        }
        let absolute = s.starts_with('/');
        let body = s.strip_prefix('/').unwrap_or(s);
        JsonPath {
            tokens: body.split('/').map(str::to_string).collect(),
            absolute,
        }
    }

    /// Parses a string in RFC 6901 JSON Pointer form: empty is the empty
    /// absolute path, otherwise each `/`-separated segment is unescaped
    /// (`~1` → `/`, `~0` → `~`).
    #[must_use]
    pub fn from_json_pointer(s: &str) -> Self {
        JsonPath {
            tokens: split_pointer(s),
            absolute: true,
        }
    }

    #[must_use]
    pub fn append(&self, element: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(element.into());
        JsonPath {
            tokens,
            absolute: self.absolute,
        }
    }

    /// Element-prefix test; the absolute/relative flag is ignored, matching
    /// spec.md §4.2's `startsWith`.
    #[must_use]
    pub fn starts_with(&self, prefix: &JsonPath) -> bool {
        self.tokens.len() >= prefix.tokens.len() && self.tokens[..prefix.tokens.len()] == prefix.tokens[..]
    }

    #[must_use]
    pub fn ends_with(&self, element: &str) -> bool {
        self.tokens.last().is_some_and(|last| last == element)
    }

    /// RFC 3986 §5.2.4 dot-segment removal. Only meaningful for absolute
    /// paths; relative paths (which may deliberately carry `.`/`..` as
    /// literal property names) are returned unchanged.
    #[must_use]
    pub fn normalize(&self) -> Self {
        if !self.absolute {
            return self.clone();
        }
        let mut output: Vec<String> = Vec::with_capacity(self.tokens.len());
        let mut trailing_dot_segment = false;
        for token in &self.tokens {
            match token.as_str() {
                "." => {
                    trailing_dot_segment = true;
                }
                ".." => {
                    output.pop();
                    trailing_dot_segment = true;
                }
                _ => {
                    output.push(token.clone());
                    trailing_dot_segment = false;
                }
            }
        }
        if trailing_dot_segment {
            output.push(String::new());
        }
        JsonPath {
            tokens: output,
            absolute: true,
        }
    }

    /// RFC 3986 §5.2 merge: `self` is the base, `reference` is resolved
    /// against it. An absolute `reference` replaces `self` outright.
    #[must_use]
    pub fn resolve(&self, reference: &JsonPath) -> Self {
        if reference.absolute {
            return reference.normalize();
        }
        let mut tokens = self.tokens.clone();
        tokens.pop();
        tokens.extend(reference.tokens.iter().cloned());
        JsonPath {
            tokens,
            absolute: self.absolute,
        }
        .normalize_if_absolute()
    }

    fn normalize_if_absolute(self) -> Self {
        if self.absolute {
            self.normalize()
        } else {
            self
        }
    }
}

impl PartialOrd for JsonPath {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonPath {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self.absolute, other.absolute) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => match self.tokens.cmp(&other.tokens) {
                Ordering::Equal => self.tokens.len().cmp(&other.tokens.len()),
                ord => ord,
            },
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            for token in &self.tokens {
                write!(f, "/{}", encode_token(token))?;
            }
        } else {
            for (i, token) in self.tokens.iter().enumerate() {
                if i > 0 {
                    f.write_str("/")?;
                }
                write!(f, "{}", encode_token(token))?;
            }
        }
        Ok(())
    }
}

/// Inverse of [`fmt::Display`] for the JSON-Pointer form produced above,
/// round-tripping through [`decode_token`].
#[must_use]
pub fn parse_display_form(s: &str) -> JsonPath {
    JsonPath::from_json_pointer(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn empty_path_displays_as_empty_string() {
        assert_eq!(JsonPath::absolute().to_string(), "");
        assert_eq!(JsonPath::relative().to_string(), "");
    }

    #[test]
    fn absolute_path_round_trips_through_json_pointer() {
        let path = JsonPath::from_json_pointer("/a~1b/c");
        assert_eq!(path.to_string(), "/a~1b/c");
        assert_eq!(decode_token("a~1b"), "a/b");
    }

    #[test_case(&["a", "b"], &["a"], true)]
    #[test_case(&["a"], &["a", "b"], false)]
    #[test_case(&[], &[], true)]
    fn starts_with(tokens: &[&str], prefix_tokens: &[&str], expected: bool) {
        let mut path = JsonPath::absolute();
        for t in tokens {
            path = path.append(*t);
        }
        let mut prefix = JsonPath::absolute();
        for t in prefix_tokens {
            prefix = prefix.append(*t);
        }
        assert_eq!(path.starts_with(&prefix), expected);
    }

    #[test]
    fn ends_with_checks_last_element() {
        let path = JsonPath::absolute().append("a").append("b");
        assert!(path.ends_with("b"));
        assert!(!path.ends_with("a"));
    }

    #[test]
    fn normalize_removes_dot_segments() {
        let path = JsonPath::absolute().append("a").append(".").append("..").append("b");
        assert_eq!(path.normalize().to_string(), "/b");
    }

    #[test]
    fn normalize_appends_trailing_empty_segment_for_dot_dot_at_the_end() {
        let path = JsonPath::absolute().append("a").append("b").append("..");
        assert_eq!(path.normalize().to_string(), "/a/");
    }

    #[test]
    fn normalize_leaves_relative_paths_untouched() {
        let path = JsonPath::relative().append("..").append("a");
        assert_eq!(path.normalize(), path);
    }

    #[test]
    fn absolute_compares_greater_than_relative() {
        assert!(JsonPath::absolute() > JsonPath::relative());
    }

    #[test]
    fn shorter_prefix_compares_less() {
        let short = JsonPath::absolute().append("a");
        let long = short.append("b");
        assert!(short < long);
    }

    #[test]
    fn append_does_not_mutate_original() {
        let base = JsonPath::relative().append("a");
        let extended = base.append("b");
        assert_eq!(base.tokens(), ["a"]);
        assert_eq!(extended.tokens(), ["a", "b"]);
    }
}

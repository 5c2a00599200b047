//! RFC 3986 URI handling.
//!
//! Wraps `fluent_uri` rather than the platform `url` crate: schema
//! identifiers and `$ref` targets are URI *references*, not necessarily
//! HTTP(S) URLs, and `url::Url` collapses empty authorities/paths in ways
//! that break `$id`/`$ref` round-tripping for values like `urn:`-scheme
//! identifiers or bare fragments.
use std::{borrow::Cow, fmt, hash::Hash};

use fluent_uri::{Uri as RawUri, UriRef};
use once_cell::sync::Lazy;

use crate::error::{Error, UriError};

/// Fallback base used to resolve relative `$id`/`$schema` values that carry
/// no scheme of their own, matching the "synthetic root" technique used to
/// anchor schema documents that were never given an absolute identifier.
static DEFAULT_ROOT_URI: Lazy<RawUri<String>> =
    Lazy::new(|| RawUri::parse("json-schema:///".to_string()).expect("valid URI"));

/// An absolute or relative RFC 3986 URI (reference).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Uri(RawUri<String>);

impl Uri {
    /// Parses `s` as a URI-reference. If it has no scheme, it is resolved
    /// against a fixed synthetic root so every `Uri` value in the known-ID
    /// index is comparable as an absolute URI.
    pub fn parse(s: &str) -> Result<Uri, Error> {
        let uriref = UriRef::parse(s)
            .map_err(|source| UriError::parse(s, source))?
            .normalize();
        if uriref.has_scheme() {
            Ok(Uri(RawUri::try_from(uriref.as_str())
                .map_err(|source| UriError::parse(uriref.as_str(), source))?
                .into()))
        } else {
            let resolved = uriref
                .resolve_against(&DEFAULT_ROOT_URI.borrow())
                .map_err(|source| UriError::resolve(s, source))?;
            Ok(Uri(resolved))
        }
    }

    /// Resolves `reference` against `self` per RFC 3986 §5, then normalizes
    /// the result. An empty path on the reference keeps the base path
    /// rather than discarding it; a fragment-only reference preserves the
    /// base and swaps only the fragment — both are `fluent_uri`'s default
    /// `resolve_against` behavior.
    pub fn resolve(&self, reference: &str) -> Result<Uri, Error> {
        let uriref =
            UriRef::parse(reference).map_err(|source| UriError::parse(reference, source))?;
        let resolved = uriref
            .resolve_against(&self.0.borrow())
            .map_err(|source| UriError::resolve(reference, source))?
            .normalize();
        Ok(Uri(resolved))
    }

    /// Percent-decodes unreserved characters, lowercases scheme/host, and
    /// removes dot-segments. `fluent_uri::Uri::normalize` already performs
    /// this per RFC 3986 §6.
    #[must_use]
    pub fn normalize(&self) -> Uri {
        Uri(self.0.borrow().normalize())
    }

    /// Returns a copy of `self` with the fragment component removed.
    #[must_use]
    pub fn strip_fragment(&self) -> Uri {
        if self.0.fragment().is_none() {
            return self.clone();
        }
        let without = match self.0.as_str().split_once('#') {
            Some((head, _)) => head,
            None => self.0.as_str(),
        };
        Uri(RawUri::parse(without.to_string()).expect("stripping a fragment keeps the URI valid"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.0.scheme().map(|s| s.as_str())
    }

    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.0.authority().map(|a| a.as_str())
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.0.path().as_str()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.0.query().map(|q| q.as_str())
    }

    /// The raw, still percent-encoded fragment, if present (including an
    /// empty one, e.g. `http://example.com#`).
    #[must_use]
    pub fn raw_fragment(&self) -> Option<&str> {
        self.0.fragment().map(|f| f.as_str())
    }

    /// The fragment, percent-decoded. `None` if there is no fragment at
    /// all; `Some("")` if the fragment is present but empty.
    #[must_use]
    pub fn decoded_fragment(&self) -> Option<Cow<'_, str>> {
        self.0.fragment().map(|f| f.decode().into_string_lossy())
    }

    #[must_use]
    pub fn has_non_empty_fragment(&self) -> bool {
        matches!(self.raw_fragment(), Some(f) if !f.is_empty())
    }

    #[must_use]
    pub fn is_not_fragment_only(&self) -> bool {
        self.scheme().is_some() || self.authority().is_some() || !self.path().is_empty()
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uri({:?})", self.0.as_str())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Uri;
    use test_case::test_case;

    #[test_case("https://example.com/schema", "https://example.com/schema")]
    #[test_case("https://example.com/a/../b", "https://example.com/b")]
    #[test_case("urn:uuid:deadbeef", "urn:uuid:deadbeef")]
    fn normalizes_on_parse(input: &str, expected: &str) {
        assert_eq!(Uri::parse(input).unwrap().as_str(), expected);
    }

    #[test]
    fn resolve_keeps_base_path_on_empty_reference() {
        let base = Uri::parse("https://example.com/a/b").unwrap();
        let resolved = base.resolve("").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a/b");
    }

    #[test]
    fn resolve_fragment_only_swaps_fragment() {
        let base = Uri::parse("https://example.com/a/b").unwrap();
        let resolved = base.resolve("#foo").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a/b#foo");
    }

    #[test]
    fn strip_fragment_removes_fragment_only() {
        let uri = Uri::parse("https://example.com/a#b").unwrap();
        assert_eq!(uri.strip_fragment().as_str(), "https://example.com/a");
    }

    #[test]
    fn relative_id_resolves_against_synthetic_root() {
        let uri = Uri::parse("schema.json").unwrap();
        assert!(uri.scheme() == Some("json-schema"));
    }

    #[test]
    fn has_non_empty_fragment() {
        assert!(Uri::parse("https://example.com#a").unwrap().has_non_empty_fragment());
        assert!(!Uri::parse("https://example.com#").unwrap().has_non_empty_fragment());
        assert!(!Uri::parse("https://example.com").unwrap().has_non_empty_fragment());
    }
}

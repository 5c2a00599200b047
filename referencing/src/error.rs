use core::fmt;
use std::error::Error as StdError;

use fluent_uri::error::{BuildError, ParseError, ResolveError};

/// Errors raised while parsing, resolving, or scanning URIs and schema
/// reference graphs. This type never represents an invalid *instance*; it
/// signals that a schema document itself is malformed.
#[derive(Debug)]
pub enum Error {
    Uri(UriError),
    /// A JSON Pointer segment did not resolve to anything in the target
    /// document.
    PointerToNowhere { pointer: String },
    /// A JSON Pointer segment percent-decoded to invalid UTF-8.
    InvalidPercentEncoding {
        pointer: String,
        source: std::str::Utf8Error,
    },
    /// A JSON Pointer array-index segment failed to parse.
    InvalidArrayIndex {
        pointer: String,
        index: String,
        source: std::num::ParseIntError,
    },
    /// `$id` is not a valid URI-reference.
    InvalidId { value: String },
    /// An `$id`/`$anchor` fragment does not match the plain-name anchor
    /// pattern `[A-Za-z_][-A-Za-z0-9._]*`.
    InvalidAnchor { value: String },
    /// Two schema elements registered the same canonical URI.
    DuplicateId { uri: String },
    /// Two schema elements registered the same `(base, anchor)` pair.
    DuplicateAnchor { uri: String, anchor: String },
    /// `$schema` does not resolve to a specification known to this
    /// implementation.
    UnknownSpecification { value: String },
}

impl Error {
    pub(crate) fn invalid_percent_encoding(pointer: &str, source: std::str::Utf8Error) -> Error {
        Error::InvalidPercentEncoding {
            pointer: pointer.to_string(),
            source,
        }
    }
    pub(crate) fn invalid_array_index(
        pointer: &str,
        index: &str,
        source: std::num::ParseIntError,
    ) -> Error {
        Error::InvalidArrayIndex {
            pointer: pointer.to_string(),
            index: index.to_string(),
            source,
        }
    }
    pub(crate) fn pointer_to_nowhere(pointer: &str) -> Error {
        Error::PointerToNowhere {
            pointer: pointer.to_string(),
        }
    }
    pub(crate) fn invalid_id(value: &str) -> Error {
        Error::InvalidId {
            value: value.to_string(),
        }
    }
    pub(crate) fn invalid_anchor(value: &str) -> Error {
        Error::InvalidAnchor {
            value: value.to_string(),
        }
    }
    pub(crate) fn duplicate_id(uri: &str) -> Error {
        Error::DuplicateId {
            uri: uri.to_string(),
        }
    }
    pub(crate) fn duplicate_anchor(uri: &str, anchor: &str) -> Error {
        Error::DuplicateAnchor {
            uri: uri.to_string(),
            anchor: anchor.to_string(),
        }
    }
    pub(crate) fn unknown_specification(value: &str) -> Error {
        Error::UnknownSpecification {
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Uri(inner) => inner.fmt(f),
            Error::PointerToNowhere { pointer } => {
                write!(f, "Pointer '{pointer}' does not exist")
            }
            Error::InvalidPercentEncoding { pointer, .. } => write!(
                f,
                "Invalid percent encoding in pointer '{pointer}': the decoded bytes do not represent valid UTF-8"
            ),
            Error::InvalidArrayIndex { pointer, index, .. } => {
                write!(f, "Failed to parse array index '{index}' in pointer '{pointer}'")
            }
            Error::InvalidId { value } => write!(f, "'{value}' is not a valid URI-reference"),
            Error::InvalidAnchor { value } => {
                write!(f, "'{value}' is not a valid anchor name")
            }
            Error::DuplicateId { uri } => write!(f, "Duplicate schema ID: '{uri}'"),
            Error::DuplicateAnchor { uri, anchor } => {
                write!(f, "Duplicate anchor '{anchor}' under base '{uri}'")
            }
            Error::UnknownSpecification { value } => {
                write!(f, "'{value}' is not a known JSON Schema specification")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Uri(inner) => Some(inner),
            Error::InvalidPercentEncoding { source, .. } => Some(source),
            Error::InvalidArrayIndex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<UriError> for Error {
    fn from(value: UriError) -> Self {
        Error::Uri(value)
    }
}

/// Wraps the URI-parsing/resolution errors raised by `fluent-uri` so callers
/// see one error surface regardless of where in the URI pipeline they came
/// from.
#[derive(Debug)]
pub enum UriError {
    Parse { input: String, source: ParseError },
    Resolve { input: String, source: ResolveError },
    Build(BuildError),
}

impl UriError {
    pub(crate) fn parse(input: &str, source: ParseError) -> UriError {
        UriError::Parse {
            input: input.to_string(),
            source,
        }
    }
    pub(crate) fn resolve(input: &str, source: ResolveError) -> UriError {
        UriError::Resolve {
            input: input.to_string(),
            source,
        }
    }
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::Parse { input, source } => {
                write!(f, "Failed to parse URI reference '{input}': {source}")
            }
            UriError::Resolve { input, source } => {
                write!(f, "Failed to resolve URI reference '{input}': {source}")
            }
            UriError::Build(source) => write!(f, "Failed to build URI: {source}"),
        }
    }
}

impl StdError for UriError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            UriError::Parse { source, .. } => Some(source),
            UriError::Resolve { source, .. } => Some(source),
            UriError::Build(source) => Some(source),
        }
    }
}

impl From<BuildError> for UriError {
    fn from(value: BuildError) -> Self {
        UriError::Build(value)
    }
}

//! Error taxonomy (spec.md §7): a single `MalformedSchemaError` for
//! structurally invalid schemas, surfaced to the caller and never caught
//! internally except while pre-validating a schema against its
//! meta-schema; a separate `BuildError` for failures constructing a
//! `Validator` itself.
use std::{error::Error as StdError, fmt};

use referencing::Uri;
use serde_json::Value;

/// The schema itself is invalid: a bad `$id`/`$anchor`, an unknown
/// required vocabulary, a duplicate Id, a cyclic reference detected via
/// annotation/error uniqueness, a `$ref` to a non-schema value, or any
/// other structural requirement a keyword imposes on its own value.
/// Always carries the absolute location where the problem was detected.
#[derive(Debug)]
pub enum MalformedSchemaError {
    InvalidId { location: Uri, value: String },
    InvalidAnchor { location: Uri, value: String },
    DuplicateId { location: Uri },
    DuplicateAnchor { location: Uri, anchor: String },
    /// The same `(instance, keyword[, name])` triple would be recorded
    /// twice — the sole cycle-detection signal (spec.md §4.6, §9).
    CyclicReference { location: Uri },
    UnknownVocabulary { location: Uri, vocabulary: String },
    RefNotFound { location: Uri, target: String },
    RefTargetNotSchema { location: Uri, target: String },
    /// A keyword's own value does not meet its structural requirement,
    /// e.g. `required` containing a non-string, `properties` not being an
    /// object.
    InvalidKeywordValue {
        location: Uri,
        keyword: &'static str,
        message: String,
    },
    MetaschemaValidationFailed { schema_id: String },
    Referencing(referencing::Error),
}

impl MalformedSchemaError {
    pub(crate) fn invalid_keyword_value(
        location: &Uri,
        keyword: &'static str,
        message: impl Into<String>,
    ) -> MalformedSchemaError {
        MalformedSchemaError::InvalidKeywordValue {
            location: location.clone(),
            keyword,
            message: message.into(),
        }
    }

    pub(crate) fn cyclic_reference(location: &Uri) -> MalformedSchemaError {
        MalformedSchemaError::CyclicReference {
            location: location.clone(),
        }
    }

    pub(crate) fn ref_not_found(location: &Uri, target: impl Into<String>) -> MalformedSchemaError {
        MalformedSchemaError::RefNotFound {
            location: location.clone(),
            target: target.into(),
        }
    }

    pub(crate) fn ref_target_not_schema(
        location: &Uri,
        target: impl Into<String>,
    ) -> MalformedSchemaError {
        MalformedSchemaError::RefTargetNotSchema {
            location: location.clone(),
            target: target.into(),
        }
    }

    pub(crate) fn unknown_vocabulary(location: &Uri, vocabulary: impl Into<String>) -> MalformedSchemaError {
        MalformedSchemaError::UnknownVocabulary {
            location: location.clone(),
            vocabulary: vocabulary.into(),
        }
    }

    pub(crate) fn metaschema_validation_failed(schema_id: impl Into<String>) -> MalformedSchemaError {
        MalformedSchemaError::MetaschemaValidationFailed {
            schema_id: schema_id.into(),
        }
    }
}

impl fmt::Display for MalformedSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedSchemaError::InvalidId { location, value } => {
                write!(f, "{location}: '{value}' is not a valid URI-reference")
            }
            MalformedSchemaError::InvalidAnchor { location, value } => {
                write!(f, "{location}: '{value}' is not a valid anchor name")
            }
            MalformedSchemaError::DuplicateId { location } => {
                write!(f, "{location}: ID not unique")
            }
            MalformedSchemaError::DuplicateAnchor { location, anchor } => {
                write!(f, "{location}: anchor '{anchor}' not unique")
            }
            MalformedSchemaError::CyclicReference { location } => {
                write!(f, "{location}: cyclic schema reference without an intervening annotation or error")
            }
            MalformedSchemaError::UnknownVocabulary { location, vocabulary } => {
                write!(f, "{location}: required vocabulary '{vocabulary}' is not known")
            }
            MalformedSchemaError::RefNotFound { location, target } => {
                write!(f, "{location}: reference '{target}' could not be resolved")
            }
            MalformedSchemaError::RefTargetNotSchema { location, target } => {
                write!(f, "{location}: reference '{target}' does not resolve to a schema")
            }
            MalformedSchemaError::InvalidKeywordValue {
                location,
                keyword,
                message,
            } => write!(f, "{location}: '{keyword}' {message}"),
            MalformedSchemaError::MetaschemaValidationFailed { schema_id } => {
                write!(f, "schema does not validate against {schema_id}")
            }
            MalformedSchemaError::Referencing(inner) => inner.fmt(f),
        }
    }
}

impl StdError for MalformedSchemaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MalformedSchemaError::Referencing(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<referencing::Error> for MalformedSchemaError {
    fn from(value: referencing::Error) -> Self {
        MalformedSchemaError::Referencing(value)
    }
}

/// Failures that can occur while constructing a `Validator`: the root
/// schema cannot be scanned, a requested specification is not one of the
/// three supported drafts, or a supplied document/retriever combination is
/// inconsistent.
#[derive(Debug)]
pub enum BuildError {
    Schema(MalformedSchemaError),
    Referencing(referencing::Error),
    /// A pre-supplied external document was not an object or boolean.
    InvalidDocument { uri: String },
    /// The instance given to `Validator::is_valid`/`apply` was requested
    /// against a schema location that does not exist.
    UnknownRoot { uri: String },
    /// The detected/requested value of an unused option conflicts with
    /// another, e.g. `CONTENT` enabled without a retriever able to decode
    /// anything.
    InvalidOptions { message: String },
}

impl BuildError {
    pub(crate) fn invalid_document(uri: impl Into<String>) -> BuildError {
        BuildError::InvalidDocument { uri: uri.into() }
    }
    pub(crate) fn unknown_root(uri: impl Into<String>) -> BuildError {
        BuildError::UnknownRoot { uri: uri.into() }
    }
    pub(crate) fn invalid_options(message: impl Into<String>) -> BuildError {
        BuildError::InvalidOptions {
            message: message.into(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Schema(inner) => inner.fmt(f),
            BuildError::Referencing(inner) => inner.fmt(f),
            BuildError::InvalidDocument { uri } => {
                write!(f, "document at '{uri}' is not a valid schema (object or boolean)")
            }
            BuildError::UnknownRoot { uri } => write!(f, "no schema is registered at '{uri}'"),
            BuildError::InvalidOptions { message } => write!(f, "invalid options: {message}"),
        }
    }
}

impl StdError for BuildError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BuildError::Schema(inner) => Some(inner),
            BuildError::Referencing(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<MalformedSchemaError> for BuildError {
    fn from(value: MalformedSchemaError) -> Self {
        BuildError::Schema(value)
    }
}

impl From<referencing::Error> for BuildError {
    fn from(value: referencing::Error) -> Self {
        BuildError::Referencing(value)
    }
}

/// A single evaluation result, either an [`Annotation`] or an [`Outcome`],
/// carries this so callers can tell exactly where and under what keyword
/// it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub instance: crate::path::JsonPath,
    pub keyword: crate::path::JsonPath,
    pub abs_keyword: String,
}

/// A piece of metadata a keyword produced after succeeding; may be
/// consumed by a later keyword at the same instance location (e.g.
/// `properties` recording matched names for `additionalProperties`).
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: &'static str,
    pub loc: Locator,
    pub value: Value,
    pub valid: bool,
}

/// A single keyword invocation's pass/fail result, recorded regardless of
/// outcome when `COLLECT_ERRORS` is set. `pruned` is set after the fact
/// once the enclosing frame as a whole succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub result: bool,
    pub loc: Locator,
    pub value: Value,
    pub pruned: bool,
}

//! The physical-I/O seam for loading schemas that are not already known
//! (spec.md §1/§6): the core crate never fetches a document itself, it
//! only defines the trait a caller implements.
use core::fmt;

use referencing::Uri as OwnedUri;
use serde_json::Value;

/// Fetches the JSON document located at `uri`. Implementations decide how:
/// filesystem, HTTP, an in-memory map, or anything else.
pub trait Retrieve: Send + Sync {
    /// # Errors
    /// Any error the implementation wants surfaced; the caller sees it
    /// wrapped as `BuildError`/`MalformedSchemaError` depending on when the
    /// retrieval was attempted.
    fn retrieve(&self, uri: &OwnedUri) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone)]
struct DefaultRetrieverError;

impl fmt::Display for DefaultRetrieverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the default retriever does not fetch external resources")
    }
}

impl std::error::Error for DefaultRetrieverError {}

/// A retriever that never succeeds, matching the Non-goal on physical I/O:
/// callers who need network or filesystem resolution supply their own
/// `Retrieve` implementation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DefaultRetriever;

impl Retrieve for DefaultRetriever {
    fn retrieve(&self, _uri: &OwnedUri) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(DefaultRetrieverError))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retriever_always_errors() {
        let uri = OwnedUri::parse("https://example.com/schema").unwrap();
        assert!(DefaultRetriever.retrieve(&uri).is_err());
    }
}

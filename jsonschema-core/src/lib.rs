//! Keyword-oriented JSON Schema evaluation for Draft-06, Draft-07 and
//! 2019-09.
//!
//! This crate does not parse JSON, fetch schemas over the network, or
//! decode `contentEncoding`/`contentMediaType` payloads — it evaluates an
//! already-parsed [`serde_json::Value`] schema against an already-parsed
//! instance, and leaves retrieval ([`retriever::Retrieve`]) and format
//! checks ([`format::Format`]) to the caller.
mod context;
mod engine;
mod error;
mod format;
mod keywords;
mod meta_schemas;
mod number;
mod options;
mod path;
mod retriever;
mod validator;

pub use error::{Annotation, BuildError, Locator, MalformedSchemaError, Outcome};
pub use format::{Format, FormatRegistry};
pub use options::{options, ValidationOptions};
pub use path::JsonPath;
pub use retriever::{DefaultRetriever, Retrieve};
pub use validator::{ValidationReport, Validator};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_surface_builds_and_validates() {
        let validator = Validator::new(&json!({"type": "object", "required": ["name"]})).unwrap();
        assert!(validator.is_valid(&json!({"name": "ok"})));
        assert!(!validator.is_valid(&json!({})));
    }
}

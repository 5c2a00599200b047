//! `ValidationOptions` (spec.md §6): the chainable configuration surface
//! a caller uses to select a specification, toggle annotation/error
//! collection, register formats, and supply a retriever.
use std::sync::Arc;

use ahash::AHashMap;
use referencing::{Specification, Uri};
use serde_json::Value;

use crate::{
    format::{Format, FormatRegistry},
    retriever::{DefaultRetriever, Retrieve},
};

/// Configuration for a [`crate::Validator`] build.
#[derive(Clone)]
pub struct ValidationOptions {
    format: bool,
    default_specification: Specification,
    specification: Option<Specification>,
    collect_annotations: bool,
    collect_annotations_for_failed: bool,
    collect_errors: bool,
    content: bool,
    auto_resolve: bool,
    retriever: Arc<dyn Retrieve>,
    formats: FormatRegistry,
    documents: AHashMap<String, Value>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            format: false,
            default_specification: Specification::default(),
            specification: None,
            collect_annotations: false,
            collect_annotations_for_failed: false,
            collect_errors: false,
            content: false,
            auto_resolve: false,
            retriever: Arc::new(DefaultRetriever),
            formats: FormatRegistry::new(),
            documents: AHashMap::default(),
        }
    }
}

impl ValidationOptions {
    #[must_use]
    pub fn new() -> Self {
        ValidationOptions::default()
    }

    /// `FORMAT`: treat `format` as an assertion rather than annotation-only.
    pub fn with_format_assertion(&mut self, yes: bool) -> &mut Self {
        self.format = yes;
        self
    }

    /// `DEFAULT_SPECIFICATION`: used only if neither `$schema`, an explicit
    /// `SPECIFICATION`, nor the guessing heuristic resolve one.
    pub fn with_default_specification(&mut self, spec: Specification) -> &mut Self {
        self.default_specification = spec;
        self
    }

    /// `SPECIFICATION`: takes priority over `$schema` detection... actually
    /// per spec.md §4.5, `$schema` is tried first; this only applies when
    /// the root has none.
    pub fn with_specification(&mut self, spec: Specification) -> &mut Self {
        self.specification = Some(spec);
        self
    }

    pub fn with_collect_annotations(&mut self, yes: bool) -> &mut Self {
        self.collect_annotations = yes;
        self
    }

    pub fn with_collect_annotations_for_failed(&mut self, yes: bool) -> &mut Self {
        self.collect_annotations_for_failed = yes;
        self
    }

    pub fn with_collect_errors(&mut self, yes: bool) -> &mut Self {
        self.collect_errors = yes;
        self
    }

    /// `CONTENT`: decode and validate `contentEncoding`/`contentMediaType`/`contentSchema`.
    pub fn with_content(&mut self, yes: bool) -> &mut Self {
        self.content = yes;
        self
    }

    /// `AUTO_RESOLVE`: treat an unresolved `$ref` target URI as a fetchable
    /// URL via the retriever, rather than failing immediately.
    pub fn with_auto_resolve(&mut self, yes: bool) -> &mut Self {
        self.auto_resolve = yes;
        self
    }

    pub fn with_retriever(&mut self, retriever: impl Retrieve + 'static) -> &mut Self {
        self.retriever = Arc::new(retriever);
        self
    }

    pub fn with_format<F: Format>(&mut self, name: impl Into<String>, check: F) -> &mut Self {
        self.formats.register(name, check);
        self
    }

    /// Pre-supplies a document for a URI that would otherwise have to be
    /// fetched through the retriever (or a built-in meta-schema).
    pub fn with_document(&mut self, uri: impl Into<String>, document: Value) -> &mut Self {
        self.documents.insert(uri.into(), document);
        self
    }

    #[must_use]
    pub fn format_assertion_enabled(&self) -> bool {
        self.format
    }

    #[must_use]
    pub fn default_specification(&self) -> Specification {
        self.default_specification
    }

    #[must_use]
    pub fn specification(&self) -> Option<Specification> {
        self.specification
    }

    #[must_use]
    pub fn collect_annotations(&self) -> bool {
        self.collect_annotations
    }

    #[must_use]
    pub fn collect_annotations_for_failed(&self) -> bool {
        self.collect_annotations_for_failed
    }

    #[must_use]
    pub fn collect_errors(&self) -> bool {
        self.collect_errors
    }

    #[must_use]
    pub fn content_enabled(&self) -> bool {
        self.content
    }

    #[must_use]
    pub fn auto_resolve(&self) -> bool {
        self.auto_resolve
    }

    #[must_use]
    pub fn retriever(&self) -> Arc<dyn Retrieve> {
        Arc::clone(&self.retriever)
    }

    #[must_use]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    #[must_use]
    pub fn documents(&self) -> &AHashMap<String, Value> {
        &self.documents
    }

    /// Resolves the specification to use for `contents` per spec.md §4.5's
    /// priority order: `$schema` → explicit `SPECIFICATION` → heuristic
    /// guess → `DEFAULT_SPECIFICATION`.
    pub fn resolve_specification(&self, contents: &Value) -> Result<Specification, referencing::Error> {
        if let Some(detected) = Specification::detect(contents)? {
            return Ok(detected);
        }
        if let Some(spec) = self.specification {
            return Ok(spec);
        }
        if let Some(guessed) = referencing::guess(contents) {
            return Ok(guessed);
        }
        Ok(self.default_specification)
    }
}

/// Convenience entry point mirroring the grounding crate's free-function
/// `jsonschema::options()`.
#[must_use]
pub fn options() -> ValidationOptions {
    ValidationOptions::new()
}

#[must_use]
pub(crate) fn default_root_uri() -> Uri {
    Uri::parse("json-schema:///").expect("valid synthetic root URI")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_options_disable_everything() {
        let options = ValidationOptions::new();
        assert!(!options.format_assertion_enabled());
        assert!(!options.collect_annotations());
        assert!(!options.collect_errors());
    }

    #[test]
    fn resolve_specification_prefers_schema_keyword() {
        let options = ValidationOptions::new();
        let schema = json!({"$schema": "http://json-schema.org/draft-06/schema"});
        assert_eq!(options.resolve_specification(&schema).unwrap(), Specification::Draft6);
    }

    #[test]
    fn resolve_specification_falls_back_to_guess_then_default() {
        let mut options = ValidationOptions::new();
        options.with_default_specification(Specification::Draft6);
        assert_eq!(
            options.resolve_specification(&json!({"definitions": {}})).unwrap(),
            Specification::Draft7
        );
        let all_excluded = json!({"$defs": {}, "definitions": {}});
        assert_eq!(options.resolve_specification(&all_excluded).unwrap(), Specification::Draft6);
    }

    #[test]
    fn builder_methods_chain() {
        let mut options = ValidationOptions::new();
        options
            .with_format_assertion(true)
            .with_collect_annotations(true)
            .with_collect_errors(true);
        assert!(options.format_assertion_enabled());
        assert!(options.collect_annotations());
        assert!(options.collect_errors());
    }
}

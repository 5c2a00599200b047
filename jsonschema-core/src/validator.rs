//! The compiled entry point (spec.md §1): ties the scanner, specification
//! selection and the evaluation engine together behind `is_valid`/
//! `validate`/`apply`. Unlike a tree-compiling validator, there is no
//! precompiled node graph here — each call builds a fresh [`Context`] (the
//! evaluation engine is the only thing that walks the schema), since
//! per-call state is exactly what spec.md §5 scopes to a single `validate`.
use std::sync::Arc;

use referencing::{Specification, Uri};
use serde_json::Value;

use crate::{
    context::Context,
    engine,
    error::{Annotation, BuildError, MalformedSchemaError, Outcome},
    options::{default_root_uri, ValidationOptions},
};

/// A schema plus the options it was built with, ready to validate
/// instances against.
pub struct Validator {
    schema: Arc<Value>,
    options: ValidationOptions,
    root_uri: Uri,
    spec: Specification,
}

/// The result of [`Validator::apply`]: the overall result plus every
/// annotation/error recorded, honoring the pruning rule in §4.6.g.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Outcome>,
    pub annotations: Vec<Annotation>,
}

impl Validator {
    /// Starts a fresh [`ValidationOptions`] builder, mirroring the
    /// free function [`crate::options::options`].
    #[must_use]
    pub fn options() -> ValidationOptions {
        ValidationOptions::new()
    }

    /// Builds a validator for `schema` using default options.
    ///
    /// # Errors
    /// See [`ValidationOptions::build`].
    pub fn new(schema: &Value) -> Result<Validator, BuildError> {
        Validator::options().build(schema)
    }

    fn fresh_context(&self) -> Result<Context, MalformedSchemaError> {
        let mut ctx = Context::new(self.options.clone(), self.root_uri.clone(), Arc::clone(&self.schema), self.spec)?;
        ctx.preload_configured_documents()?;
        Ok(ctx)
    }

    /// Runs validation and returns only the boolean result, short-circuiting
    /// on the first failure (§4.6's fail-fast path; no annotations or
    /// errors are retained).
    ///
    /// # Panics
    /// Panics if a `$ref` cycle or malformed reference surfaces during
    /// evaluation; use [`Validator::apply`] to observe that as an `Err`
    /// instead.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        let mut ctx = self.fresh_context().expect("schema was already scanned at build time");
        engine::apply(&mut ctx, &self.schema, None, None, instance, None).expect("fail-fast evaluation does not record cycles")
    }

    /// Runs validation and returns the first recorded failing keyword
    /// outcome, if any.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError`] if the schema itself is structurally
    /// invalid (a bad `$ref`, a cyclic reference, ...) rather than the
    /// instance being invalid.
    pub fn validate(&self, instance: &Value) -> Result<Result<(), Vec<Outcome>>, MalformedSchemaError> {
        let report = self.apply(instance)?;
        if report.valid {
            Ok(Ok(()))
        } else {
            Ok(Err(report.errors.into_iter().filter(|o| !o.pruned && !o.result).collect()))
        }
    }

    /// Runs validation and returns every annotation/error recorded,
    /// regardless of whether the schema passed.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError`] for a structurally invalid schema or
    /// a detected evaluation cycle.
    pub fn apply(&self, instance: &Value) -> Result<ValidationReport, MalformedSchemaError> {
        let mut ctx = self.fresh_context()?;
        let valid = engine::apply(&mut ctx, &self.schema, None, None, instance, None)?;
        Ok(ValidationReport {
            valid,
            errors: ctx.errors().to_vec(),
            annotations: ctx.annotations().to_vec(),
        })
    }

    #[must_use]
    pub fn specification(&self) -> Specification {
        self.spec
    }
}

impl ValidationOptions {
    /// Builds a [`Validator`] for `schema`: selects the specification per
    /// §4.5's priority chain, then scans the document to build its
    /// `URI → Id` index and catches a structurally invalid schema early.
    ///
    /// # Errors
    /// Returns [`BuildError`] if `schema` is not an object or boolean, or
    /// its `$schema`/`$id`/`$anchor` members don't meet §4.4's invariants.
    pub fn build(&self, schema: &Value) -> Result<Validator, BuildError> {
        if !schema.is_object() && !schema.is_boolean() {
            return Err(BuildError::invalid_document("<root>"));
        }
        let spec = self.resolve_specification(schema)?;
        let root_uri = default_root_uri();
        referencing::scan(&root_uri, schema, spec).map_err(MalformedSchemaError::from)?;
        Ok(Validator {
            schema: Arc::new(schema.clone()),
            options: self.clone(),
            root_uri,
            spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_valid_accepts_and_rejects() {
        let validator = Validator::new(&json!({"type": "string", "minLength": 2})).unwrap();
        assert!(validator.is_valid(&json!("ab")));
        assert!(!validator.is_valid(&json!("a")));
        assert!(!validator.is_valid(&json!(1)));
    }

    #[test]
    fn validate_reports_failing_outcomes() {
        let validator = Validator::new(&json!({"type": "string"})).unwrap();
        let outcome = validator.validate(&json!(1)).unwrap();
        assert!(outcome.is_err());
    }

    #[test]
    fn apply_records_metadata_annotations() {
        let mut options = Validator::options();
        options.with_collect_annotations(true);
        let validator = options.build(&json!({"title": "a title", "type": "string"})).unwrap();
        let report = validator.apply(&json!("hi")).unwrap();
        assert!(report.valid);
        assert!(report.annotations.iter().any(|a| a.name == "title"));
    }

    #[test]
    fn ref_across_documents_resolves_via_preloaded_document() {
        let mut options = Validator::options();
        options.with_document("https://example.com/other", json!({"type": "integer"}));
        let validator = options.build(&json!({"$ref": "https://example.com/other"})).unwrap();
        assert!(validator.is_valid(&json!(5)));
        assert!(!validator.is_valid(&json!("nope")));
    }

    #[test]
    fn invalid_root_schema_type_is_rejected_at_build() {
        assert!(Validator::new(&json!([1, 2])).is_err());
    }
}

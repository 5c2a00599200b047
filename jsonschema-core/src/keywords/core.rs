//! Core keywords (spec.md §4.7, classes 0-2): specification/identity
//! bookkeeping and reference resolution. Most of these are side-effect-only
//! from the instance's point of view — the scanner already did the real
//! work of building the `URI → Id` index.
use referencing::Specification;
use serde_json::{Map, Value};

use crate::{context::Context, engine, error::{Annotation, MalformedSchemaError}, meta_schemas};

/// `$schema` (spec.md §4.4/§4.7): updates the frame's specification when
/// the value names one of the three known drafts. Otherwise, per §4.4,
/// the schema must still be validated against its own declared meta-schema
/// before giving up — resolved through the same built-in table
/// `findAndSetRoot` falls back on, since fetching an arbitrary external
/// meta-schema is outside what this crate does on its own.
///
/// # Errors
/// Returns [`MalformedSchemaError::MetaschemaValidationFailed`] if the
/// schema object does not validate against its declared, resolvable
/// meta-schema.
pub fn schema_keyword(
    ctx: &mut Context,
    value: &Value,
    schema_map: &Map<String, Value>,
    _instance: &Value,
) -> Result<bool, MalformedSchemaError> {
    let Some(identifier) = value.as_str() else { return Ok(true) };
    if let Ok(spec) = Specification::from_schema_identifier(identifier) {
        ctx.set_current_spec(spec);
        return Ok(true);
    }
    let trimmed = identifier.trim_end_matches('#');
    let Some(meta_schema) = meta_schemas::lookup(identifier).or_else(|| meta_schemas::lookup(trimmed)) else {
        return Ok(true);
    };
    let schema_value = Value::Object(schema_map.clone());
    let valid = engine::apply(ctx, meta_schema, Some("$schema"), None, &schema_value, Some("<metaschema>"))?;
    if valid {
        Ok(true)
    } else {
        Err(MalformedSchemaError::metaschema_validation_failed(identifier))
    }
}

pub fn id_keyword(_ctx: &mut Context, _value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(true)
}

pub fn anchor_keyword(_ctx: &mut Context, _value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(true)
}

pub fn recursive_anchor_keyword(ctx: &mut Context, value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    if value == &Value::Bool(true) {
        let base = ctx.current_frame().base.clone();
        ctx.set_recursive_anchor(base);
    }
    Ok(true)
}

pub fn vocabulary_keyword(ctx: &mut Context, value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(map) = value.as_object() else { return Ok(true) };
    let known = ctx.current_frame().spec.default_vocabularies();
    for (uri, required) in map {
        if required == &Value::Bool(true) && !known.contains(&uri.as_str()) {
            return Err(MalformedSchemaError::unknown_vocabulary(&ctx.current_frame().abs_keyword, uri.clone()));
        }
    }
    Ok(true)
}

pub fn ref_keyword(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let target_str = value
        .as_str()
        .ok_or_else(|| MalformedSchemaError::invalid_keyword_value(&ctx.current_frame().abs_keyword, "$ref", "must be a string"))?;
    ctx.record_annotation(Annotation {
        name: "$ref",
        loc: engine::locator_for(ctx, "$ref"),
        value: Value::String(target_str.to_string()),
        valid: true,
    })?;
    let target = ctx.resolve_ref(target_str)?;
    let (new_base, schema_value) = {
        let (base, schema) = ctx.navigate(&target)?;
        (base, schema.clone())
    };
    let doc_key = target.doc_key;
    ctx.with_doc_context(doc_key, new_base, |ctx| engine::apply(ctx, &schema_value, None, None, instance, None))
}

pub fn recursive_ref_keyword(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let target_str = value.as_str().ok_or_else(|| {
        MalformedSchemaError::invalid_keyword_value(&ctx.current_frame().abs_keyword, "$recursiveRef", "must be a string")
    })?;
    let original_base = ctx.current_frame().base.clone();
    let lookup_base = ctx.outermost_recursive_anchor().unwrap_or_else(|| original_base.clone());
    ctx.set_current_base(lookup_base);
    let resolved = ctx.resolve_ref(target_str);
    ctx.set_current_base(original_base);
    let target = resolved?;
    let (new_base, schema_value) = {
        let (base, schema) = ctx.navigate(&target)?;
        (base, schema.clone())
    };
    let doc_key = target.doc_key;
    ctx.with_doc_context(doc_key, new_base, |ctx| engine::apply(ctx, &schema_value, None, None, instance, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{default_root_uri, ValidationOptions};
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(document: Value) -> Context {
        Context::new(ValidationOptions::new(), default_root_uri(), Arc::new(document), Specification::Draft201909).unwrap()
    }

    #[test]
    fn schema_keyword_updates_current_spec() {
        let mut context = ctx(json!({}));
        let schema_map = Map::new();
        schema_keyword(&mut context, &json!("http://json-schema.org/draft-06/schema"), &schema_map, &json!(null)).unwrap();
        assert_eq!(ctx_spec(&context), Specification::Draft6);
    }

    fn ctx_spec(context: &Context) -> Specification {
        context.current_frame().spec
    }

    #[test]
    fn unrecognized_schema_identifier_with_no_known_metaschema_is_ignored() {
        let mut context = ctx(json!({}));
        let schema_map = Map::new();
        assert!(schema_keyword(&mut context, &json!("http://example.com/nope"), &schema_map, &json!(null)).unwrap());
    }

    #[test]
    fn unrecognized_schema_identifier_validates_against_its_resolved_metaschema() {
        let mut context = ctx(json!({}));
        let identifier = json!("https://json-schema.org/draft/2019-09/meta/validation");
        let valid_schema = json!({"$schema": identifier, "type": "string"});
        let schema_map = valid_schema.as_object().unwrap().clone();
        assert!(schema_keyword(&mut context, &identifier, &schema_map, &json!(null)).unwrap());

        let invalid_schema = json!({"$schema": identifier, "type": 123});
        let schema_map = invalid_schema.as_object().unwrap().clone();
        assert!(schema_keyword(&mut context, &identifier, &schema_map, &json!(null)).is_err());
    }

    #[test]
    fn vocabulary_rejects_unknown_required_entry() {
        let mut context = ctx(json!({}));
        let value = json!({"https://example.com/vocab/unknown": true});
        assert!(vocabulary_keyword(&mut context, &value, &json!(null)).is_err());
    }

    #[test]
    fn vocabulary_allows_unknown_when_not_required() {
        let mut context = ctx(json!({}));
        let value = json!({"https://example.com/vocab/unknown": false});
        assert!(vocabulary_keyword(&mut context, &value, &json!(null)).unwrap());
    }

    #[test]
    fn ref_keyword_resolves_local_defs() {
        let schema = json!({"$defs": {"positive": {"type": "integer", "minimum": 0}}});
        let mut context = ctx(schema);
        assert!(ref_keyword(&mut context, &json!("#/$defs/positive"), &json!(5)).unwrap());
        assert!(!ref_keyword(&mut context, &json!("#/$defs/positive"), &json!(-1)).unwrap());
    }
}

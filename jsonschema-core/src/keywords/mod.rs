//! Keyword contracts (spec.md §4.7), grouped by concern the way the
//! vocabularies themselves are split in 2019-09. [`dispatch`] is the single
//! entry point `engine::apply` calls once per recognized keyword.
mod applicators;
mod content;
mod core;
mod definitions;
mod metadata;
pub(crate) mod validation;

use serde_json::{Map, Value};

use crate::{context::Context, error::MalformedSchemaError};

/// Runs the keyword named `name` (present in `schema_map` as `value`)
/// against `instance`. `schema_map` is the enclosing schema object, needed
/// only by keywords whose contract reads a sibling keyword directly
/// (`if`/`then`/`else`, `contains`'s `minContains`/`maxContains`).
///
/// # Errors
/// Propagates [`MalformedSchemaError`] from the keyword's own structural
/// checks or from a nested `apply`/`$ref` resolution.
pub fn dispatch(
    ctx: &mut Context,
    name: &str,
    value: &Value,
    schema_map: &Map<String, Value>,
    instance: &Value,
) -> Result<bool, MalformedSchemaError> {
    match name {
        "$schema" => core::schema_keyword(ctx, value, schema_map, instance),
        "$id" => core::id_keyword(ctx, value, instance),
        "$anchor" => core::anchor_keyword(ctx, value, instance),
        "$recursiveAnchor" => core::recursive_anchor_keyword(ctx, value, instance),
        "$vocabulary" => core::vocabulary_keyword(ctx, value, instance),
        "$ref" => core::ref_keyword(ctx, value, instance),
        "$recursiveRef" => core::recursive_ref_keyword(ctx, value, instance),

        "type" => validation::type_keyword(ctx, value, instance),
        "enum" => validation::enum_keyword(ctx, value, instance),
        "const" => validation::const_keyword(ctx, value, instance),
        "multipleOf" => validation::multiple_of(ctx, value, instance),
        "maximum" => validation::maximum(ctx, value, instance),
        "exclusiveMaximum" => validation::exclusive_maximum(ctx, value, instance),
        "minimum" => validation::minimum(ctx, value, instance),
        "exclusiveMinimum" => validation::exclusive_minimum(ctx, value, instance),
        "maxLength" => validation::max_length(ctx, value, instance),
        "minLength" => validation::min_length(ctx, value, instance),
        "pattern" => validation::pattern_keyword(ctx, value, instance),
        "maxItems" => validation::max_items(ctx, value, instance),
        "minItems" => validation::min_items(ctx, value, instance),
        "uniqueItems" => validation::unique_items(ctx, value, instance),
        "required" => validation::required_keyword(ctx, value, instance),
        "maxProperties" => validation::max_properties(ctx, value, instance),
        "minProperties" => validation::min_properties(ctx, value, instance),
        "dependentRequired" => validation::dependent_required(ctx, value, instance),
        "propertyNames" => validation::property_names(ctx, value, instance),
        "format" => validation::format_keyword(ctx, value, instance),

        "allOf" => applicators::all_of(ctx, value, instance),
        "anyOf" => applicators::any_of(ctx, value, instance),
        "oneOf" => applicators::one_of(ctx, value, instance),
        "not" => applicators::not_keyword(ctx, value, instance),
        "if" => applicators::if_then_else(ctx, value, schema_map, instance),
        "then" | "else" => Ok(true),
        "properties" => applicators::properties(ctx, value, instance),
        "patternProperties" => applicators::pattern_properties(ctx, value, instance),
        "additionalProperties" => applicators::additional_properties(ctx, value, instance),
        "unevaluatedProperties" => applicators::unevaluated_properties(ctx, value, instance),
        "items" => applicators::items(ctx, value, instance),
        "additionalItems" => applicators::additional_items(ctx, value, instance),
        "contains" => applicators::contains(ctx, value, schema_map, instance),
        "minContains" | "maxContains" => applicators::contains_bound(ctx, value, instance),
        "unevaluatedItems" => applicators::unevaluated_items(ctx, value, instance),
        "dependencies" => applicators::property_dependencies(ctx, value, instance),
        "dependentSchemas" => applicators::dependent_schemas(ctx, value, instance),

        "contentEncoding" | "contentMediaType" => content::annotation_only(ctx, value, instance),
        "contentSchema" => content::content_schema(ctx, value, instance),

        "title" | "description" | "default" | "examples" | "deprecated" | "readOnly" | "writeOnly" | "$comment" => {
            metadata::annotation_only(ctx, value, instance)
        }

        "definitions" | "$defs" => definitions::no_op(ctx, value, instance),

        _ => Ok(true),
    }
}

/// Whether `apply`'s generic per-keyword recording should record an
/// annotation using the keyword's own raw value. Applicators that derive a
/// different annotation value (matched property names, evaluated item
/// count, ...) record it themselves and are excluded here so it isn't
/// recorded twice with the wrong value.
#[must_use]
pub fn is_annotation_bearing(name: &str) -> bool {
    matches!(
        name,
        "title" | "description" | "default" | "examples" | "deprecated" | "readOnly" | "writeOnly" | "$comment" | "format" | "contentEncoding" | "contentMediaType"
    )
}

/// Maps a recognized keyword name to a matching `'static` string, for use
/// as [`crate::error::Annotation::name`].
#[must_use]
pub fn static_name(name: &str) -> &'static str {
    match name {
        "title" => "title",
        "description" => "description",
        "default" => "default",
        "examples" => "examples",
        "deprecated" => "deprecated",
        "readOnly" => "readOnly",
        "writeOnly" => "writeOnly",
        "$comment" => "$comment",
        "format" => "format",
        "contentEncoding" => "contentEncoding",
        "contentMediaType" => "contentMediaType",
        "contentSchema" => "contentSchema",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_keywords_are_annotation_bearing() {
        assert!(is_annotation_bearing("title"));
        assert!(is_annotation_bearing("format"));
    }

    #[test]
    fn applicators_manage_their_own_annotations() {
        assert!(!is_annotation_bearing("properties"));
        assert!(!is_annotation_bearing("items"));
        assert!(!is_annotation_bearing("$ref"));
    }

    #[test]
    fn static_name_round_trips_known_keywords() {
        assert_eq!(static_name("title"), "title");
        assert_eq!(static_name("nonsense"), "unknown");
    }
}

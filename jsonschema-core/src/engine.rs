//! The recursive evaluator (spec.md §4.6): `apply()` dispatches the
//! keywords present in a schema object, in keyword-class order, recording
//! annotations/errors and pruning them once a frame's overall result is
//! known.
use referencing::Uri;
use serde_json::Value;

use crate::{
    context::{Context, Frame},
    error::{Annotation, Locator, MalformedSchemaError, Outcome},
    keywords,
    path::JsonPath,
};

/// Keyword evaluation order (§4.6): lower classes run first; within a
/// class, keywords run in the schema object's own member order.
fn keyword_class(name: &str) -> u8 {
    match name {
        "$schema" => 0,
        "$id" => 1,
        "$recursiveAnchor" | "$anchor" | "$vocabulary" => 2,
        "additionalItems" | "additionalProperties" | "maxContains" | "minContains" => 4,
        "unevaluatedItems" | "unevaluatedProperties" => 5,
        _ => 3,
    }
}

fn extend_abs_keyword(current: &Uri, name: &str) -> Uri {
    let fragment = current.decoded_fragment().unwrap_or_default();
    let path = if fragment.starts_with('/') {
        JsonPath::from_json_pointer(&fragment)
    } else {
        JsonPath::absolute()
    };
    let extended = path.append(name);
    current
        .strip_fragment()
        .resolve(&format!("#{extended}"))
        .unwrap_or_else(|_| current.clone())
}

/// Builds the [`Locator`] a keyword at `name` would be recorded under in
/// the current frame — the same shape `apply`'s own loop builds, so
/// applicators that manage their own annotations (`properties`, `items`,
/// `contains`, ...) can record them consistently.
#[must_use]
pub(crate) fn locator_for(ctx: &Context, name: &str) -> Locator {
    let frame = ctx.current_frame();
    Locator {
        instance: frame.instance_path.clone(),
        keyword: frame.keyword_path.append(name),
        abs_keyword: frame.abs_keyword.as_str().to_string(),
    }
}

/// `apply(schema, keywordName, absSchemaLocOverride, instance, instanceName)`
/// (§4.6). Returns the schema's pass/fail result against `instance`.
///
/// # Errors
/// Propagates [`MalformedSchemaError`] from any keyword's own structural
/// checks, `$ref` resolution failures, or a detected annotation/error
/// cycle.
pub fn apply(
    ctx: &mut Context,
    schema: &Value,
    keyword_name: Option<&str>,
    abs_override: Option<Uri>,
    instance: &Value,
    instance_name: Option<&str>,
) -> Result<bool, MalformedSchemaError> {
    if let Value::Bool(result) = schema {
        let current = ctx.current_frame().clone();
        let keyword_path = match keyword_name {
            Some(name) => current.keyword_path.append(name),
            None => current.keyword_path.clone(),
        };
        let instance_path = match instance_name {
            Some(name) => current.instance_path.append(name),
            None => current.instance_path.clone(),
        };
        let abs_keyword = abs_override.unwrap_or(current.abs_keyword);
        ctx.record_error(Outcome {
            result: *result,
            loc: Locator {
                instance: instance_path,
                keyword: keyword_path,
                abs_keyword: abs_keyword.as_str().to_string(),
            },
            value: schema.clone(),
            pruned: false,
        })?;
        return Ok(*result);
    }
    let Value::Object(map) = schema else {
        return Err(MalformedSchemaError::invalid_keyword_value(
            &ctx.current_frame().abs_keyword,
            "schema",
            "must be a boolean or an object",
        ));
    };
    if map.is_empty() {
        return Ok(true);
    }

    let current = ctx.current_frame().clone();
    let addr = referencing::identity_key(schema);
    let primary_id = ctx.index(&current.doc_key).and_then(|idx| idx.primary_id_for_element(addr)).cloned();

    let (abs_keyword, base) = if let Some(id) = &primary_id {
        (id.id.clone(), id.id.strip_fragment())
    } else if let Some(overridden) = abs_override {
        (overridden, current.base.clone())
    } else if let Some(name) = keyword_name {
        (extend_abs_keyword(&current.abs_keyword, name), current.base.clone())
    } else {
        (current.abs_keyword.clone(), current.base.clone())
    };

    let keyword_path = match keyword_name {
        Some(name) => current.keyword_path.append(name),
        None => current.keyword_path.clone(),
    };
    let instance_path = match instance_name {
        Some(name) => current.instance_path.append(name),
        None => current.instance_path.clone(),
    };

    let frame = Frame {
        base,
        spec: current.spec,
        abs_keyword,
        keyword_path: keyword_path.clone(),
        instance_path: instance_path.clone(),
        is_root: false,
        doc_key: current.doc_key.clone(),
    };
    ctx.push_frame(frame, None);

    let mut names: Vec<&String> = map.keys().filter(|k| ctx.current_frame().spec.is_known_keyword(k)).collect();
    names.sort_by_key(|name| keyword_class(name));

    let has_ref = map.contains_key("$ref");
    let fail_fast = !ctx.options().collect_annotations() && !ctx.options().collect_errors();

    let mut overall = true;
    for name in names {
        let ignore_siblings = has_ref && name != "$ref" && ctx.current_frame().spec < referencing::Specification::Draft201909;
        if ignore_siblings {
            continue;
        }
        let value = &map[name];
        let abs_for_keyword = extend_abs_keyword(&ctx.current_frame().abs_keyword, name);
        ctx.set_current_abs_keyword(abs_for_keyword.clone());

        let result = keywords::dispatch(ctx, name, value, map, instance)?;
        overall &= result;

        let loc = Locator {
            instance: instance_path.clone(),
            keyword: keyword_path.append(name),
            abs_keyword: abs_for_keyword.as_str().to_string(),
        };
        if keywords::is_annotation_bearing(name) && (result || ctx.options().collect_annotations_for_failed()) {
            ctx.record_annotation(Annotation {
                name: keywords::static_name(name),
                loc: loc.clone(),
                value: value.clone(),
                valid: result,
            })?;
        }
        ctx.record_error(Outcome {
            result,
            loc,
            value: value.clone(),
            pruned: false,
        })?;

        if fail_fast && !result {
            overall = false;
            break;
        }
    }

    if !overall {
        ctx.prune_annotations(&instance_path, &keyword_path);
    } else {
        ctx.mark_errors_pruned(&instance_path, &keyword_path);
    }

    ctx.pop_frame();
    Ok(overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{default_root_uri, ValidationOptions};
    use serde_json::json;
    use std::sync::Arc;

    fn run(schema: Value, instance: &Value) -> bool {
        let options = ValidationOptions::new();
        let spec = options.resolve_specification(&schema).unwrap();
        let mut ctx = Context::new(options, default_root_uri(), Arc::new(schema.clone()), spec).unwrap();
        apply(&mut ctx, &schema, None, None, instance, None).unwrap()
    }

    #[test]
    fn boolean_schema_short_circuits() {
        assert!(run(json!(true), &json!(1)));
        assert!(!run(json!(false), &json!(1)));
    }

    #[test]
    fn empty_object_schema_is_trivially_valid() {
        assert!(run(json!({}), &json!("anything")));
    }

    #[test]
    fn type_mismatch_fails() {
        assert!(!run(json!({"type": "string"}), &json!(1)));
        assert!(run(json!({"type": "string"}), &json!("ok")));
    }

    #[test]
    fn all_of_requires_every_branch() {
        let schema = json!({"allOf": [{"type": "string"}, {"minLength": 2}]});
        assert!(run(schema.clone(), &json!("ab")));
        assert!(!run(schema, &json!("a")));
    }

    #[test]
    fn ref_to_local_defs_resolves() {
        let schema = json!({
            "$defs": {"positive": {"type": "integer", "minimum": 0}},
            "$ref": "#/$defs/positive"
        });
        assert!(run(schema.clone(), &json!(5)));
        assert!(!run(schema, &json!(-1)));
    }
}

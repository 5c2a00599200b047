//! Applicator keywords (spec.md §4.7, classes 3-5): keywords that apply a
//! subschema to all or part of the instance and fold the branch results
//! back into this frame's overall result. `properties`, `items`,
//! `contains` and their `unevaluated*`/`additional*` counterparts record
//! their own annotations (via [`crate::engine::locator_for`]) rather than
//! letting `apply`'s generic per-keyword recording run, since their
//! annotation value is derived (matched names, evaluated count) rather
//! than the raw schema value.
use serde_json::{Map, Value};

use crate::{
    context::Context,
    engine::{self, locator_for},
    error::{Annotation, MalformedSchemaError},
};

pub fn all_of(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(branches) = value.as_array() else { return Ok(true) };
    let mut overall = true;
    for branch in branches {
        let result = engine::apply(ctx, branch, Some("allOf"), None, instance, None)?;
        overall &= result;
    }
    Ok(overall)
}

pub fn any_of(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(branches) = value.as_array() else { return Ok(true) };
    let mut any_passed = false;
    for branch in branches {
        if engine::apply(ctx, branch, Some("anyOf"), None, instance, None)? {
            any_passed = true;
        }
    }
    Ok(any_passed)
}

pub fn one_of(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(branches) = value.as_array() else { return Ok(true) };
    let mut matches = 0;
    for branch in branches {
        if engine::apply(ctx, branch, Some("oneOf"), None, instance, None)? {
            matches += 1;
        }
    }
    Ok(matches == 1)
}

pub fn not_keyword(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(!engine::apply(ctx, value, Some("not"), None, instance, None)?)
}

pub fn if_then_else(ctx: &mut Context, value: &Value, schema_map: &Map<String, Value>, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let condition = engine::apply(ctx, value, Some("if"), None, instance, None)?;
    if condition {
        match schema_map.get("then") {
            Some(branch) => engine::apply(ctx, branch, Some("then"), None, instance, None),
            None => Ok(true),
        }
    } else {
        match schema_map.get("else") {
            Some(branch) => engine::apply(ctx, branch, Some("else"), None, instance, None),
            None => Ok(true),
        }
    }
}

pub fn properties_like(
    ctx: &mut Context,
    value: &Value,
    instance: &Value,
    keyword: &'static str,
    select: impl Fn(&str, &str) -> bool,
) -> Result<bool, MalformedSchemaError> {
    let (Some(schemas), Some(object)) = (value.as_object(), instance.as_object()) else {
        return Ok(true);
    };
    let mut matched = Vec::new();
    let mut overall = true;
    for (pattern, subschema) in schemas {
        for (name, prop_value) in object {
            if select(pattern, name) {
                matched.push(Value::String(name.clone()));
                let result = engine::apply(ctx, subschema, Some(keyword), None, prop_value, Some(name))?;
                overall &= result;
            }
        }
    }
    ctx.record_annotation(Annotation {
        name: keyword,
        loc: locator_for(ctx, keyword),
        value: Value::Array(matched),
        valid: true,
    })?;
    Ok(overall)
}

pub fn properties(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    properties_like(ctx, value, instance, "properties", |pattern, name| pattern == name)
}

pub fn pattern_properties(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(schemas), Some(object)) = (value.as_object(), instance.as_object()) else {
        return Ok(true);
    };
    let mut matched = Vec::new();
    let mut overall = true;
    for (pattern, subschema) in schemas {
        let regex = ctx.compiled_pattern(pattern)?;
        for (name, prop_value) in object {
            if regex.is_match(name).unwrap_or(false) {
                matched.push(Value::String(name.clone()));
                let result = engine::apply(ctx, subschema, Some("patternProperties"), None, prop_value, Some(name))?;
                overall &= result;
            }
        }
    }
    ctx.record_annotation(Annotation {
        name: "patternProperties",
        loc: locator_for(ctx, "patternProperties"),
        value: Value::Array(matched),
        valid: true,
    })?;
    Ok(overall)
}

fn already_addressed(ctx: &Context, instance_path: &crate::path::JsonPath, name: &str) -> bool {
    let by_name = ["properties", "patternProperties"];
    by_name.iter().any(|keyword| {
        ctx.annotations_named(instance_path, keyword)
            .any(|value| value.as_array().is_some_and(|names| names.iter().any(|n| n.as_str() == Some(name))))
    })
}

pub fn additional_properties(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(object) = instance.as_object() else { return Ok(true) };
    let instance_path = ctx.current_frame().instance_path.clone();
    let mut overall = true;
    let mut touched = Vec::new();
    for (name, prop_value) in object {
        if already_addressed(ctx, &instance_path, name) {
            continue;
        }
        touched.push(Value::String(name.clone()));
        let result = engine::apply(ctx, value, Some("additionalProperties"), None, prop_value, Some(name))?;
        overall &= result;
    }
    ctx.record_annotation(Annotation {
        name: "additionalProperties",
        loc: locator_for(ctx, "additionalProperties"),
        value: Value::Array(touched),
        valid: true,
    })?;
    Ok(overall)
}

pub fn unevaluated_properties(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(object) = instance.as_object() else { return Ok(true) };
    let instance_path = ctx.current_frame().instance_path.clone();
    let mut overall = true;
    for (name, prop_value) in object {
        let covered = already_addressed(ctx, &instance_path, name)
            || ctx
                .annotations_named(&instance_path, "additionalProperties")
                .any(|v| v.as_array().is_some_and(|names| names.iter().any(|n| n.as_str() == Some(name))))
            || ctx.annotations_named(&instance_path, "unevaluatedProperties").any(|v| v.as_array().is_some_and(|names| names.iter().any(|n| n.as_str() == Some(name))));
        if covered {
            continue;
        }
        let result = engine::apply(ctx, value, Some("unevaluatedProperties"), None, prop_value, Some(name))?;
        overall &= result;
    }
    Ok(overall)
}

fn items_count_annotation(ctx: &Context, instance_path: &crate::path::JsonPath, keyword: &str) -> Option<u64> {
    ctx.annotations_named(instance_path, keyword).find_map(|v| match v {
        Value::Bool(true) => Some(u64::MAX),
        Value::Number(n) => n.as_u64(),
        _ => None,
    })
}

pub fn items(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(items) = instance.as_array() else { return Ok(true) };
    let mut overall = true;
    let annotation_value = if let Some(tuple) = value.as_array() {
        let n = tuple.len().min(items.len());
        for (i, (subschema, item)) in tuple.iter().zip(items.iter()).enumerate() {
            let result = engine::apply(ctx, subschema, Some("items"), None, item, Some(&i.to_string()))?;
            overall &= result;
        }
        Value::Number((n as u64).into())
    } else {
        for (i, item) in items.iter().enumerate() {
            let result = engine::apply(ctx, value, Some("items"), None, item, Some(&i.to_string()))?;
            overall &= result;
        }
        Value::Bool(true)
    };
    ctx.record_annotation(Annotation {
        name: "items",
        loc: locator_for(ctx, "items"),
        value: annotation_value,
        valid: true,
    })?;
    Ok(overall)
}

pub fn additional_items(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(items) = instance.as_array() else { return Ok(true) };
    let instance_path = ctx.current_frame().instance_path.clone();
    let start = items_count_annotation(ctx, &instance_path, "items").unwrap_or(0);
    if start >= items.len() as u64 {
        return Ok(true);
    }
    let mut overall = true;
    for (i, item) in items.iter().enumerate().skip(start as usize) {
        let result = engine::apply(ctx, value, Some("additionalItems"), None, item, Some(&i.to_string()))?;
        overall &= result;
    }
    ctx.record_annotation(Annotation {
        name: "additionalItems",
        loc: locator_for(ctx, "additionalItems"),
        value: Value::Bool(true),
        valid: true,
    })?;
    Ok(overall)
}

pub fn contains(ctx: &mut Context, value: &Value, schema_map: &Map<String, Value>, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(items) = instance.as_array() else { return Ok(true) };
    let mut matched_indices = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if engine::apply(ctx, value, Some("contains"), None, item, Some(&i.to_string()))? {
            matched_indices.push(Value::Number((i as u64).into()));
        }
    }
    ctx.record_annotation(Annotation {
        name: "contains",
        loc: locator_for(ctx, "contains"),
        value: Value::Array(matched_indices.clone()),
        valid: true,
    })?;
    let count = matched_indices.len() as u64;
    if let Some(min) = schema_map.get("minContains").and_then(Value::as_u64) {
        if count < min {
            return Ok(false);
        }
    } else if count == 0 {
        return Ok(false);
    }
    if let Some(max) = schema_map.get("maxContains").and_then(Value::as_u64) {
        if count > max {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `minContains`/`maxContains` never run standalone: `contains` already
/// consumed them when present. Evaluated here as a no-op so the keyword
/// table stays total.
pub fn contains_bound(_ctx: &mut Context, _value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(true)
}

pub fn unevaluated_items(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(items) = instance.as_array() else { return Ok(true) };
    let instance_path = ctx.current_frame().instance_path.clone();
    let start = items_count_annotation(ctx, &instance_path, "items")
        .max(items_count_annotation(ctx, &instance_path, "unevaluatedItems").unwrap_or(0));
    let additional_covers_all = ctx.annotations_named(&instance_path, "additionalItems").next().is_some();
    let contained: Vec<u64> = ctx
        .annotations_named(&instance_path, "contains")
        .flat_map(|v| v.as_array().into_iter().flatten().filter_map(Value::as_u64))
        .collect();
    if additional_covers_all || start.unwrap_or(0) >= items.len() as u64 {
        return Ok(true);
    }
    let start = start.unwrap_or(0);
    let mut overall = true;
    for (i, item) in items.iter().enumerate().skip(start as usize) {
        if contained.contains(&(i as u64)) {
            continue;
        }
        let result = engine::apply(ctx, value, Some("unevaluatedItems"), None, item, Some(&i.to_string()))?;
        overall &= result;
    }
    Ok(overall)
}

pub fn property_dependencies(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(deps), Some(object)) = (value.as_object(), instance.as_object()) else {
        return Ok(true);
    };
    let mut overall = true;
    for (property, dependency) in deps {
        if !object.contains_key(property) {
            continue;
        }
        let result = if dependency.is_array() {
            crate::keywords::validation::dependent_required(
                ctx,
                &Value::Object(Map::from_iter([(property.clone(), dependency.clone())])),
                instance,
            )?
        } else {
            engine::apply(ctx, dependency, Some("dependencies"), None, instance, None)?
        };
        overall &= result;
    }
    Ok(overall)
}

pub fn dependent_schemas(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(deps), Some(object)) = (value.as_object(), instance.as_object()) else {
        return Ok(true);
    };
    let mut overall = true;
    for (property, subschema) in deps {
        if !object.contains_key(property) {
            continue;
        }
        overall &= engine::apply(ctx, subschema, Some("dependentSchemas"), None, instance, None)?;
    }
    Ok(overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{default_root_uri, ValidationOptions};
    use referencing::Specification;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> Context {
        Context::new(ValidationOptions::new(), default_root_uri(), Arc::new(json!(true)), Specification::Draft201909).unwrap()
    }

    #[test]
    fn all_of_short_circuits_on_any_failure() {
        let branches = json!([{"type": "string"}, {"minLength": 5}]);
        assert!(!all_of(&mut ctx(), &branches, &json!("ab")).unwrap());
    }

    #[test]
    fn any_of_passes_if_one_branch_matches() {
        let branches = json!([{"type": "string"}, {"type": "number"}]);
        assert!(any_of(&mut ctx(), &branches, &json!(1)).unwrap());
    }

    #[test]
    fn one_of_rejects_multiple_matches() {
        let branches = json!([{"minimum": 0}, {"maximum": 100}]);
        assert!(!one_of(&mut ctx(), &branches, &json!(5)).unwrap());
    }

    #[test]
    fn properties_records_matched_names_annotation() {
        let mut context = ctx();
        let value = json!({"a": {"type": "string"}});
        let instance = json!({"a": "x", "b": 1});
        assert!(properties(&mut context, &value, &instance).unwrap());
        let instance_path = context.current_frame().instance_path.clone();
        let names: Vec<_> = context.annotations_named(&instance_path, "properties").collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn additional_properties_skips_names_covered_by_properties() {
        let mut context = ctx();
        let props = json!({"a": true});
        let instance = json!({"a": 1, "b": 2});
        properties(&mut context, &props, &instance).unwrap();
        let result = additional_properties(&mut context, &json!(false), &instance).unwrap();
        assert!(!result);
    }

    #[test]
    fn items_tuple_annotates_covered_count() {
        let mut context = ctx();
        let schema = json!([{"type": "string"}]);
        let instance = json!(["a", 1, 2]);
        items(&mut context, &schema, &instance).unwrap();
        let instance_path = context.current_frame().instance_path.clone();
        let value = context.annotations_named(&instance_path, "items").next().unwrap();
        assert_eq!(value, &json!(1));
    }
}

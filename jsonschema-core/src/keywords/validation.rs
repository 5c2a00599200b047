//! Validation keywords (spec.md §4.7, class 3): constraints checked
//! directly against the instance, with no further schema application
//! except `propertyNames`.
use serde_json::Value;

use crate::{context::Context, error::MalformedSchemaError, number::Number};

/// JSON value equality with numbers compared by numeric value across
/// representations (integer vs. float, different precisions), per `enum`,
/// `const` and `uniqueItems`.
#[must_use]
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Number::from_json(x).cmp_exact(&Number::from_json(y)) == std::cmp::Ordering::Equal,
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(a, b)| deep_eq(a, b)),
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).is_some_and(|other| deep_eq(v, other)))
        }
        _ => a == b,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_type(instance: &Value, name: &str) -> bool {
    match name {
        "integer" => instance.as_number().is_some_and(|n| Number::from_json(n).is_integer()),
        other => json_type_name(instance) == other,
    }
}

pub fn type_keyword(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    match value {
        Value::String(name) => Ok(matches_type(instance, name)),
        Value::Array(names) => Ok(names.iter().filter_map(Value::as_str).any(|name| matches_type(instance, name))),
        _ => Ok(true),
    }
}

pub fn enum_keyword(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Value::Array(items) = value else { return Ok(true) };
    Ok(items.iter().any(|item| deep_eq(item, instance)))
}

pub fn const_keyword(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(deep_eq(value, instance))
}

fn as_number(instance: &Value) -> Option<Number> {
    instance.as_number().map(Number::from_json)
}

pub fn multiple_of(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(n), Some(divisor)) = (as_number(instance), value.as_number().map(Number::from_json)) else {
        return Ok(true);
    };
    Ok(n.is_multiple_of(&divisor))
}

pub fn maximum(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(n), Some(limit)) = (as_number(instance), value.as_number().map(Number::from_json)) else {
        return Ok(true);
    };
    Ok(n.cmp_exact(&limit) != std::cmp::Ordering::Greater)
}

pub fn exclusive_maximum(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(n), Some(limit)) = (as_number(instance), value.as_number().map(Number::from_json)) else {
        return Ok(true);
    };
    Ok(n.cmp_exact(&limit) == std::cmp::Ordering::Less)
}

pub fn minimum(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(n), Some(limit)) = (as_number(instance), value.as_number().map(Number::from_json)) else {
        return Ok(true);
    };
    Ok(n.cmp_exact(&limit) != std::cmp::Ordering::Less)
}

pub fn exclusive_minimum(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(n), Some(limit)) = (as_number(instance), value.as_number().map(Number::from_json)) else {
        return Ok(true);
    };
    Ok(n.cmp_exact(&limit) == std::cmp::Ordering::Greater)
}

pub fn max_length(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(s), Some(limit)) = (instance.as_str(), value.as_u64()) else { return Ok(true) };
    Ok(s.chars().count() as u64 <= limit)
}

pub fn min_length(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(s), Some(limit)) = (instance.as_str(), value.as_u64()) else { return Ok(true) };
    Ok(s.chars().count() as u64 >= limit)
}

pub fn pattern_keyword(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(source), Some(s)) = (value.as_str(), instance.as_str()) else { return Ok(true) };
    let regex = ctx.compiled_pattern(source)?;
    Ok(regex.is_match(s).unwrap_or(false))
}

pub fn max_items(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(items), Some(limit)) = (instance.as_array(), value.as_u64()) else { return Ok(true) };
    Ok(items.len() as u64 <= limit)
}

pub fn min_items(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(items), Some(limit)) = (instance.as_array(), value.as_u64()) else { return Ok(true) };
    Ok(items.len() as u64 >= limit)
}

pub fn unique_items(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    if value != &Value::Bool(true) {
        return Ok(true);
    }
    let Some(items) = instance.as_array() else { return Ok(true) };
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if deep_eq(&items[i], &items[j]) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

pub fn required_keyword(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(names), Some(object)) = (value.as_array(), instance.as_object()) else { return Ok(true) };
    Ok(names.iter().filter_map(Value::as_str).all(|name| object.contains_key(name)))
}

pub fn max_properties(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(object), Some(limit)) = (instance.as_object(), value.as_u64()) else { return Ok(true) };
    Ok(object.len() as u64 <= limit)
}

pub fn min_properties(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(object), Some(limit)) = (instance.as_object(), value.as_u64()) else { return Ok(true) };
    Ok(object.len() as u64 >= limit)
}

/// `dependentRequired` (2019-09) and the property-list form of the older
/// `dependencies` keyword share this contract: if the named property is
/// present, every listed property must also be present.
pub fn dependent_required(_ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(deps), Some(object)) = (value.as_object(), instance.as_object()) else { return Ok(true) };
    for (property, required) in deps {
        if !object.contains_key(property) {
            continue;
        }
        let Some(required) = required.as_array() else { continue };
        if !required.iter().filter_map(Value::as_str).all(|name| object.contains_key(name)) {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn property_names(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let Some(object) = instance.as_object() else { return Ok(true) };
    for name in object.keys() {
        let name_as_value = Value::String(name.clone());
        let result = crate::engine::apply(ctx, value, Some("propertyNames"), None, &name_as_value, None)?;
        if !result {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn format_keyword(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    let (Some(name), Some(s)) = (value.as_str(), instance.as_str()) else { return Ok(true) };
    if !ctx.options().format_assertion_enabled() {
        return Ok(true);
    }
    Ok(ctx.options().formats().check(name, s).unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{default_root_uri, ValidationOptions};
    use serde_json::json;
    use std::sync::Arc;
    use test_case::test_case;

    fn ctx() -> Context {
        Context::new(
            ValidationOptions::new(),
            default_root_uri(),
            Arc::new(json!(true)),
            referencing::Specification::Draft201909,
        )
        .unwrap()
    }

    #[test_case(&json!("integer"), &json!(5), true)]
    #[test_case(&json!("integer"), &json!(5.5), false)]
    #[test_case(&json!(["string", "null"]), &json!(null), true)]
    fn type_matches(value: &Value, instance: &Value, expected: bool) {
        assert_eq!(type_keyword(&mut ctx(), value, instance).unwrap(), expected);
    }

    #[test]
    fn enum_compares_numbers_by_value() {
        let values = json!([1, 2.0, 3]);
        assert!(enum_keyword(&mut ctx(), &values, &json!(2)).unwrap());
    }

    #[test]
    fn unique_items_rejects_numeric_duplicates() {
        assert!(!unique_items(&mut ctx(), &json!(true), &json!([1, 1.0])).unwrap());
        assert!(unique_items(&mut ctx(), &json!(true), &json!([1, 2])).unwrap());
    }

    #[test]
    fn required_checks_presence() {
        assert!(required_keyword(&mut ctx(), &json!(["a"]), &json!({"a": 1})).unwrap());
        assert!(!required_keyword(&mut ctx(), &json!(["a"]), &json!({})).unwrap());
    }

    #[test]
    fn pattern_is_cached_and_matches() {
        let mut context = ctx();
        assert!(pattern_keyword(&mut context, &json!("^a+$"), &json!("aaa")).unwrap());
        assert!(!pattern_keyword(&mut context, &json!("^a+$"), &json!("b")).unwrap());
    }
}

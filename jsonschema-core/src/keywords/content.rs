//! `contentEncoding`/`contentMediaType`/`contentSchema` (spec.md §4.7):
//! the actual decoders are an external collaborator this crate never
//! bundles. `contentEncoding`/`contentMediaType` are annotation-only here;
//! `contentSchema` degrades to parsing the instance as embedded JSON text
//! when `CONTENT` is enabled, since that much doesn't need a pluggable
//! decoder.
use serde_json::Value;

use crate::{context::Context, engine, error::MalformedSchemaError};

pub fn annotation_only(_ctx: &mut Context, _value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(true)
}

pub fn content_schema(ctx: &mut Context, value: &Value, instance: &Value) -> Result<bool, MalformedSchemaError> {
    if !ctx.options().content_enabled() {
        return Ok(true);
    }
    let Some(text) = instance.as_str() else { return Ok(true) };
    let Ok(decoded) = serde_json::from_str::<Value>(text) else {
        return Ok(true);
    };
    engine::apply(ctx, value, Some("contentSchema"), None, &decoded, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{default_root_uri, ValidationOptions};
    use referencing::Specification;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(content: bool) -> Context {
        let mut options = ValidationOptions::new();
        options.with_content(content);
        Context::new(options, default_root_uri(), Arc::new(json!(true)), Specification::Draft201909).unwrap()
    }

    #[test]
    fn content_schema_is_skipped_when_disabled() {
        let mut context = ctx(false);
        assert!(content_schema(&mut context, &json!({"type": "number"}), &json!("\"not a number\"")).unwrap());
    }

    #[test]
    fn content_schema_validates_embedded_json() {
        let mut context = ctx(true);
        assert!(content_schema(&mut context, &json!({"type": "number"}), &json!("42")).unwrap());
        assert!(!content_schema(&mut context, &json!({"type": "number"}), &json!("\"oops\"")).unwrap());
    }
}

//! Annotation-only metadata keywords (spec.md §4.7): never affect the
//! instance's pass/fail result. `apply`'s generic per-keyword recording
//! (driven by [`super::is_annotation_bearing`]) handles storing these, so
//! every function here is trivially `Ok(true)`.
use serde_json::Value;

use crate::{context::Context, error::MalformedSchemaError};

pub fn annotation_only(_ctx: &mut Context, _value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(true)
}

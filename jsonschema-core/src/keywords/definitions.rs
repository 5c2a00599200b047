//! `definitions`/`$defs` (spec.md §4.7): pure storage, reached only through
//! `$ref`; never applied against an instance directly.
use serde_json::Value;

use crate::{context::Context, error::MalformedSchemaError};

pub fn no_op(_ctx: &mut Context, _value: &Value, _instance: &Value) -> Result<bool, MalformedSchemaError> {
    Ok(true)
}

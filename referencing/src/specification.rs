//! JSON Schema specification (draft) enumeration and per-draft gating.
use serde_json::Value;

use crate::Error;

/// One of the three drafts this engine understands, ordered oldest-first so
/// callers can write `draft >= Specification::Draft201909` the way the
/// keyword tables below do.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specification {
    Draft6,
    #[default]
    Draft7,
    Draft201909,
}

impl Specification {
    /// Canonical `$schema` identifier for this draft (without a trailing
    /// fragment).
    #[must_use]
    pub fn canonical_id(self) -> &'static str {
        match self {
            Specification::Draft6 => "http://json-schema.org/draft-06/schema",
            Specification::Draft7 => "http://json-schema.org/draft-07/schema",
            Specification::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
        }
    }

    /// Maps a `$schema` value to a [`Specification`], tolerating a trailing
    /// `#` (both forms appear in the wild and in the official meta-schemas'
    /// own `$id`).
    ///
    /// # Errors
    /// Returns [`Error::UnknownSpecification`] if `schema` is not one of the
    /// three recognized identifiers.
    pub fn from_schema_identifier(schema: &str) -> Result<Specification, Error> {
        match schema.trim_end_matches('#') {
            "http://json-schema.org/draft-06/schema" => Ok(Specification::Draft6),
            "http://json-schema.org/draft-07/schema" => Ok(Specification::Draft7),
            "https://json-schema.org/draft/2019-09/schema" => Ok(Specification::Draft201909),
            other => Err(Error::unknown_specification(other)),
        }
    }

    /// Reads `$schema` off the root of `contents`, if present, and maps it
    /// to a [`Specification`]; returns `Ok(None)` if there is no `$schema`
    /// member, `Err` if there is one but it is unrecognized.
    pub fn detect(contents: &Value) -> Result<Option<Specification>, Error> {
        match contents.get("$schema").and_then(Value::as_str) {
            Some(schema) => Ok(Some(Specification::from_schema_identifier(schema)?)),
            None => Ok(None),
        }
    }

    /// Whether `$defs` (rather than `definitions`) is this draft's
    /// definitions container.
    #[must_use]
    pub fn uses_defs(self) -> bool {
        self >= Specification::Draft201909
    }

    /// Whether `keyword` is recognized under this draft at all — used both
    /// by the evaluator (to decide what to dispatch) and by the
    /// specification-guessing heuristic (§4.5).
    #[must_use]
    pub fn is_known_keyword(self, keyword: &str) -> bool {
        match keyword {
            // Removed in 2019-09.
            "definitions" | "dependencies" => self < Specification::Draft201909,
            // New in 2019-09.
            "$anchor" | "$recursiveRef" | "$recursiveAnchor" | "$defs" | "$vocabulary"
            | "dependentRequired" | "dependentSchemas" | "unevaluatedItems"
            | "unevaluatedProperties" => self >= Specification::Draft201909,
            "maxContains" | "minContains" => self >= Specification::Draft201909,
            // New in Draft-07.
            "if" | "then" | "else" | "$comment" | "contentEncoding" | "contentMediaType" => {
                self >= Specification::Draft7
            }
            "contentSchema" => self >= Specification::Draft201909,
            // Present since Draft-06 (the oldest draft this engine supports).
            "$id" | "$schema" | "$ref" | "type" | "enum" | "const" | "multipleOf" | "maximum"
            | "exclusiveMaximum" | "minimum" | "exclusiveMinimum" | "maxLength" | "minLength"
            | "pattern" | "items" | "additionalItems" | "maxItems" | "minItems"
            | "uniqueItems" | "required" | "maxProperties" | "minProperties" | "properties"
            | "patternProperties" | "additionalProperties" | "propertyNames" | "allOf"
            | "anyOf" | "oneOf" | "not" | "contains" | "format" | "title" | "description"
            | "default" | "examples" | "readOnly" | "writeOnly" | "deprecated" => true,
            _ => false,
        }
    }

    /// Whether `format` is a format name introduced at or after this draft
    /// — used by the specification-guessing heuristic only; the format
    /// registry itself (an external collaborator, §6) decides assertion
    /// behavior.
    #[must_use]
    pub fn is_known_format(self, format: &str) -> bool {
        match format {
            "duration" | "uuid" => self >= Specification::Draft201909,
            "iri" | "iri-reference" | "idn-hostname" | "relative-json-pointer" => {
                self >= Specification::Draft7
            }
            "date-time" | "email" | "hostname" | "ipv4" | "ipv6" | "uri" | "uri-reference"
            | "uri-template" | "json-pointer" | "regex" | "date" | "time" => true,
            _ => false,
        }
    }

    /// Default vocabulary URIs active for this draft when no `$vocabulary`
    /// keyword is present (Draft-06/07 have no vocabulary concept at all;
    /// 2019-09 implies the "full" vocabulary set).
    #[must_use]
    pub fn default_vocabularies(self) -> &'static [&'static str] {
        match self {
            Specification::Draft6 | Specification::Draft7 => &[],
            Specification::Draft201909 => &[
                "https://json-schema.org/draft/2019-09/vocab/core",
                "https://json-schema.org/draft/2019-09/vocab/applicator",
                "https://json-schema.org/draft/2019-09/vocab/validation",
                "https://json-schema.org/draft/2019-09/vocab/meta-data",
                "https://json-schema.org/draft/2019-09/vocab/format",
                "https://json-schema.org/draft/2019-09/vocab/content",
            ],
        }
    }
}

/// Implements the §4.5 "guess specification" heuristic: classifies every
/// object member it finds and returns the newest draft not excluded by any
/// of them, or `None` if every draft was excluded.
#[must_use]
pub fn guess(contents: &Value) -> Option<Specification> {
    let mut excludes_draft6 = false;
    let mut excludes_draft7 = false;
    let mut excludes_201909 = false;
    walk(contents, &mut excludes_draft6, &mut excludes_draft7, &mut excludes_201909);
    if !excludes_201909 {
        Some(Specification::Draft201909)
    } else if !excludes_draft7 {
        Some(Specification::Draft7)
    } else if !excludes_draft6 {
        Some(Specification::Draft6)
    } else {
        None
    }
}

fn walk(value: &Value, excludes_draft6: &mut bool, excludes_draft7: &mut bool, excludes_201909: &mut bool) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match key.as_str() {
                    // 2019-09-exclusive: rules out both older drafts.
                    "$anchor" | "$recursiveRef" | "$recursiveAnchor" | "$defs" | "$vocabulary"
                    | "dependentRequired" | "dependentSchemas" | "unevaluatedItems"
                    | "unevaluatedProperties" | "maxContains" | "minContains" => {
                        *excludes_draft6 = true;
                        *excludes_draft7 = true;
                    }
                    // Draft-07-introduced: rules out Draft-06 only.
                    "if" | "then" | "else" | "$comment" | "contentEncoding"
                    | "contentMediaType" | "contentSchema" => {
                        *excludes_draft6 = true;
                    }
                    "definitions" | "dependencies" => {
                        *excludes_201909 = true;
                    }
                    "$id" => {
                        if let Some(id) = val.as_str() {
                            if id.contains('#') && !id.ends_with('#') {
                                *excludes_201909 = true;
                            }
                        }
                    }
                    "format" => {
                        if let Some(name) = val.as_str() {
                            if Specification::Draft201909.is_known_format(name)
                                && !Specification::Draft7.is_known_format(name)
                            {
                                *excludes_draft6 = true;
                                *excludes_draft7 = true;
                            }
                        }
                    }
                    _ => {}
                }
                walk(val, excludes_draft6, excludes_draft7, excludes_201909);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, excludes_draft6, excludes_draft7, excludes_201909);
            }
        }
        _ => {}
    }
}

/// Plain-name anchor pattern required by `$anchor` (2019-09+) and by
/// fragment-form `$id` in older drafts: `[A-Za-z_][-A-Za-z0-9._]*`.
#[must_use]
pub fn is_valid_anchor_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("http://json-schema.org/draft-06/schema", Specification::Draft6)]
    #[test_case("http://json-schema.org/draft-06/schema#", Specification::Draft6)]
    #[test_case("http://json-schema.org/draft-07/schema", Specification::Draft7)]
    #[test_case("https://json-schema.org/draft/2019-09/schema", Specification::Draft201909)]
    fn detect_known(schema: &str, expected: Specification) {
        assert_eq!(Specification::from_schema_identifier(schema).unwrap(), expected);
    }

    #[test]
    fn detect_unknown_errors() {
        assert!(Specification::from_schema_identifier("http://example.com/nope").is_err());
    }

    #[test]
    fn ordering_is_oldest_first() {
        assert!(Specification::Draft6 < Specification::Draft7);
        assert!(Specification::Draft7 < Specification::Draft201909);
    }

    #[test_case(&json!({"$defs": {}}), Some(Specification::Draft201909))]
    #[test_case(&json!({"definitions": {}}), Some(Specification::Draft7))]
    #[test_case(&json!({}), Some(Specification::Draft201909))]
    #[test_case(&json!({"if": {}, "then": {}, "definitions": {}}), Some(Specification::Draft7))]
    #[test_case(&json!({"definitions": {}, "$anchor": "Foo"}), None)]
    fn guess_specification(schema: &Value, expected: Option<Specification>) {
        assert_eq!(guess(schema), expected);
    }

    #[test_case("foo", true)]
    #[test_case("_foo", true)]
    #[test_case("foo-bar.baz_1", true)]
    #[test_case("1foo", false)]
    #[test_case("-foo", false)]
    #[test_case("", false)]
    fn anchor_name_pattern(value: &str, expected: bool) {
        assert_eq!(is_valid_anchor_name(value), expected);
    }
}

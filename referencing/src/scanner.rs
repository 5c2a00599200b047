//! The ID/anchor scanner (spec §4.3–§4.4): a single preorder walk over a
//! schema document that builds a `URI → Id` index plus an identity index
//! keyed by the address of the schema element each `Id` names, so the
//! evaluation engine can ask "does *this* node have an Id" without needing
//! to know its path.
use std::collections::HashMap as StdHashMap;

use ahash::AHashMap;
use serde_json::Value;

use crate::{
    error::Error,
    specification::{is_valid_anchor_name, Specification},
    uri::Uri,
};

/// One registered identifier: an `$id`, an `$anchor`, the implicit root, or
/// the old-draft fragment form of `$id`.
#[derive(Debug, Clone)]
pub struct Id {
    /// Resolved, normalized, canonical URI this entry is keyed under.
    pub id: Uri,
    /// The `$id`/`$anchor` value exactly as written in the document, before
    /// resolution against the base in effect at that point.
    pub value: String,
    /// Base URI of the *enclosing* schema, i.e. the base in effect before
    /// this Id's own value was applied.
    pub base_parent: Uri,
    /// Dynamic path (schema-object key / array-index tokens) from the base
    /// boundary down to the element that declared this Id; reset to empty
    /// whenever the base changes, per §4.3.
    pub path: Vec<String>,
    /// JSON Pointer tokens from the *document root* down to the element
    /// that declared this Id, never reset. Lets a `$ref` resolver navigate
    /// straight to the node without re-walking `$id` boundaries.
    pub pointer_from_root: Vec<String>,
    /// Identity key (stable heap address) of the schema element this Id
    /// names, for the "elements-by-identity" index.
    pub element_addr: usize,
    pub root_id: Uri,
    pub root_uri: Uri,
}

/// `URI → Id` plus the identity index described in spec.md §3.
pub struct ScanIndex {
    known_ids: AHashMap<String, Id>,
    by_identity: StdHashMap<usize, Vec<String>>,
}

impl ScanIndex {
    #[must_use]
    pub fn lookup(&self, uri: &Uri) -> Option<&Id> {
        self.known_ids.get(uri.as_str())
    }

    /// The Id with no fragment registered for the element at `addr`, if
    /// any — "the object's primary Id" in §4.6.2.a.
    #[must_use]
    pub fn primary_id_for_element(&self, addr: usize) -> Option<&Id> {
        self.by_identity
            .get(&addr)?
            .iter()
            .filter_map(|key| self.known_ids.get(key.as_str()))
            .find(|id| !id.id.has_non_empty_fragment())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.known_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known_ids.is_empty()
    }
}

#[must_use]
pub fn identity_key(value: &Value) -> usize {
    (value as *const Value) as usize
}

struct Scanner<'a> {
    index: ScanIndex,
    root_id: Uri,
    root_uri: &'a Uri,
}

/// Runs the ID/anchor scan described in spec.md §4.4 over `document`,
/// starting from `root_uri` under `default_spec` (used until/unless a
/// nested `$schema` changes it — §4.3's "update the current specification"
/// rule).
///
/// # Errors
/// Returns [`Error`] for any malformed `$id`/`$anchor` or duplicate
/// registration, per §4.4.
pub fn scan(
    root_uri: &Uri,
    document: &Value,
    default_spec: Specification,
) -> Result<ScanIndex, Error> {
    let mut scanner = Scanner {
        index: ScanIndex {
            known_ids: AHashMap::new(),
            by_identity: StdHashMap::new(),
        },
        root_id: root_uri.clone(),
        root_uri,
    };
    scanner.walk_schema_position(document, root_uri, default_spec, &[], &[])?;
    // I1 / the root-Id fallback: if the root never registered a
    // fragment-less Id of its own, synthesize one so `findAndSetRoot`
    // always has a root to fall back to.
    if scanner.index.lookup(root_uri).is_none() {
        scanner.register(
            root_uri.clone(),
            root_uri.as_str().to_string(),
            root_uri.clone(),
            Vec::new(),
            Vec::new(),
            identity_key(document),
        )?;
    }
    Ok(scanner.index)
}

impl<'a> Scanner<'a> {
    fn register(
        &mut self,
        id: Uri,
        value: String,
        base_parent: Uri,
        path: Vec<String>,
        pointer_from_root: Vec<String>,
        element_addr: usize,
    ) -> Result<(), Error> {
        let key = id.as_str().to_string();
        if self.index.known_ids.contains_key(&key) {
            return if id.has_non_empty_fragment() {
                Err(Error::duplicate_anchor(
                    id.strip_fragment().as_str(),
                    id.decoded_fragment().unwrap_or_default().as_ref(),
                ))
            } else {
                Err(Error::duplicate_id(&key))
            };
        }
        self.index.by_identity.entry(element_addr).or_default().push(key.clone());
        self.index.known_ids.insert(
            key,
            Id {
                id,
                value,
                base_parent,
                path,
                pointer_from_root,
                element_addr,
                root_id: self.root_id.clone(),
                root_uri: self.root_uri.clone(),
            },
        );
        Ok(())
    }

    /// Walks `value`, which occupies a *schema position*: it may itself be
    /// a schema object bearing `$schema`/`$id`/`$anchor`.
    fn walk_schema_position(
        &mut self,
        value: &Value,
        base: &Uri,
        spec: Specification,
        path: &[String],
        root_path: &[String],
    ) -> Result<(), Error> {
        let Value::Object(map) = value else {
            // Booleans (and any other non-object) are valid schemas but
            // carry no identifiers and no children to descend into.
            return Ok(());
        };

        let mut spec = spec;
        if let Some(detected) = Specification::detect(value)? {
            spec = detected;
        }

        let mut current_base = base.clone();
        let mut current_path = path.to_vec();

        if let Some(id_value) = map.get("$id").and_then(Value::as_str) {
            let resolved = current_base
                .resolve(id_value)
                .map_err(|_| Error::invalid_id(id_value))?;
            if resolved.has_non_empty_fragment() {
                let fragment = resolved.decoded_fragment().unwrap_or_default().into_owned();
                if spec >= Specification::Draft201909 {
                    return Err(Error::invalid_id(id_value));
                }
                if !is_valid_anchor_name(&fragment) {
                    return Err(Error::invalid_anchor(&fragment));
                }
                self.register(
                    resolved.clone(),
                    id_value.to_string(),
                    current_base.clone(),
                    current_path.clone(),
                    root_path.to_vec(),
                    identity_key(value),
                )?;
                let stripped = resolved.strip_fragment();
                if stripped.as_str() != current_base.as_str() {
                    self.register(
                        stripped.clone(),
                        id_value.to_string(),
                        current_base.clone(),
                        current_path.clone(),
                        root_path.to_vec(),
                        identity_key(value),
                    )?;
                    current_base = stripped;
                    current_path = Vec::new();
                }
            } else {
                self.register(
                    resolved.clone(),
                    id_value.to_string(),
                    current_base.clone(),
                    current_path.clone(),
                    root_path.to_vec(),
                    identity_key(value),
                )?;
                current_base = resolved;
                current_path = Vec::new();
            }
        }

        if spec >= Specification::Draft201909 {
            if let Some(anchor_value) = map.get("$anchor").and_then(Value::as_str) {
                if !is_valid_anchor_name(anchor_value) {
                    return Err(Error::invalid_anchor(anchor_value));
                }
                let anchored = current_base
                    .resolve(&format!("#{anchor_value}"))
                    .map_err(|_| Error::invalid_anchor(anchor_value))?;
                self.register(
                    anchored,
                    anchor_value.to_string(),
                    current_base.clone(),
                    current_path.clone(),
                    root_path.to_vec(),
                    identity_key(value),
                )?;
            }
        }

        let defs_key = if spec.uses_defs() { "$defs" } else { "definitions" };
        for (key, child) in map {
            let mut child_path = current_path.clone();
            child_path.push(key.clone());
            let mut child_root_path = root_path.to_vec();
            child_root_path.push(key.clone());
            if key == "properties" || key == "patternProperties" || key == defs_key {
                self.walk_schema_container(child, &current_base, spec, &child_path, &child_root_path)?;
            } else {
                self.walk_schema_position(child, &current_base, spec, &child_path, &child_root_path)?;
            }
        }
        Ok(())
    }

    /// Walks `value`, a map of name → schema (the value of `properties`,
    /// `patternProperties`, `$defs`, or `definitions`): the map itself is
    /// not a schema, but every value in it is.
    fn walk_schema_container(
        &mut self,
        value: &Value,
        base: &Uri,
        spec: Specification,
        path: &[String],
        root_path: &[String],
    ) -> Result<(), Error> {
        let Value::Object(map) = value else {
            return Ok(());
        };
        for (key, child) in map {
            let mut child_path = path.to_vec();
            child_path.push(key.clone());
            let mut child_root_path = root_path.to_vec();
            child_root_path.push(key.clone());
            self.walk_schema_position(child, base, spec, &child_path, &child_root_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> Uri {
        Uri::parse("https://example.com/schema").unwrap()
    }

    #[test]
    fn registers_nested_id() {
        let schema = json!({
            "$id": "https://example.com/schema",
            "properties": {
                "foo": {"$id": "sub.json", "type": "string"}
            }
        });
        let index = scan(&root(), &schema, Specification::Draft201909).unwrap();
        assert!(index.lookup(&Uri::parse("https://example.com/sub.json").unwrap()).is_some());
    }

    #[test]
    fn registers_anchor_2019_09() {
        let schema = json!({
            "$id": "https://example.com/schema",
            "$defs": {
                "foo": {"$anchor": "Foo", "type": "string"}
            }
        });
        let index = scan(&root(), &schema, Specification::Draft201909).unwrap();
        assert!(index
            .lookup(&Uri::parse("https://example.com/schema#Foo").unwrap())
            .is_some());
    }

    #[test]
    fn registers_legacy_fragment_anchor() {
        let schema = json!({
            "$id": "https://example.com/schema",
            "definitions": {
                "foo": {"$id": "#Foo", "type": "string"}
            }
        });
        let index = scan(&root(), &schema, Specification::Draft7).unwrap();
        assert!(index
            .lookup(&Uri::parse("https://example.com/schema#Foo").unwrap())
            .is_some());
    }

    #[test]
    fn duplicate_id_is_an_error() {
        let schema = json!({
            "$id": "https://example.com/schema",
            "allOf": [
                {"$id": "dup.json"},
                {"$id": "dup.json"}
            ]
        });
        assert!(scan(&root(), &schema, Specification::Draft201909).is_err());
    }

    #[test]
    fn invalid_anchor_pattern_is_rejected() {
        let schema = json!({"$id": "https://example.com/schema", "$anchor": "1nope"});
        assert!(scan(&root(), &schema, Specification::Draft201909).is_err());
    }

    #[test]
    fn root_without_id_gets_synthetic_root_entry() {
        let schema = json!({"type": "object"});
        let index = scan(&root(), &schema, Specification::Draft7).unwrap();
        assert!(index.lookup(&root()).is_some());
    }
}

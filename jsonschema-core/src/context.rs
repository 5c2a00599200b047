//! Per-validate-call state (spec.md §4.6, §4.8, §5): the frame stack,
//! annotation/error buffers with their cycle-detection "seen" sets, the
//! pattern and URL caches, and `$ref`/`$recursiveRef` resolution.
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use fancy_regex::Regex;
use referencing::{ScanIndex, Specification, Uri};
use serde_json::Value;

use crate::{
    error::{Annotation, Locator, MalformedSchemaError, Outcome},
    meta_schemas,
    options::ValidationOptions,
    path::JsonPath,
};

/// One level of the recursive `apply()` call stack (§4.6.c).
#[derive(Debug, Clone)]
pub struct Frame {
    pub base: Uri,
    pub spec: Specification,
    pub abs_keyword: Uri,
    pub keyword_path: JsonPath,
    pub instance_path: JsonPath,
    pub is_root: bool,
    pub doc_key: String,
}

/// Outcome of resolving a `$ref`/`$recursiveRef` target: which document to
/// read from and which JSON Pointer tokens (from that document's root) lead
/// to the referenced node. `Context::navigate` turns this into a value.
#[derive(Debug, Clone)]
pub struct RefTarget {
    pub doc_key: String,
    pub tokens: Vec<String>,
    pub is_new_root: bool,
}

/// Fixed-capacity LRU used for externally fetched documents (§5: "URL
/// cache: LRU of at most 10 entries").
struct UrlCache {
    capacity: usize,
    order: Vec<String>,
}

impl UrlCache {
    fn new(capacity: usize) -> Self {
        UrlCache {
            capacity,
            order: Vec::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
    }

    /// Returns a key to evict, if the cache is over capacity after `touch`.
    fn evict_candidate(&mut self) -> Option<String> {
        if self.order.len() > self.capacity {
            Some(self.order.remove(0))
        } else {
            None
        }
    }
}

pub struct Context {
    options: ValidationOptions,
    documents: AHashMap<String, Arc<Value>>,
    indexes: AHashMap<String, ScanIndex>,
    pattern_cache: AHashMap<String, Arc<Regex>>,
    url_cache: UrlCache,
    frames: Vec<Frame>,
    recursive_anchors: Vec<Option<Uri>>,
    /// Scratch values visible only within the frame that set them, e.g. the
    /// property names `properties`/`patternProperties` matched, consulted
    /// by `additionalProperties` in the same frame (§4.7).
    locals: Vec<AHashMap<&'static str, Value>>,
    seen_annotations: AHashSet<(JsonPath, JsonPath, &'static str)>,
    seen_errors: AHashSet<(JsonPath, JsonPath)>,
    annotations: Vec<Annotation>,
    errors: Vec<Outcome>,
}

impl Context {
    /// Builds a fresh context with `root` registered as the initial
    /// document and frame (§3 lifecycle, §4.6 initial call).
    ///
    /// # Errors
    /// Propagates scanning failures from the root document (§4.4).
    pub fn new(
        options: ValidationOptions,
        root_uri: Uri,
        root_document: Arc<Value>,
        root_spec: Specification,
    ) -> Result<Context, MalformedSchemaError> {
        let index = referencing::scan(&root_uri, &root_document, root_spec)?;
        let doc_key = root_uri.as_str().to_string();
        let mut documents = AHashMap::new();
        documents.insert(doc_key.clone(), root_document);
        let mut indexes = AHashMap::new();
        indexes.insert(doc_key.clone(), index);
        let root_frame = Frame {
            base: root_uri.clone(),
            spec: root_spec,
            abs_keyword: root_uri,
            keyword_path: JsonPath::absolute(),
            instance_path: JsonPath::absolute(),
            is_root: true,
            doc_key,
        };
        Ok(Context {
            options,
            documents,
            indexes,
            pattern_cache: AHashMap::new(),
            url_cache: UrlCache::new(10),
            frames: vec![root_frame],
            recursive_anchors: vec![None],
            locals: vec![AHashMap::new()],
            seen_annotations: AHashSet::new(),
            seen_errors: AHashSet::new(),
            annotations: Vec::new(),
            errors: Vec::new(),
        })
    }

    #[must_use]
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    #[must_use]
    pub fn current_frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    pub fn push_frame(&mut self, frame: Frame, recursive_anchor: Option<Uri>) {
        self.frames.push(frame);
        self.recursive_anchors.push(recursive_anchor);
        self.locals.push(AHashMap::new());
    }

    pub fn pop_frame(&mut self) -> Frame {
        self.recursive_anchors.pop();
        self.locals.pop();
        self.frames.pop().expect("pop matches a prior push")
    }

    /// The base URI of the outermost frame that set `$recursiveAnchor`,
    /// used by `$recursiveRef` instead of the lexical base (§4.7).
    #[must_use]
    pub fn outermost_recursive_anchor(&self) -> Option<Uri> {
        self.recursive_anchors.iter().find_map(Clone::clone)
    }

    pub fn set_recursive_anchor(&mut self, base: Uri) {
        if let Some(slot) = self.recursive_anchors.last_mut() {
            *slot = Some(base);
        }
    }

    pub fn set_current_abs_keyword(&mut self, uri: Uri) {
        self.frames.last_mut().expect("frame stack is never empty").abs_keyword = uri;
    }

    pub fn set_current_base(&mut self, base: Uri) {
        self.frames.last_mut().expect("frame stack is never empty").base = base;
    }

    pub fn set_current_spec(&mut self, spec: Specification) {
        self.frames.last_mut().expect("frame stack is never empty").spec = spec;
    }

    /// Runs `f` with the current frame's document/base temporarily swapped,
    /// restoring both afterward regardless of how `f` mutated the stack in
    /// between — used by `$ref` to cross into a different document while
    /// leaving sibling keywords in the same object evaluated against the
    /// original base (§4.7, 2019-09's `$ref`-with-siblings rule).
    pub fn with_doc_context<R>(&mut self, doc_key: String, base: Uri, f: impl FnOnce(&mut Context) -> R) -> R {
        let frame = self.frames.last_mut().expect("frame stack is never empty");
        let original_doc_key = std::mem::replace(&mut frame.doc_key, doc_key);
        let original_base = std::mem::replace(&mut frame.base, base);
        let result = f(self);
        let frame = self.frames.last_mut().expect("frame stack is never empty");
        frame.doc_key = original_doc_key;
        frame.base = original_base;
        result
    }

    pub fn set_local(&mut self, name: &'static str, value: Value) {
        self.locals.last_mut().expect("frame stack is never empty").insert(name, value);
    }

    #[must_use]
    pub fn get_local(&self, name: &str) -> Option<&Value> {
        self.locals.last().and_then(|m| m.get(name))
    }

    #[must_use]
    pub fn document(&self, key: &str) -> Option<&Value> {
        self.documents.get(key).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn index(&self, key: &str) -> Option<&ScanIndex> {
        self.indexes.get(key)
    }

    /// Compiles and caches `source`, matching the unbounded pattern cache
    /// in §5.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError::InvalidKeywordValue`] if `source` is
    /// not a valid regular expression.
    pub fn compiled_pattern(&mut self, source: &str) -> Result<Arc<Regex>, MalformedSchemaError> {
        if let Some(compiled) = self.pattern_cache.get(source) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(Regex::new(source).map_err(|err| {
            MalformedSchemaError::invalid_keyword_value(
                &self.current_frame().abs_keyword,
                "pattern",
                format!("is not a valid regular expression: {err}"),
            )
        })?);
        self.pattern_cache.insert(source.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Records `annotation`, enforcing the `(instance, keyword, name)`
    /// uniqueness cycle-detection rule (§4.6 "Annotations"). Always stored
    /// internally regardless of `COLLECT_ANNOTATIONS` — `unevaluatedItems`/
    /// `unevaluatedProperties` and cycle detection both depend on the full
    /// history being present; the option only gates what the façade
    /// surfaces back to the caller.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError::CyclicReference`] if the same triple
    /// was already recorded.
    pub fn record_annotation(&mut self, annotation: Annotation) -> Result<(), MalformedSchemaError> {
        let key = (
            annotation.loc.instance.clone(),
            annotation.loc.keyword.clone(),
            annotation.name,
        );
        if !self.seen_annotations.insert(key) {
            return Err(MalformedSchemaError::cyclic_reference(&self.current_frame().abs_keyword));
        }
        self.annotations.push(annotation);
        Ok(())
    }

    /// Records `outcome`, enforcing the `(instance, keyword)` uniqueness
    /// cycle-detection rule (§4.6 "Errors"). Always stored internally; see
    /// [`Context::record_annotation`] for why the option doesn't gate this.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError::CyclicReference`] if the same pair
    /// was already recorded.
    pub fn record_error(&mut self, outcome: Outcome) -> Result<(), MalformedSchemaError> {
        let key = (outcome.loc.instance.clone(), outcome.loc.keyword.clone());
        if !self.seen_errors.insert(key) {
            return Err(MalformedSchemaError::cyclic_reference(&self.current_frame().abs_keyword));
        }
        self.errors.push(outcome);
        Ok(())
    }

    /// Removes (or, with `COLLECT_ANNOTATIONS_FOR_FAILED`, marks invalid)
    /// annotations at `instance_path` whose keyword path starts with
    /// `keyword_path`, per §4.6.g ("result is false and annotation
    /// collection is enabled").
    pub fn prune_annotations(&mut self, instance_path: &JsonPath, keyword_path: &JsonPath) {
        if self.options.collect_annotations_for_failed() {
            for a in &mut self.annotations {
                if &a.loc.instance == instance_path && a.loc.keyword.starts_with(keyword_path) {
                    a.valid = false;
                }
            }
        } else {
            self.annotations
                .retain(|a| !(&a.loc.instance == instance_path && a.loc.keyword.starts_with(keyword_path)));
        }
    }

    /// Marks errors under `instance_path`/`keyword_path` as pruned rather
    /// than removing them, per §4.6.g ("result is true and error collection
    /// is enabled").
    pub fn mark_errors_pruned(&mut self, instance_path: &JsonPath, keyword_path: &JsonPath) {
        for outcome in &mut self.errors {
            if outcome.loc.instance.starts_with(instance_path) && outcome.loc.keyword.starts_with(keyword_path) {
                outcome.pruned = true;
            }
        }
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn errors(&self) -> &[Outcome] {
        &self.errors
    }

    /// Annotations recorded at exactly `instance_path`, for a keyword whose
    /// name matches `name` — the lookup `additionalProperties` and peers use
    /// to read what `properties`/`patternProperties` already matched.
    #[must_use]
    pub fn annotations_named<'a>(&'a self, instance_path: &'a JsonPath, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.annotations
            .iter()
            .filter(move |a| a.valid && &a.loc.instance == instance_path && a.name == name)
            .map(|a| &a.value)
    }

    /// Registers every document pre-supplied via `ValidationOptions::with_document`
    /// so `$ref` can resolve them without a retriever round trip.
    ///
    /// # Errors
    /// Propagates scanning failures (§4.4) from any pre-supplied document.
    pub fn preload_configured_documents(&mut self) -> Result<(), MalformedSchemaError> {
        let root_spec = self.current_frame().spec;
        let documents: Vec<(String, Value)> = self.options.documents().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (key, document) in documents {
            self.register_document(key, Arc::new(document), root_spec)?;
        }
        Ok(())
    }

    fn register_document(&mut self, key: String, document: Arc<Value>, spec_hint: Specification) -> Result<(), MalformedSchemaError> {
        if self.documents.contains_key(&key) {
            return Ok(());
        }
        let root_uri = Uri::parse(&key).map_err(MalformedSchemaError::from)?;
        let spec = self.options.resolve_specification(&document).unwrap_or(spec_hint);
        let index = referencing::scan(&root_uri, &document, spec)?;
        self.indexes.insert(key.clone(), index);
        self.documents.insert(key, document);
        Ok(())
    }

    /// Implements `findAndSetRoot` (§4.8): resolves `reference` against the
    /// current frame's base, locates the owning document (already known,
    /// externally retrieved, or a built-in meta-schema), and returns
    /// enough information for [`Context::navigate`] to fetch the node.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError::RefNotFound`] if no known document,
    /// retriever, or built-in meta-schema can supply the target.
    pub fn resolve_ref(&mut self, reference: &str) -> Result<RefTarget, MalformedSchemaError> {
        let current = self.current_frame().clone();
        let absolute = current
            .base
            .resolve(reference)
            .map_err(|_| MalformedSchemaError::ref_not_found(&current.abs_keyword, reference))?;
        let stripped = absolute.strip_fragment();

        let doc_key = if self.documents.contains_key(stripped.as_str()) {
            stripped.as_str().to_string()
        } else if let Some(key) = self.find_owning_document(&stripped) {
            key
        } else if let Ok(fetched) = self.options.retriever().retrieve(&stripped) {
            self.register_document(stripped.as_str().to_string(), Arc::new(fetched), current.spec)?;
            self.url_cache.touch(stripped.as_str());
            if let Some(evicted) = self.url_cache.evict_candidate() {
                self.documents.remove(&evicted);
                self.indexes.remove(&evicted);
            }
            stripped.as_str().to_string()
        } else if let Some(meta) = meta_schemas::lookup(stripped.as_str()) {
            self.register_document(stripped.as_str().to_string(), Arc::new(meta.clone()), current.spec)?;
            stripped.as_str().to_string()
        } else {
            return Err(MalformedSchemaError::ref_not_found(&current.abs_keyword, reference));
        };

        let tokens = if let Some(id) = self.indexes.get(&doc_key).and_then(|idx| idx.lookup(&absolute)) {
            id.pointer_from_root.clone()
        } else {
            match absolute.decoded_fragment() {
                None => Vec::new(),
                Some(fragment) if fragment.is_empty() || fragment.starts_with('/') => {
                    crate::path::JsonPath::from_json_pointer(&fragment).tokens().to_vec()
                }
                Some(_) => {
                    return Err(MalformedSchemaError::ref_not_found(&current.abs_keyword, reference));
                }
            }
        };

        Ok(RefTarget {
            is_new_root: doc_key != current.doc_key,
            doc_key,
            tokens,
        })
    }

    /// Step 2 of §4.8: exact match against a registered `$id`/`$anchor`
    /// first, then a best-effort walk back up `stripped`'s path against
    /// already-known document keys.
    fn find_owning_document(&self, stripped: &Uri) -> Option<String> {
        if let Some(id) = self.indexes.values().find_map(|idx| idx.lookup(stripped)) {
            return Some(id.root_uri.as_str().to_string());
        }
        let mut candidate = stripped.as_str().to_string();
        while let Some(pos) = candidate.rfind('/') {
            candidate.truncate(pos);
            if self.documents.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Navigates to the node named by `target`, re-establishing the base
    /// URI at every `$id`-bearing node crossed, per §4.8's `followPointer`.
    ///
    /// # Errors
    /// Returns [`MalformedSchemaError::RefNotFound`] if the document is
    /// missing or the pointer does not resolve within it.
    pub fn navigate(&self, target: &RefTarget) -> Result<(Uri, &Value), MalformedSchemaError> {
        let document = self
            .documents
            .get(&target.doc_key)
            .ok_or_else(|| MalformedSchemaError::ref_not_found(&self.current_frame().abs_keyword, &target.doc_key))?;
        let root_base = Uri::parse(&target.doc_key).map_err(MalformedSchemaError::from)?;
        navigate_with_base(document, &root_base, &target.tokens)
            .ok_or_else(|| MalformedSchemaError::ref_not_found(&self.current_frame().abs_keyword, &target.doc_key))
    }
}

fn rebase_on_id(base: &Uri, object: &serde_json::Map<String, Value>) -> Uri {
    match object.get("$id").and_then(Value::as_str) {
        Some(id) => match base.resolve(id) {
            Ok(resolved) if !resolved.has_non_empty_fragment() => resolved,
            _ => base.clone(),
        },
        None => base.clone(),
    }
}

fn navigate_with_base<'v>(root: &'v Value, root_base: &Uri, tokens: &[String]) -> Option<(Uri, &'v Value)> {
    let mut current = root;
    let mut base = root_base.clone();
    if let Value::Object(map) = current {
        base = rebase_on_id(&base, map);
    }
    for token in tokens {
        current = match current {
            Value::Object(map) => map.get(token)?,
            Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if let Value::Object(map) = current {
            base = rebase_on_id(&base, map);
        }
    }
    Some((base, current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(document: Value) -> Context {
        let uri = crate::options::default_root_uri();
        Context::new(ValidationOptions::new(), uri, Arc::new(document), Specification::Draft201909).unwrap()
    }

    #[test]
    fn resolves_same_document_pointer_ref() {
        let mut context = ctx(json!({"$defs": {"foo": {"type": "string"}}}));
        let target = context.resolve_ref("#/$defs/foo").unwrap();
        let (_, value) = context.navigate(&target).unwrap();
        assert_eq!(value, &json!({"type": "string"}));
    }

    #[test]
    fn resolves_nested_id_ref() {
        let mut context = ctx(json!({
            "$id": "https://example.com/root",
            "$defs": {"foo": {"$id": "https://example.com/foo", "type": "string"}}
        }));
        let target = context.resolve_ref("https://example.com/foo").unwrap();
        let (base, value) = context.navigate(&target).unwrap();
        assert_eq!(value, &json!({"$id": "https://example.com/foo", "type": "string"}));
        assert_eq!(base.as_str(), "https://example.com/foo");
    }

    #[test]
    fn unresolvable_ref_is_an_error() {
        let mut context = ctx(json!({"type": "object"}));
        assert!(context.resolve_ref("#/nope").is_err());
    }

    #[test]
    fn prune_annotations_marks_invalid_instead_of_removing_when_configured() {
        let mut options = ValidationOptions::new();
        options.with_collect_annotations(true);
        options.with_collect_annotations_for_failed(true);
        let mut context = Context::new(options, crate::options::default_root_uri(), Arc::new(json!(true)), Specification::Draft201909).unwrap();
        let instance_path = JsonPath::absolute();
        let keyword_path = JsonPath::absolute().append("properties");
        context
            .record_annotation(Annotation {
                name: "properties",
                loc: Locator {
                    instance: instance_path.clone(),
                    keyword: keyword_path.append("a"),
                    abs_keyword: "json-schema:///#/properties/a".to_string(),
                },
                value: json!("a"),
                valid: true,
            })
            .unwrap();
        context.prune_annotations(&instance_path, &JsonPath::absolute().append("properties"));
        assert_eq!(context.annotations().len(), 1);
        assert!(!context.annotations()[0].valid);
    }

    #[test]
    fn duplicate_annotation_triple_is_cyclic() {
        let mut options = ValidationOptions::new();
        options.with_collect_annotations(true);
        let mut context = Context::new(
            options,
            crate::options::default_root_uri(),
            Arc::new(json!(true)),
            Specification::Draft201909,
        )
        .unwrap();
        let loc = Locator {
            instance: JsonPath::absolute(),
            keyword: JsonPath::absolute().append("type"),
            abs_keyword: "json-schema:///#/type".to_string(),
        };
        let annotation = Annotation {
            name: "type",
            loc: loc.clone(),
            value: json!("string"),
            valid: true,
        };
        context.record_annotation(annotation.clone()).unwrap();
        assert!(context.record_annotation(annotation).is_err());
    }
}

//! The `format` keyword's pluggable predicate table (spec.md §6): the
//! core crate does not bundle any format checks, it only knows how to look
//! a name up and call whatever was registered.
use std::sync::Arc;

use ahash::AHashMap;

/// A single format check: `name × string → bool`.
pub trait Format: Send + Sync + 'static {
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> Format for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    #[inline]
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

/// Name → check table consulted by the `format` keyword when format
/// assertion is enabled. Unknown names are treated as passing, matching
/// the "external predicate table" contract in spec.md §6.
#[derive(Default, Clone)]
pub struct FormatRegistry {
    formats: AHashMap<String, Arc<dyn Format>>,
}

impl FormatRegistry {
    #[must_use]
    pub fn new() -> Self {
        FormatRegistry::default()
    }

    pub fn register(&mut self, name: impl Into<String>, check: impl Format) -> &mut Self {
        self.formats.insert(name.into(), Arc::new(check));
        self
    }

    /// `None` means the name is not registered at all, which the caller
    /// should treat as passing per spec.md §6.
    #[must_use]
    pub fn check(&self, name: &str, value: &str) -> Option<bool> {
        self.formats.get(name).map(|check| check.is_valid(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_format_returns_none() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.check("email", "whatever"), None);
    }

    #[test]
    fn registered_closure_is_consulted() {
        let mut registry = FormatRegistry::new();
        registry.register("even-length", |s: &str| s.len() % 2 == 0);
        assert_eq!(registry.check("even-length", "ab"), Some(true));
        assert_eq!(registry.check("even-length", "abc"), Some(false));
    }
}

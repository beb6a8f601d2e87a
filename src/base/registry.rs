//! Explicit engine registry.
//!
//! Client and server builders take a registry of engine factories by
//! value instead of consulting a global discovery list; which engines are
//! available is decided at construction time by the caller.

use crate::base::error::PipeError;

/// An ordered, name-keyed registry of engine factories.
///
/// `T` is whatever factory shape the builder consumes (typically an
/// `Arc<dyn Fn(...) -> Engine>` or a concrete config struct). Entries keep
/// registration order so "first registered" is a meaningful default.
pub struct EngineRegistry<T> {
    entries: Vec<(String, T)>,
}

impl<T> EngineRegistry<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a factory under `name`.
    ///
    /// Registering the same name twice is a configuration error.
    pub fn register(&mut self, name: impl Into<String>, factory: T) -> Result<(), PipeError> {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(PipeError::DuplicateEngine(name));
        }
        self.entries.push((name, factory));
        Ok(())
    }

    /// Look up a factory by name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// The first registered factory, used as the default engine.
    pub fn default_engine(&self) -> Option<&T> {
        self.entries.first().map(|(_, f)| f)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T> Default for EngineRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

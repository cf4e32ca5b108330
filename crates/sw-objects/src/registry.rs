//! Factory registry keyed by `ObjectCode` (spec §9: a `Registry` instead of
//! reflection-driven dynamic dispatch over subclasses).

use std::collections::HashMap;

use crate::object::DataObject;

type Factory = Box<dyn Fn() -> Box<dyn DataObject> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    factories: HashMap<&'static str, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a factory for `code`. A later call for the same code
    /// replaces the earlier one, matching the teacher's "last registration
    /// wins" posture for pluggable handlers.
    pub fn register<F>(&mut self, code: &'static str, factory: F)
    where
        F: Fn() -> Box<dyn DataObject> + Send + Sync + 'static,
    {
        self.factories.insert(code, Box::new(factory));
    }

    pub fn create(&self, code: &str) -> Option<Box<dyn DataObject>> {
        self.factories.get(code).map(|f| f())
    }

    pub fn is_registered(&self, code: &str) -> bool {
        self.factories.contains_key(code)
    }
}

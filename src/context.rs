//! Evaluation context shared by one operation batch.
//!
//! Populated by `load_into_context` before any expression is evaluated, then
//! consulted read-only by `update`. The bare variable name is first-writer
//! wins so batched pre-loads never clobber each other; the private cache key
//! of each operand is always refreshed by its own handler.

use std::collections::HashMap;

use serde_json::Value;

use crate::model::Container;

#[derive(Debug, Clone)]
pub struct EvaluationContext {
    container: Container,
    process_definition_id: Option<i64>,
    values: HashMap<String, Value>,
}

impl EvaluationContext {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            process_definition_id: None,
            values: HashMap::new(),
        }
    }

    pub fn with_process_definition(mut self, process_definition_id: i64) -> Self {
        self.process_definition_id = Some(process_definition_id);
        self
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn process_definition_id(&self) -> Option<i64> {
        self.process_definition_id
    }

    /// Insert under `name` only when nothing is loaded there yet. Returns
    /// whether the value was inserted.
    pub fn insert_if_absent(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    /// Insert unconditionally; used for private cache keys.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All entries, for handing the batch to the expression evaluator.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }
}

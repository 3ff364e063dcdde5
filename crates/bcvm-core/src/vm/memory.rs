//! VM Memory Model
//!
//! A single flat, name-keyed variable environment shared by the whole
//! program. There are no frames and no scoping.

use std::collections::HashMap;

use crate::error::RuntimeError;
use super::value::Value;

/// Variable environment
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a variable. Lists come back as aliases of the stored list.
    pub fn load(&self, name: &str) -> Result<Value, RuntimeError> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    /// Create or overwrite a variable
    pub fn store(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Number of defined variables
    pub fn count(&self) -> usize {
        self.vars.len()
    }
}

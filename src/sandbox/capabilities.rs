/*!
 * Capability Context
 * Exact set of host bindings injected into one unit execution
 */

use super::script::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Bindings a unit runs against
///
/// `bindings` become the unit's global scope. `require` and the unit's own
/// `fileName` are bound in the unit scope alongside a fresh `exports` object.
#[derive(Debug, Clone)]
pub struct CapabilityContext {
    bindings: BTreeMap<String, Value>,
    require: Value,
    file_name: PathBuf,
}

impl CapabilityContext {
    pub fn new(require: Value, file_name: impl Into<PathBuf>) -> Self {
        Self {
            bindings: BTreeMap::new(),
            require,
            file_name: file_name.into(),
        }
    }

    /// Add or replace a global binding
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.bindings.insert(name.into(), value);
        self
    }

    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn require(&self) -> &Value {
        &self.require
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn into_parts(self) -> (BTreeMap<String, Value>, Value, PathBuf) {
        (self.bindings, self.require, self.file_name)
    }
}

//! String-keyed value heap
//!
//! Backs both the machine-global heap and each frame's locals. Loads of
//! unbound keys fail explicitly; the load instructions that want
//! missing-key-as-null semantics mask the failure themselves.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::{Restorable, VmError, VmResult};

/// A mapping from string keys to values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Heap {
    entries: FxHashMap<String, Value>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Heap::default()
    }

    /// Borrow the value bound to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NotFound`] if the key has no binding.
    pub fn load(&self, key: &str) -> VmResult<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| VmError::NotFound(key.to_string()))
    }

    /// Bind `key` to `value`, replacing any prior binding.
    pub fn store(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Drop all bindings.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the heap holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Restorable for Heap {
    fn dump(&self) -> VmResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn restore(&mut self, data: &[u8]) -> VmResult<()> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }
}

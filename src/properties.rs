//! A typed string-keyed property bag used for synthesis settings and statistics.
//!
//! Modeled on the original engine's `Properties` class: a `map<string, any>`
//! with a generic typed getter/setter rather than a fixed struct, so the
//! driver and its callers can exchange both the two documented settings keys
//! and the one documented statistics key through the same contract.

use std::any::Any;

use rustc_hash::FxHashMap;

/// Settings key: overrides entry-module resolution.
pub const MAIN_MODULE_IDENTIFIER: &str = "main_module_identifier";
/// Settings key: enables per-qubit call-stack provenance tracking.
pub const GENERATE_INLINE_DEBUG_INFORMATION: &str = "generate_inline_debug_information";
/// Statistics key: wall-clock milliseconds of the synthesis run.
pub const RUNTIME: &str = "runtime";

#[derive(Default)]
pub struct Properties {
    values: FxHashMap<String, Box<dyn Any>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn get<T: 'static + Clone>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    pub fn get_or<T: 'static + Clone>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Properties")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

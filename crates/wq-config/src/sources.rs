//! `ConfigSource` implementations composed by `ConfigResolver`.

use std::collections::HashMap;

use wq_core::ConfigSource;

/// Reads `scoped_key` uppercased, straight from the process environment.
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn lookup(&self, scoped_key: &str) -> Option<String> {
        std::env::var(scoped_key.to_uppercase()).ok()
    }
}

/// A flat in-memory table, for static defaults or test fixtures. Keys are
/// matched case-sensitively, as supplied.
pub struct StaticConfigSource {
    values: HashMap<String, String>,
}

impl StaticConfigSource {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Parses a flat `{"key": "value"}` JSON object into a static source.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let values: HashMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self::new(values))
    }
}

impl ConfigSource for StaticConfigSource {
    fn lookup(&self, scoped_key: &str) -> Option<String> {
        self.values.get(scoped_key).cloned()
    }
}

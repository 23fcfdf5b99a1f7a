//! In-memory storage backend for tests and dry runs.

use std::collections::BTreeMap;

use super::StorageBackend;
use crate::error::StoreError;

/// Volatile backend. Lives and dies with the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    namespaces: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

impl StorageBackend for MemoryBackend {
    fn read_all(&self, namespace: &str) -> Result<BTreeMap<String, toml::Value>, StoreError> {
        Ok(self
            .namespaces
            .get(namespace)
            .cloned()
            .unwrap_or_default())
    }

    fn write(&mut self, namespace: &str, id: &str, value: toml::Value) -> Result<(), StoreError> {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, namespace: &str, id: &str) -> Result<(), StoreError> {
        if let Some(records) = self.namespaces.get_mut(namespace) {
            records.remove(id);
        }
        Ok(())
    }
}

//! TOML file storage backend.
//!
//! Each namespace is one TOML document under the data directory
//! (`~/.config/happyday/<namespace>.toml`). The whole document is
//! rewritten on every mutation via a temp-file rename, so a record write
//! either fully lands or not at all.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::warn;

use super::StorageBackend;
use crate::error::StoreError;

/// Returns `~/.config/happyday[-dev]/` based on HAPPYDAY_ENV.
///
/// Set HAPPYDAY_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HAPPYDAY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("happyday-dev")
    } else {
        base_dir.join("happyday")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// File-backed storage rooted at a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open the backend at the default data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self { dir: data_dir()? })
    }

    /// Open the backend at a custom directory.
    pub fn open_at(dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
        Ok(Self { dir })
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.toml"))
    }

    fn load(&self, namespace: &str) -> Result<BTreeMap<String, toml::Value>, StoreError> {
        let path = self.namespace_path(namespace);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content =
            std::fs::read_to_string(&path).map_err(|source| StoreError::ReadFailed {
                path: path.clone(),
                source,
            })?;
        match content.parse::<toml::Table>() {
            Ok(table) => Ok(table.into_iter().collect()),
            Err(e) => {
                // An unreadable document is treated like an empty one; the
                // next write replaces it.
                warn!(path = %path.display(), error = %e, "namespace file is corrupt, ignoring");
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(
        &self,
        namespace: &str,
        records: BTreeMap<String, toml::Value>,
    ) -> Result<(), StoreError> {
        let path = self.namespace_path(namespace);
        let table: toml::Table = records.into_iter().collect();
        let content = toml::to_string_pretty(&table).map_err(|e| StoreError::EncodeFailed {
            id: namespace.to_string(),
            message: e.to_string(),
        })?;

        // Write-then-rename keeps the document whole under a crash.
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|source| StoreError::WriteFailed {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::WriteFailed { path, source })
    }
}

impl StorageBackend for FileBackend {
    fn read_all(&self, namespace: &str) -> Result<BTreeMap<String, toml::Value>, StoreError> {
        self.load(namespace)
    }

    fn write(&mut self, namespace: &str, id: &str, value: toml::Value) -> Result<(), StoreError> {
        let mut records = self.load(namespace)?;
        records.insert(id.to_string(), value);
        self.save(namespace, records)
    }

    fn delete(&mut self, namespace: &str, id: &str) -> Result<(), StoreError> {
        let mut records = self.load(namespace)?;
        if records.remove(id).is_some() {
            self.save(namespace, records)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{Recurrence, Reminder, ReminderKind};
    use crate::store::{ReminderStore, REMINDERS_NAMESPACE};
    use chrono::Utc;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let kind = ReminderKind::Journal;
        let reminder = Reminder::new(
            kind.clone(),
            kind.default_time_of_day(),
            Recurrence::Daily,
            Utc::now(),
        );

        {
            let backend = FileBackend::open_at(dir.path().to_path_buf()).unwrap();
            let mut store = ReminderStore::new(backend);
            store.put(&reminder).unwrap();
        }

        let backend = FileBackend::open_at(dir.path().to_path_buf()).unwrap();
        let store = ReminderStore::new(backend);
        assert_eq!(store.get("journal").unwrap(), Some(reminder));
    }

    #[test]
    fn corrupt_document_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.toml");
        std::fs::write(&path, "this is { not toml").unwrap();

        let backend = FileBackend::open_at(dir.path().to_path_buf()).unwrap();
        assert!(backend.read_all(REMINDERS_NAMESPACE).unwrap().is_empty());
    }

    #[test]
    fn delete_of_missing_record_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::open_at(dir.path().to_path_buf()).unwrap();
        backend.delete(REMINDERS_NAMESPACE, "journal").unwrap();
        assert!(!dir.path().join("reminders.toml").exists());
    }
}

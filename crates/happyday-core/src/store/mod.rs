//! Durable reminder storage.
//!
//! [`ReminderStore`] is the single source of truth for reminder
//! definitions. It sits on top of a [`StorageBackend`], a narrow
//! key-value boundary (read all, write one, delete one, per namespace)
//! that is assumed synchronous and crash-consistent.
//!
//! Records are held as raw TOML values until typed deserialization, so a
//! single corrupt record is dropped with a warning instead of poisoning
//! the whole namespace.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::StoreError;
use crate::reminder::Reminder;

/// Namespace under which reminder records live.
pub const REMINDERS_NAMESPACE: &str = "reminders";

/// Persistence boundary. A write either fully lands or not at all.
pub trait StorageBackend: Send {
    /// All records in a namespace, keyed by id. Missing namespace is empty.
    fn read_all(&self, namespace: &str) -> Result<BTreeMap<String, toml::Value>, StoreError>;

    /// Upsert one record.
    fn write(&mut self, namespace: &str, id: &str, value: toml::Value) -> Result<(), StoreError>;

    /// Remove one record. Removing a missing record is not an error.
    fn delete(&mut self, namespace: &str, id: &str) -> Result<(), StoreError>;
}

/// A record that failed schema validation on read.
#[derive(Debug, Clone)]
pub struct DroppedRecord {
    pub id: String,
    pub reason: String,
}

/// Everything currently persisted, split into valid and corrupt records.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub reminders: Vec<Reminder>,
    pub dropped: Vec<DroppedRecord>,
}

/// Durable map of reminder definitions.
///
/// All mutation goes through `put`/`remove` in a read-modify-write
/// discipline; the timer engine's handle map is a derived cache that is
/// reconciled from this store after a restart.
pub struct ReminderStore<B> {
    backend: B,
}

impl<B: StorageBackend> ReminderStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Look up one reminder. Corrupt records read as absent.
    pub fn get(&self, id: &str) -> Result<Option<Reminder>, StoreError> {
        let records = self.backend.read_all(REMINDERS_NAMESPACE)?;
        let Some(value) = records.get(id) else {
            return Ok(None);
        };
        match decode(id, value.clone()) {
            Ok(reminder) => Ok(Some(reminder)),
            Err(reason) => {
                warn!(id, %reason, "dropping corrupt reminder record");
                Ok(None)
            }
        }
    }

    /// Upsert a reminder under its kind slug.
    pub fn put(&mut self, reminder: &Reminder) -> Result<(), StoreError> {
        let id = reminder.id().to_string();
        let value = toml::Value::try_from(reminder).map_err(|e| StoreError::EncodeFailed {
            id: id.clone(),
            message: e.to_string(),
        })?;
        self.backend.write(REMINDERS_NAMESPACE, &id, value)
    }

    /// Remove a reminder. Idempotent.
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        self.backend.delete(REMINDERS_NAMESPACE, id)
    }

    /// All enabled reminders that pass schema validation.
    pub fn list_enabled(&self) -> Result<Vec<Reminder>, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .reminders
            .into_iter()
            .filter(|r| r.enabled)
            .collect())
    }

    /// Full validated view of the namespace, corrupt records included.
    /// Used by recovery so it can report and purge what it dropped.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let records = self.backend.read_all(REMINDERS_NAMESPACE)?;
        let mut snapshot = StoreSnapshot::default();
        for (id, value) in records {
            match decode(&id, value) {
                Ok(reminder) => snapshot.reminders.push(reminder),
                Err(reason) => {
                    warn!(%id, %reason, "dropping corrupt reminder record");
                    snapshot.dropped.push(DroppedRecord { id, reason });
                }
            }
        }
        Ok(snapshot)
    }
}

fn decode(id: &str, value: toml::Value) -> Result<Reminder, String> {
    let reminder: Reminder = value.try_into().map_err(|e| e.to_string())?;
    if reminder.id() != id {
        return Err(format!(
            "record key '{}' does not match kind slug '{}'",
            id,
            reminder.id()
        ));
    }
    Ok(reminder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{Recurrence, ReminderKind};
    use chrono::Utc;

    fn reminder(kind: ReminderKind) -> Reminder {
        let time = kind.default_time_of_day();
        Reminder::new(kind, time, Recurrence::Daily, Utc::now())
    }

    #[test]
    fn put_get_remove_roundtrip() {
        let mut store = ReminderStore::new(MemoryBackend::default());
        let r = reminder(ReminderKind::Journal);

        store.put(&r).unwrap();
        assert_eq!(store.get("journal").unwrap(), Some(r.clone()));

        store.remove("journal").unwrap();
        assert_eq!(store.get("journal").unwrap(), None);
        // Idempotent.
        store.remove("journal").unwrap();
    }

    #[test]
    fn list_enabled_skips_disabled() {
        let mut store = ReminderStore::new(MemoryBackend::default());
        let mut off = reminder(ReminderKind::Meditation);
        off.enabled = false;
        store.put(&reminder(ReminderKind::Journal)).unwrap();
        store.put(&off).unwrap();

        let enabled = store.list_enabled().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].kind, ReminderKind::Journal);
    }

    #[test]
    fn corrupt_record_is_dropped_not_fatal() {
        let mut backend = MemoryBackend::default();
        backend
            .write(
                REMINDERS_NAMESPACE,
                "journal",
                toml::Value::String("garbage".to_string()),
            )
            .unwrap();
        let mut store = ReminderStore::new(backend);
        store.put(&reminder(ReminderKind::Watering)).unwrap();

        assert_eq!(store.get("journal").unwrap(), None);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.reminders.len(), 1);
        assert_eq!(snapshot.dropped.len(), 1);
        assert_eq!(snapshot.dropped[0].id, "journal");
    }

    #[test]
    fn mismatched_key_is_treated_as_corrupt() {
        let mut store = ReminderStore::new(MemoryBackend::default());
        store.put(&reminder(ReminderKind::Journal)).unwrap();
        // Re-file the journal record under the wrong key.
        let value = store
            .backend
            .read_all(REMINDERS_NAMESPACE)
            .unwrap()
            .remove("journal")
            .unwrap();
        store
            .backend
            .write(REMINDERS_NAMESPACE, "meditation", value)
            .unwrap();

        assert_eq!(store.get("meditation").unwrap(), None);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.dropped.len(), 1);
    }
}

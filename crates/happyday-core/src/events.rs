use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every observable scheduler state change produces an Event.
/// The GUI layer polls for these; the CLI prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A timer was armed (or re-armed) for a reminder.
    ReminderArmed {
        id: String,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// A reminder's fire window was reached. `delivered` is false when
    /// permission was denied or the platform sink failed; the recurrence
    /// bookkeeping completes either way.
    ReminderFired {
        id: String,
        delivered: bool,
        at: DateTime<Utc>,
    },
    /// A reminder was disabled or removed; no timer remains for it.
    ReminderCleared {
        id: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Reminder id the event concerns.
    pub fn id(&self) -> &str {
        match self {
            Event::ReminderArmed { id, .. }
            | Event::ReminderFired { id, .. }
            | Event::ReminderCleared { id, .. } => id,
        }
    }
}

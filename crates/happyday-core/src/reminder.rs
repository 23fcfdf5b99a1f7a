//! Reminder data model.
//!
//! A [`Reminder`] is the sole persistent entity of the scheduler. Its id is
//! the stable slug of its [`ReminderKind`], so there is at most one reminder
//! per kind. `time_of_day` is wall-clock and timezone-naive; it is resolved
//! against the local timezone at scheduling time, not at creation time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Category of a reminder. Drives the default notification content and
/// the stable id used as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReminderKind {
    Journal,
    Meditation,
    Watering,
    /// Free-form category; the slug doubles as the id.
    Custom(String),
}

impl ReminderKind {
    /// Stable identifier, used as the storage key.
    pub fn slug(&self) -> &str {
        match self {
            ReminderKind::Journal => "journal",
            ReminderKind::Meditation => "meditation",
            ReminderKind::Watering => "watering",
            ReminderKind::Custom(slug) => slug,
        }
    }

    /// Parse a slug. Unknown slugs become `Custom` after validation.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "journal" => Ok(ReminderKind::Journal),
            "meditation" => Ok(ReminderKind::Meditation),
            "watering" => Ok(ReminderKind::Watering),
            slug => {
                if slug.is_empty() {
                    return Err(ValidationError::InvalidKind {
                        input: input.to_string(),
                        message: "slug must not be empty".to_string(),
                    });
                }
                if slug.len() > 64 {
                    return Err(ValidationError::InvalidKind {
                        input: input.to_string(),
                        message: "slug must be at most 64 characters".to_string(),
                    });
                }
                if !slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
                {
                    return Err(ValidationError::InvalidKind {
                        input: input.to_string(),
                        message: "slug may only contain a-z, 0-9, '-' and '_'".to_string(),
                    });
                }
                Ok(ReminderKind::Custom(slug.to_string()))
            }
        }
    }

    /// Default wall-clock time for this kind, matching the app's
    /// settings defaults (journal in the evening, meditation in the
    /// morning, watering at dusk).
    pub fn default_time_of_day(&self) -> TimeOfDay {
        match self {
            ReminderKind::Journal => TimeOfDay { hour: 20, minute: 0 },
            ReminderKind::Meditation => TimeOfDay { hour: 9, minute: 0 },
            ReminderKind::Watering => TimeOfDay { hour: 18, minute: 0 },
            ReminderKind::Custom(_) => TimeOfDay { hour: 12, minute: 0 },
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl TryFrom<String> for ReminderKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ReminderKind::parse(&value)
    }
}

impl From<ReminderKind> for String {
    fn from(kind: ReminderKind) -> Self {
        kind.slug().to_string()
    }
}

/// Wall-clock time of day, timezone-naive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTimeOfDay {
                input: format!("{hour:02}:{minute:02}"),
            });
        }
        Ok(Self { hour, minute })
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeOfDay {
            input: s.to_string(),
        };
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Whether a reminder repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// Fires once, then the reminder is removed.
    Once,
    /// Re-armed for the next day after every fire.
    #[default]
    Daily,
}

/// Notification content template plus an opaque click target.
///
/// `route` is resolved by the UI layer; the scheduler never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub route: String,
}

impl ReminderPayload {
    /// Built-in content per kind.
    pub fn default_for(kind: &ReminderKind) -> Self {
        match kind {
            ReminderKind::Journal => Self {
                title: "📝 Journal reminder".to_string(),
                body: "Time to write today's journal entry!".to_string(),
                tag: "reminder-journal".to_string(),
                route: "/journal".to_string(),
            },
            ReminderKind::Meditation => Self {
                title: "🧘 Meditation reminder".to_string(),
                body: "Take a moment to breathe and settle your mind.".to_string(),
                tag: "reminder-meditation".to_string(),
                route: "/meditation".to_string(),
            },
            ReminderKind::Watering => Self {
                title: "🌱 Watering reminder".to_string(),
                body: "Don't forget to water your garden!".to_string(),
                tag: "reminder-watering".to_string(),
                route: "/garden".to_string(),
            },
            ReminderKind::Custom(slug) => Self {
                title: "🔔 Reminder".to_string(),
                body: "You have a scheduled reminder.".to_string(),
                tag: format!("reminder-{slug}"),
                route: "/dashboard".to_string(),
            },
        }
    }
}

/// Lifecycle state of a reminder id within the timer engine.
///
/// `Scheduled` is the only state with a live timer entry. Daily reminders
/// cycle `Scheduled -> Fired -> Scheduled`; one-shot reminders end in
/// `Disabled` after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderState {
    Disabled,
    Scheduled,
    Fired,
}

/// A persisted reminder definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub time_of_day: TimeOfDay,
    pub enabled: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Absolute target instant; strictly in the future while live.
    pub next_fire_at: DateTime<Utc>,
    /// Content override. `None` falls back to the kind's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ReminderPayload>,
}

impl Reminder {
    pub fn new(
        kind: ReminderKind,
        time_of_day: TimeOfDay,
        recurrence: Recurrence,
        next_fire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            time_of_day,
            enabled: true,
            recurrence,
            next_fire_at,
            payload: None,
        }
    }

    /// Storage key.
    pub fn id(&self) -> &str {
        self.kind.slug()
    }

    /// Stored payload or the kind's default content.
    pub fn effective_payload(&self) -> ReminderPayload {
        self.payload
            .clone()
            .unwrap_or_else(|| ReminderPayload::default_for(&self.kind))
    }
}

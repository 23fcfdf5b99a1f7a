//! # HappyDay Core Library
//!
//! Core reminder-scheduling logic for the HappyDay wellness app. The
//! rest of the app (journaling, meditation timers, the virtual garden)
//! is view and glue code; this crate owns the one subsystem with real
//! engineering weight: firing a notification at the configured time,
//! every day, across restarts, suspended hosts and denied permissions.
//!
//! ## Architecture
//!
//! - **Store**: durable key-value map of reminder definitions behind a
//!   narrow [`StorageBackend`] boundary; the single source of truth
//! - **Timer engine**: one central min-heap of pending wake-ups; no
//!   internal threads, the host ticks it
//! - **Dispatcher**: renders notification content and performs delivery
//!   through an injected [`NotificationSink`]; a denied permission skips
//!   delivery but never the recurrence bookkeeping
//! - **Recovery**: startup pass reconciling persisted state with live
//!   timers; missed windows fire immediately instead of silently lapsing
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: the facade the settings UI talks to
//! - [`TimerEngine`]: arm/cancel/due over the wake-up heap
//! - [`ReminderStore`]: persistence with per-record corruption tolerance
//! - [`PermissionGate`]: platform notification permission boundary

pub mod dispatch;
pub mod error;
pub mod events;
pub mod notify;
pub mod recovery;
pub mod reminder;
pub mod scheduler;
pub mod store;
pub mod timer;

pub use dispatch::{ClickHandler, FireOutcome, NextStep, ReminderDispatcher};
pub use error::{Result, SchedulerError, StoreError, ValidationError};
pub use events::Event;
pub use notify::{Notification, NotificationSink, Permission, PermissionBroker, PermissionGate};
pub use recovery::{RecoveryAction, RecoveryReport};
pub use reminder::{
    Recurrence, Reminder, ReminderKind, ReminderPayload, ReminderState, TimeOfDay,
};
pub use scheduler::{ReminderScheduler, SchedulerStats};
pub use store::{FileBackend, MemoryBackend, ReminderStore, StorageBackend};
pub use timer::{next_occurrence, TimerEngine};

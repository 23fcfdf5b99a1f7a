//! Reminder delivery.
//!
//! The dispatcher turns a due reminder into a notification and reports
//! what the scheduler should do next. A denied permission (or a failing
//! sink) skips delivery but never the recurrence bookkeeping, so the
//! daily cycle stays in sync regardless of delivery outcome.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::notify::{Notification, NotificationSink};
use crate::reminder::{Recurrence, Reminder, ReminderKind};

/// Click callback registered by the UI layer, keyed by reminder kind.
/// Receives the reminder's opaque route string.
pub type ClickHandler = Box<dyn FnMut(&str) + Send>;

/// What the scheduler must do with a reminder after its fire window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Daily reminder: recompute `next_fire_at` and re-arm.
    Reschedule,
    /// One-shot reminder: remove from the store, do not re-arm.
    Remove,
}

/// Outcome of a single fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireOutcome {
    pub delivered: bool,
    pub next: NextStep,
}

/// Renders notification content and owns the delivery side effect.
pub struct ReminderDispatcher<S> {
    sink: S,
    click_handlers: HashMap<ReminderKind, ClickHandler>,
}

impl<S: NotificationSink> ReminderDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            click_handlers: HashMap::new(),
        }
    }

    /// Deliver a due reminder. `permitted` is the permission gate's
    /// answer at fire time; when false the delivery is a silent no-op.
    pub fn fire(&mut self, reminder: &Reminder, permitted: bool) -> FireOutcome {
        let delivered = if permitted {
            let payload = reminder.effective_payload();
            let notification = Notification::new(payload.title, payload.body, payload.tag);
            self.show(&notification)
        } else {
            debug!(id = reminder.id(), "skipping delivery, no notification permission");
            false
        };

        FireOutcome {
            delivered,
            next: match reminder.recurrence {
                Recurrence::Daily => NextStep::Reschedule,
                Recurrence::Once => NextStep::Remove,
            },
        }
    }

    /// Show an arbitrary notification immediately (achievements, daily
    /// summaries, test notifications). Returns whether it was delivered.
    pub fn show(&mut self, notification: &Notification) -> bool {
        match self.sink.show(notification) {
            Ok(()) => true,
            Err(e) => {
                warn!(tag = %notification.tag, error = %e, "notification delivery failed");
                false
            }
        }
    }

    /// Register the click callback for a reminder kind, replacing any
    /// previous one.
    pub fn register_click_handler(&mut self, kind: ReminderKind, handler: ClickHandler) {
        self.click_handlers.insert(kind, handler);
    }

    /// Forward a click on a delivered notification to the registered
    /// handler. Unregistered kinds are ignored.
    pub fn dispatch_click(&mut self, kind: &ReminderKind, route: &str) {
        if let Some(handler) = self.click_handlers.get_mut(kind) {
            handler(route);
        } else {
            debug!(kind = %kind, "click with no registered handler");
        }
    }
}

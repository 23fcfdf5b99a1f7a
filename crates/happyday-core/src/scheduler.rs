//! Scheduler facade.
//!
//! [`ReminderScheduler`] wires the store, timer engine, dispatcher and
//! permission broker together behind the operation surface the settings
//! UI consumes. It is an explicit instance with injected collaborators;
//! nothing here is global, so tests construct one per case with fakes.
//!
//! The one mutation discipline that matters: cancel the old timer first,
//! persist the new state second, arm the new timer last. The store is
//! authoritative; the engine's handle map is a cache reconciled from it.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::debug;

use crate::dispatch::{ClickHandler, NextStep, ReminderDispatcher};
use crate::error::Result;
use crate::events::Event;
use crate::notify::{Notification, NotificationSink, Permission, PermissionBroker, PermissionGate};
use crate::reminder::{Recurrence, Reminder, ReminderKind, ReminderPayload, ReminderState, TimeOfDay};
use crate::store::{ReminderStore, StorageBackend};
use crate::timer::{next_occurrence, TimerEngine};

/// Snapshot of scheduler health, mirroring what the settings screen
/// shows next to the reminder toggles.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStats {
    pub supported: bool,
    pub permission: Permission,
    pub armed: usize,
    pub kinds: Vec<String>,
}

/// The reminder scheduler. Single-threaded and tick-driven: the host
/// calls [`tick`](Self::tick) periodically (and on wake events) and
/// [`recover`](Self::recover) once at startup.
pub struct ReminderScheduler<G, S, B> {
    store: ReminderStore<B>,
    engine: TimerEngine,
    dispatcher: ReminderDispatcher<S>,
    permissions: PermissionBroker<G>,
}

impl<G, S, B> ReminderScheduler<G, S, B>
where
    G: PermissionGate,
    S: NotificationSink,
    B: StorageBackend,
{
    pub fn new(gate: G, sink: S, backend: B) -> Self {
        Self {
            store: ReminderStore::new(backend),
            engine: TimerEngine::new(),
            dispatcher: ReminderDispatcher::new(sink),
            permissions: PermissionBroker::new(gate),
        }
    }

    // ── Settings operations ──────────────────────────────────────────

    /// Create, update or disable the reminder for a kind.
    ///
    /// Enabling (or editing the time of) a reminder cancels any previous
    /// timer for the id before the new definition is persisted and
    /// armed. Disabling removes the definition; disabling an absent
    /// reminder is a no-op.
    pub fn set_reminder(
        &mut self,
        kind: ReminderKind,
        time_of_day: TimeOfDay,
        enabled: bool,
        recurrence: Recurrence,
    ) -> Result<Event> {
        self.set_reminder_at(kind, time_of_day, enabled, recurrence, Utc::now())
    }

    /// [`set_reminder`](Self::set_reminder) against an explicit clock.
    pub fn set_reminder_at(
        &mut self,
        kind: ReminderKind,
        time_of_day: TimeOfDay,
        enabled: bool,
        recurrence: Recurrence,
        now: DateTime<Utc>,
    ) -> Result<Event> {
        let id = kind.slug().to_string();

        // A stale timer must never outlive a settings change.
        self.engine.cancel(&id);

        if !enabled {
            self.store.remove(&id)?;
            debug!(%id, "reminder disabled");
            return Ok(Event::ReminderCleared { id, at: now });
        }

        let fire_at = self.occurrence_after(time_of_day, now);
        let reminder = Reminder::new(kind, time_of_day, recurrence, fire_at);
        self.store.put(&reminder)?;
        self.engine.arm(&id, fire_at);
        Ok(Event::ReminderArmed { id, fire_at, at: now })
    }

    /// Disable and remove the reminder for a kind. Idempotent.
    pub fn remove_reminder(&mut self, kind: &ReminderKind) -> Result<Event> {
        let time = kind.default_time_of_day();
        self.set_reminder(kind.clone(), time, false, Recurrence::Daily)
    }

    // ── Tick loop ────────────────────────────────────────────────────

    /// Fire everything that has come due. Returns the produced events.
    ///
    /// Also the suspension remedy: a tick after the host slept past a
    /// fire time observes `now >= next_fire_at` and fires immediately.
    pub fn tick(&mut self) -> Result<Vec<Event>> {
        self.tick_at(Utc::now())
    }

    /// [`tick`](Self::tick) against an explicit clock.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        for id in self.engine.due(now) {
            let Some(reminder) = self.store.get(&id)? else {
                // Store is authoritative; an armed id with no record is a
                // leftover cache entry.
                self.engine.cancel(&id);
                continue;
            };

            let permitted = self.permissions.has_permission();
            let outcome = self.dispatcher.fire(&reminder, permitted);
            events.push(Event::ReminderFired {
                id: id.clone(),
                delivered: outcome.delivered,
                at: now,
            });

            match outcome.next {
                NextStep::Reschedule => {
                    let fire_at = self.occurrence_after(reminder.time_of_day, now);
                    let updated = Reminder {
                        next_fire_at: fire_at,
                        ..reminder
                    };
                    self.store.put(&updated)?;
                    self.engine.arm(&id, fire_at);
                    events.push(Event::ReminderArmed { id, fire_at, at: now });
                }
                NextStep::Remove => {
                    self.store.remove(&id)?;
                    self.engine.cancel(&id);
                    events.push(Event::ReminderCleared { id, at: now });
                }
            }
        }
        Ok(events)
    }

    /// Earliest pending fire time; lets a host sleep instead of polling.
    pub fn next_wake(&mut self) -> Option<DateTime<Utc>> {
        self.engine.next_wake()
    }

    // ── Permission and delivery ──────────────────────────────────────

    pub fn has_permission(&self) -> bool {
        self.permissions.has_permission()
    }

    /// Request the platform permission. In-flight prompts are
    /// de-duplicated; unsupported platforms report denied.
    pub fn request_permission(&mut self) -> bool {
        self.permissions.request()
    }

    /// Immediate notification outside the reminder cycle (achievements,
    /// summaries, tests). Returns whether it was delivered.
    pub fn notify_now(&mut self, notification: &Notification) -> bool {
        if !self.permissions.has_permission() {
            debug!(tag = %notification.tag, "skipping delivery, no notification permission");
            return false;
        }
        self.dispatcher.show(notification)
    }

    /// Register the click callback for a kind. The handler receives the
    /// reminder's opaque route string; the scheduler knows no routes.
    pub fn register_click_handler(&mut self, kind: ReminderKind, handler: ClickHandler) {
        self.dispatcher.register_click_handler(kind, handler);
    }

    /// Forward a notification click from the platform layer.
    pub fn handle_click(&mut self, kind: &ReminderKind) -> Result<()> {
        let payload = match self.store.get(kind.slug())? {
            Some(reminder) => reminder.effective_payload(),
            None => ReminderPayload::default_for(kind),
        };
        self.dispatcher.dispatch_click(kind, &payload.route);
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn reminder(&self, kind: &ReminderKind) -> Result<Option<Reminder>> {
        Ok(self.store.get(kind.slug())?)
    }

    /// All enabled reminder definitions.
    pub fn active_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.store.list_enabled()?)
    }

    pub fn state_of(&self, kind: &ReminderKind) -> ReminderState {
        self.engine.state_of(kind.slug())
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            supported: self.permissions.supported(),
            permission: self.permissions.permission(),
            armed: self.engine.armed_count(),
            kinds: self.engine.armed_ids(),
        }
    }

    // ── Internal (shared with recovery) ──────────────────────────────

    /// Next occurrence of `time_of_day` in the local timezone, strictly
    /// after `now`.
    fn occurrence_after(&self, time_of_day: TimeOfDay, now: DateTime<Utc>) -> DateTime<Utc> {
        next_occurrence(time_of_day, &now.with_timezone(&Local)).with_timezone(&Utc)
    }

    pub(crate) fn store(&self) -> &ReminderStore<B> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ReminderStore<B> {
        &mut self.store
    }

    pub(crate) fn arm(&mut self, reminder: &Reminder) {
        self.engine.arm(reminder.id(), reminder.next_fire_at);
    }

    /// Fire a reminder whose window was missed while the process was not
    /// running. Returns the delivery flag and, for daily reminders, the
    /// fresh target persisted for the next cycle.
    pub(crate) fn fire_missed(
        &mut self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> Result<(bool, Option<DateTime<Utc>>)> {
        let id = reminder.id().to_string();
        let permitted = self.permissions.has_permission();
        let outcome = self.dispatcher.fire(reminder, permitted);
        match outcome.next {
            NextStep::Reschedule => {
                let fire_at = self.occurrence_after(reminder.time_of_day, now);
                let updated = Reminder {
                    next_fire_at: fire_at,
                    ..reminder.clone()
                };
                self.store.put(&updated)?;
                self.engine.arm(&id, fire_at);
                Ok((outcome.delivered, Some(fire_at)))
            }
            NextStep::Remove => {
                self.store.remove(&id)?;
                self.engine.cancel(&id);
                Ok((outcome.delivered, None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Permission;
    use crate::store::MemoryBackend;
    use std::sync::{Arc, Mutex};

    struct StaticGate(Permission);

    impl PermissionGate for StaticGate {
        fn permission(&self) -> Permission {
            self.0
        }

        fn prompt(&mut self) -> Permission {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        shown: Arc<Mutex<Vec<Notification>>>,
    }

    impl NotificationSink for RecordingSink {
        fn show(&mut self, n: &Notification) -> Result<(), Box<dyn std::error::Error>> {
            self.shown.lock().unwrap().push(n.clone());
            Ok(())
        }
    }

    fn scheduler(
        permission: Permission,
    ) -> (
        ReminderScheduler<StaticGate, RecordingSink, MemoryBackend>,
        Arc<Mutex<Vec<Notification>>>,
    ) {
        let sink = RecordingSink::default();
        let shown = sink.shown.clone();
        (
            ReminderScheduler::new(StaticGate(permission), sink, MemoryBackend::default()),
            shown,
        )
    }

    #[test]
    fn enabling_arms_exactly_one_timer() {
        let (mut s, _) = scheduler(Permission::Granted);
        s.set_reminder(
            ReminderKind::Journal,
            TimeOfDay::new(20, 0).unwrap(),
            true,
            Recurrence::Daily,
        )
        .unwrap();

        assert_eq!(s.stats().armed, 1);
        assert_eq!(s.state_of(&ReminderKind::Journal), ReminderState::Scheduled);
        let stored = s.reminder(&ReminderKind::Journal).unwrap().unwrap();
        assert!(stored.next_fire_at > Utc::now());
    }

    #[test]
    fn repeated_set_never_duplicates_timers() {
        let (mut s, _) = scheduler(Permission::Granted);
        for minute in [0, 15, 30, 45] {
            s.set_reminder(
                ReminderKind::Journal,
                TimeOfDay::new(20, minute).unwrap(),
                true,
                Recurrence::Daily,
            )
            .unwrap();
        }
        assert_eq!(s.stats().armed, 1);
        let stored = s.reminder(&ReminderKind::Journal).unwrap().unwrap();
        assert_eq!(stored.time_of_day, TimeOfDay::new(20, 45).unwrap());
    }

    #[test]
    fn disable_is_idempotent_and_clears_the_timer() {
        let (mut s, _) = scheduler(Permission::Granted);
        s.set_reminder(
            ReminderKind::Meditation,
            TimeOfDay::new(9, 0).unwrap(),
            true,
            Recurrence::Daily,
        )
        .unwrap();

        s.remove_reminder(&ReminderKind::Meditation).unwrap();
        s.remove_reminder(&ReminderKind::Meditation).unwrap();

        assert_eq!(s.stats().armed, 0);
        assert_eq!(s.state_of(&ReminderKind::Meditation), ReminderState::Disabled);
        assert!(s.reminder(&ReminderKind::Meditation).unwrap().is_none());
    }

    #[test]
    fn tick_fires_due_daily_and_rearms_for_next_day() {
        let (mut s, shown) = scheduler(Permission::Granted);
        s.set_reminder(
            ReminderKind::Journal,
            TimeOfDay::new(20, 0).unwrap(),
            true,
            Recurrence::Daily,
        )
        .unwrap();
        let first_target = s.reminder(&ReminderKind::Journal).unwrap().unwrap().next_fire_at;

        let fire_now = first_target + chrono::Duration::seconds(1);
        let events = s.tick_at(fire_now).unwrap();

        assert!(matches!(
            events[0],
            Event::ReminderFired { delivered: true, .. }
        ));
        assert_eq!(shown.lock().unwrap().len(), 1);

        let stored = s.reminder(&ReminderKind::Journal).unwrap().unwrap();
        assert!(stored.next_fire_at > fire_now);
        assert_eq!(s.stats().armed, 1);
        assert_eq!(s.state_of(&ReminderKind::Journal), ReminderState::Scheduled);
    }

    #[test]
    fn once_reminder_is_gone_after_firing() {
        let (mut s, shown) = scheduler(Permission::Granted);
        s.set_reminder(
            ReminderKind::Watering,
            TimeOfDay::new(18, 0).unwrap(),
            true,
            Recurrence::Once,
        )
        .unwrap();
        let target = s.reminder(&ReminderKind::Watering).unwrap().unwrap().next_fire_at;

        s.tick_at(target).unwrap();

        assert_eq!(shown.lock().unwrap().len(), 1);
        assert!(s.reminder(&ReminderKind::Watering).unwrap().is_none());
        assert_eq!(s.stats().armed, 0);
        assert_eq!(s.state_of(&ReminderKind::Watering), ReminderState::Disabled);
    }

    #[test]
    fn denied_permission_fires_silently_but_keeps_the_cycle() {
        let (mut s, shown) = scheduler(Permission::Denied);
        s.set_reminder(
            ReminderKind::Journal,
            TimeOfDay::new(20, 0).unwrap(),
            true,
            Recurrence::Daily,
        )
        .unwrap();
        let target = s.reminder(&ReminderKind::Journal).unwrap().unwrap().next_fire_at;

        let events = s.tick_at(target).unwrap();

        assert!(matches!(
            events[0],
            Event::ReminderFired { delivered: false, .. }
        ));
        assert!(shown.lock().unwrap().is_empty());
        // Bookkeeping still advanced.
        assert!(s.reminder(&ReminderKind::Journal).unwrap().unwrap().next_fire_at > target);
        assert_eq!(s.stats().armed, 1);
    }

    #[test]
    fn tick_with_nothing_due_is_quiet() {
        let (mut s, shown) = scheduler(Permission::Granted);
        s.set_reminder(
            ReminderKind::Journal,
            TimeOfDay::new(20, 0).unwrap(),
            true,
            Recurrence::Daily,
        )
        .unwrap();

        let events = s.tick_at(Utc::now()).unwrap();
        assert!(events.is_empty());
        assert!(shown.lock().unwrap().is_empty());
    }

    #[test]
    fn notify_now_respects_permission() {
        let (mut s, shown) = scheduler(Permission::Granted);
        assert!(s.notify_now(&Notification::test()));
        assert_eq!(shown.lock().unwrap().len(), 1);

        let (mut s, shown) = scheduler(Permission::Denied);
        assert!(!s.notify_now(&Notification::test()));
        assert!(shown.lock().unwrap().is_empty());
    }
}

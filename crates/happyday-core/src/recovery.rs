//! Startup recovery.
//!
//! Process exit destroys all live timers while the store survives, so
//! every cold start begins with a reconciliation pass: re-arm reminders
//! whose target is still ahead, fire the ones whose window was missed,
//! and purge whatever no longer belongs in the store. The same pass runs
//! opportunistically on wake/visibility events, where it catches timers
//! the host suspended past their fire time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::notify::{NotificationSink, PermissionGate};
use crate::scheduler::ReminderScheduler;
use crate::store::StorageBackend;

/// What happened to a single persisted record during recovery.
#[derive(Debug, Clone, Serialize)]
pub enum RecoveryAction {
    /// Target still ahead; timer re-armed without modification.
    Rearmed {
        id: String,
        fire_at: DateTime<Utc>,
    },
    /// Missed window; fired immediately. Daily reminders carry the fresh
    /// target they were rescheduled for, one-shot reminders carry none
    /// and are gone from the store.
    Fired {
        id: String,
        delivered: bool,
        rescheduled_for: Option<DateTime<Utc>>,
    },
    /// Record failed schema validation and was purged.
    Dropped { id: String, reason: String },
    /// Record was valid but not schedulable (disabled); purged.
    Skipped { id: String, reason: String },
}

/// Summary of one recovery pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecoveryReport {
    /// Records examined, corrupt ones included.
    pub examined: usize,
    pub rearmed: usize,
    pub fired: usize,
    pub dropped: usize,
    pub skipped: usize,
    pub actions: Vec<RecoveryAction>,
}

impl RecoveryReport {
    /// True when no record had to be dropped.
    pub fn is_clean(&self) -> bool {
        self.dropped == 0
    }

    fn push(&mut self, action: RecoveryAction) {
        match &action {
            RecoveryAction::Rearmed { .. } => self.rearmed += 1,
            RecoveryAction::Fired { .. } => self.fired += 1,
            RecoveryAction::Dropped { .. } => self.dropped += 1,
            RecoveryAction::Skipped { .. } => self.skipped += 1,
        }
        self.actions.push(action);
    }
}

impl<G, S, B> ReminderScheduler<G, S, B>
where
    G: PermissionGate,
    S: NotificationSink,
    B: StorageBackend,
{
    /// Reconcile persisted reminders with live timers.
    ///
    /// Invoked once at process start, and again on any wake event. A
    /// corrupted record never aborts the pass; it is purged and the
    /// remaining entries are still processed.
    pub fn recover(&mut self) -> Result<RecoveryReport> {
        self.recover_at(Utc::now())
    }

    /// [`recover`](Self::recover) against an explicit clock.
    pub fn recover_at(&mut self, now: DateTime<Utc>) -> Result<RecoveryReport> {
        let snapshot = self.store().snapshot()?;
        let mut report = RecoveryReport {
            examined: snapshot.reminders.len() + snapshot.dropped.len(),
            ..RecoveryReport::default()
        };

        for corrupt in snapshot.dropped {
            self.store_mut().remove(&corrupt.id)?;
            warn!(id = %corrupt.id, reason = %corrupt.reason, "purged corrupt reminder");
            report.push(RecoveryAction::Dropped {
                id: corrupt.id,
                reason: corrupt.reason,
            });
        }

        for reminder in snapshot.reminders {
            let id = reminder.id().to_string();
            if !reminder.enabled {
                // Disabled definitions are eligible for removal; a live
                // one would have been deleted on disable already.
                self.store_mut().remove(&id)?;
                report.push(RecoveryAction::Skipped {
                    id,
                    reason: "disabled".to_string(),
                });
                continue;
            }
            if reminder.next_fire_at > now {
                self.arm(&reminder);
                report.push(RecoveryAction::Rearmed {
                    id,
                    fire_at: reminder.next_fire_at,
                });
            } else {
                // Missed window: fire now rather than arming a timer that
                // already elapsed. Daily reminders reschedule, one-shot
                // reminders deliver their single fire and disappear.
                let (delivered, rescheduled_for) = self.fire_missed(&reminder, now)?;
                report.push(RecoveryAction::Fired {
                    id,
                    delivered,
                    rescheduled_for,
                });
            }
        }

        info!(
            examined = report.examined,
            rearmed = report.rearmed,
            fired = report.fired,
            dropped = report.dropped,
            skipped = report.skipped,
            "recovery pass complete"
        );
        Ok(report)
    }
}

//! Central timer engine.
//!
//! All pending wake-ups live in one min-heap of `(fire_at, id)` entries.
//! Cancellation is lazy: each arm bumps a generation counter, and heap
//! entries whose generation no longer matches the live slot are discarded
//! when they surface. Arming therefore structurally cancels any previous
//! timer for the same id; two live timers for one reminder cannot exist.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::reminder::ReminderState;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapEntry {
    fire_at: DateTime<Utc>,
    generation: u64,
    id: String,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then_with(|| self.generation.cmp(&other.generation))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u64,
    state: ReminderState,
    fire_at: Option<DateTime<Utc>>,
}

/// Min-heap timer engine. No internal threads; the caller ticks it.
#[derive(Debug, Default)]
pub struct TimerEngine {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a wake-up for `id` at `fire_at`, replacing any previous
    /// timer for the same id.
    pub fn arm(&mut self, id: &str, fire_at: DateTime<Utc>) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.slots.insert(
            id.to_string(),
            Slot {
                generation,
                state: ReminderState::Scheduled,
                fire_at: Some(fire_at),
            },
        );
        self.heap.push(Reverse(HeapEntry {
            fire_at,
            generation,
            id: id.to_string(),
        }));
        debug!(id, %fire_at, "armed timer");
    }

    /// Clear any pending wake-up for `id`. Idempotent.
    pub fn cancel(&mut self, id: &str) {
        if self.slots.remove(id).is_some() {
            debug!(id, "cancelled timer");
        }
    }

    /// Pop every reminder whose fire time has been reached. Popped ids
    /// transition to `Fired` and stay known until re-armed or cancelled.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let mut due = Vec::new();
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.fire_at > now {
                break;
            }
            let Some(Reverse(entry)) = self.heap.pop() else {
                break;
            };
            let live = self
                .slots
                .get(&entry.id)
                .is_some_and(|s| s.generation == entry.generation && s.state == ReminderState::Scheduled);
            if !live {
                continue; // Stale entry from a cancelled or replaced arm.
            }
            if let Some(slot) = self.slots.get_mut(&entry.id) {
                slot.state = ReminderState::Fired;
                slot.fire_at = None;
            }
            due.push(entry.id);
        }
        due
    }

    /// Earliest pending fire time, if any timer is armed.
    pub fn next_wake(&mut self) -> Option<DateTime<Utc>> {
        while let Some(Reverse(top)) = self.heap.peek() {
            let live = self
                .slots
                .get(&top.id)
                .is_some_and(|s| s.generation == top.generation && s.state == ReminderState::Scheduled);
            if live {
                return Some(top.fire_at);
            }
            self.heap.pop();
        }
        None
    }

    pub fn state_of(&self, id: &str) -> ReminderState {
        self.slots
            .get(id)
            .map(|s| s.state)
            .unwrap_or(ReminderState::Disabled)
    }

    pub fn is_armed(&self, id: &str) -> bool {
        self.state_of(id) == ReminderState::Scheduled
    }

    pub fn fire_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.slots.get(id).and_then(|s| s.fire_at)
    }

    /// Number of reminders with a live timer.
    pub fn armed_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| s.state == ReminderState::Scheduled)
            .count()
    }

    /// Ids with a live timer.
    pub fn armed_ids(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|(_, s)| s.state == ReminderState::Scheduled)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn due_pops_elapsed_entries_in_order() {
        let mut engine = TimerEngine::new();
        engine.arm("journal", at(20, 0));
        engine.arm("watering", at(18, 0));
        engine.arm("meditation", at(21, 0));

        let due = engine.due(at(20, 30));
        assert_eq!(due, vec!["watering".to_string(), "journal".to_string()]);
        assert_eq!(engine.state_of("watering"), ReminderState::Fired);
        assert_eq!(engine.state_of("meditation"), ReminderState::Scheduled);
        assert_eq!(engine.armed_count(), 1);
    }

    #[test]
    fn rearm_replaces_previous_timer() {
        let mut engine = TimerEngine::new();
        engine.arm("journal", at(18, 0));
        engine.arm("journal", at(22, 0));
        assert_eq!(engine.armed_count(), 1);
        assert_eq!(engine.fire_at("journal"), Some(at(22, 0)));

        // The stale 18:00 entry must not fire.
        assert!(engine.due(at(19, 0)).is_empty());
        assert_eq!(engine.due(at(23, 0)), vec!["journal".to_string()]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut engine = TimerEngine::new();
        engine.arm("journal", at(20, 0));
        engine.cancel("journal");
        engine.cancel("journal");
        assert_eq!(engine.state_of("journal"), ReminderState::Disabled);
        assert!(engine.due(at(23, 0)).is_empty());
    }

    #[test]
    fn fired_entry_does_not_fire_again_until_rearmed() {
        let mut engine = TimerEngine::new();
        engine.arm("journal", at(20, 0));
        assert_eq!(engine.due(at(20, 0)), vec!["journal".to_string()]);
        assert!(engine.due(at(23, 0)).is_empty());

        engine.arm("journal", at(23, 30));
        assert_eq!(engine.due(at(23, 59)), vec!["journal".to_string()]);
    }

    #[test]
    fn next_wake_skips_stale_entries() {
        let mut engine = TimerEngine::new();
        engine.arm("journal", at(18, 0));
        engine.arm("journal", at(22, 0));
        assert_eq!(engine.next_wake(), Some(at(22, 0)));

        engine.cancel("journal");
        assert_eq!(engine.next_wake(), None);
    }

    #[test]
    fn boundary_is_inclusive() {
        let mut engine = TimerEngine::new();
        engine.arm("journal", at(20, 0));
        assert_eq!(engine.due(at(20, 0)), vec!["journal".to_string()]);
    }
}

//! Timer engine: the mapping from reminder ids to pending wake-ups.
//!
//! One central min-heap keyed by fire time replaces one platform timer
//! per reminder. The engine never spawns threads; the caller ticks it
//! (cold start, periodic loop, or a wake/visibility event) and fires
//! whatever has come due.

mod engine;
mod occurrence;

pub use engine::TimerEngine;
pub use occurrence::next_occurrence;

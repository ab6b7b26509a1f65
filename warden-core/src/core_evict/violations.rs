//! Violation ledger
//!
//! Bounded, time-windowed tally of repeated low-severity unauthorized
//! kicks per (group, actor). Escalation is delayed until the threshold is
//! crossed so single ambiguous events do not trigger punitive action; the
//! whole ledger is wiped on a fixed period by a maintenance task. Losing
//! an occasional increment to the clear is acceptable; it only delays
//! escalation.

use crate::core_platform::{ActorId, GroupId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-(group, actor) unauthorized-kick tally
pub struct ViolationLedger {
    counts: Mutex<HashMap<(GroupId, ActorId), u32>>,
    threshold: u32,
}

impl ViolationLedger {
    /// Create a ledger that escalates once `threshold` prior observations
    /// have been recorded (i.e. on observation `threshold + 1`)
    pub fn new(threshold: u32) -> Self {
        Self { counts: Mutex::new(HashMap::new()), threshold }
    }

    /// Record one unauthorized kick; true when the caller should escalate
    ///
    /// The count resets to zero on escalation.
    pub fn observe(&self, group: &GroupId, actor: &ActorId) -> bool {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry((group.clone(), actor.clone())).or_insert(0);
        if *count >= self.threshold {
            *count = 0;
            true
        } else {
            *count += 1;
            false
        }
    }

    /// Current count for a pair (test/introspection helper)
    pub fn count(&self, group: &GroupId, actor: &ActorId) -> u32 {
        self.counts
            .lock()
            .unwrap()
            .get(&(group.clone(), actor.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Wipe the ledger (periodic clear)
    pub fn clear(&self) {
        self.counts.lock().unwrap().clear();
    }
}

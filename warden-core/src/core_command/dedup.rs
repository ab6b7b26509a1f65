//! Command dedup window
//!
//! Every controlled identity receives its own echo of a group message, so
//! the same command text can arrive several times in quick succession.
//! (group, text) pairs that already executed are remembered here and
//! skipped until the periodic clear wipes the window. A different command
//! in the same group passes through untouched.

use crate::core_platform::GroupId;
use std::collections::HashSet;
use std::sync::Mutex;

/// Set of (group, command text) pairs already handled within the window
#[derive(Default)]
pub struct DedupWindow {
    seen: Mutex<HashSet<(GroupId, String)>>,
}

impl DedupWindow {
    /// Create an empty window
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the command for this window; false when already claimed
    pub fn try_claim(&self, group: &GroupId, text: &str) -> bool {
        self.seen.lock().unwrap().insert((group.clone(), text.to_string()))
    }

    /// Wipe the window (periodic clear)
    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

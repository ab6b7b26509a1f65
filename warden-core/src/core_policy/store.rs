//! PolicyStore trait, the storage collaborator seam
//!
//! The engine reads and writes per-group protection policies and the
//! inviter whitelist through this trait; ownership of the data's lifecycle
//! stays with the storage collaborator. Permission checks are always
//! queried fresh, never cached, so a sub-admin change takes effect on the
//! very next decision.

use super::error::PolicyResult;
use super::policy::{LockKind, ProtectionPolicy};
use crate::core_platform::{ActorId, GroupId};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, used for whitelist expiry checks
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Storage collaborator for protection policies and the inviter whitelist
pub trait PolicyStore: Send + Sync {
    /// Read the policy for a group, if one exists
    fn policy(&self, group: &GroupId) -> PolicyResult<Option<ProtectionPolicy>>;

    /// Create a policy row if none exists; returns whether a row was created
    fn create_policy(&self, policy: &ProtectionPolicy) -> PolicyResult<bool>;

    /// Toggle one protection lock
    fn set_lock(&self, group: &GroupId, kind: LockKind, enabled: bool) -> PolicyResult<()>;

    /// Persist a newly adopted canonical display name
    fn set_canonical_name(&self, group: &GroupId, name: &str) -> PolicyResult<()>;

    /// Persist a newly adopted canonical picture reference
    fn set_canonical_picture(&self, group: &GroupId, picture_ref: &str) -> PolicyResult<()>;

    /// Assign or clear the group's sub-admin
    fn set_sub_admin(&self, group: &GroupId, actor: Option<&ActorId>) -> PolicyResult<()>;

    /// Whether the actor is on the inviter whitelist (expiry honored)
    fn is_whitelisted(&self, actor: &ActorId) -> PolicyResult<bool>;

    /// Add an actor to the inviter whitelist, optionally expiring at the
    /// given epoch-millisecond instant
    fn set_whitelisted(&self, actor: &ActorId, expires_at_ms: Option<u64>) -> PolicyResult<()>;

    /// Whether the actor holds group permission (inviter or sub-admin)
    ///
    /// Pure read; never mutates state.
    fn has_group_permission(&self, group: &GroupId, actor: &ActorId) -> PolicyResult<bool> {
        Ok(self.policy(group)?.map(|p| p.permits(actor)).unwrap_or(false))
    }
}

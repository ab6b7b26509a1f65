//! In-memory policy store (non-persistent, for tests and the harness)

use super::error::{PolicyError, PolicyResult};
use super::policy::{LockKind, ProtectionPolicy};
use super::store::{now_millis, PolicyStore};
use crate::core_platform::{ActorId, GroupId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Helper to convert poison errors into PolicyError
fn handle_poison<T>(_err: PoisonError<T>) -> PolicyError {
    PolicyError::Storage("lock poisoned: a thread panicked while holding the lock".to_string())
}

/// In-memory [`PolicyStore`]
#[derive(Default)]
pub struct MemoryPolicyStore {
    policies: RwLock<HashMap<GroupId, ProtectionPolicy>>,
    whitelist: RwLock<HashMap<ActorId, Option<u64>>>,
}

impl MemoryPolicyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, group: &GroupId, apply: F) -> PolicyResult<()>
    where
        F: FnOnce(&mut ProtectionPolicy),
    {
        let mut policies = self.policies.write().map_err(handle_poison)?;
        match policies.get_mut(group) {
            Some(policy) => {
                apply(policy);
                Ok(())
            }
            None => Err(PolicyError::Storage(format!("no policy row for group {}", group))),
        }
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn policy(&self, group: &GroupId) -> PolicyResult<Option<ProtectionPolicy>> {
        Ok(self.policies.read().map_err(handle_poison)?.get(group).cloned())
    }

    fn create_policy(&self, policy: &ProtectionPolicy) -> PolicyResult<bool> {
        let mut policies = self.policies.write().map_err(handle_poison)?;
        if policies.contains_key(&policy.group) {
            return Ok(false);
        }
        policies.insert(policy.group.clone(), policy.clone());
        Ok(true)
    }

    fn set_lock(&self, group: &GroupId, kind: LockKind, enabled: bool) -> PolicyResult<()> {
        self.update(group, |policy| match kind {
            LockKind::Name => policy.name_locked = enabled,
            LockKind::Picture => policy.picture_locked = enabled,
            LockKind::Url => policy.url_locked = enabled,
            LockKind::Invite => policy.invite_locked = enabled,
        })
    }

    fn set_canonical_name(&self, group: &GroupId, name: &str) -> PolicyResult<()> {
        self.update(group, |policy| policy.canonical_name = Some(name.to_string()))
    }

    fn set_canonical_picture(&self, group: &GroupId, picture_ref: &str) -> PolicyResult<()> {
        self.update(group, |policy| policy.canonical_picture = Some(picture_ref.to_string()))
    }

    fn set_sub_admin(&self, group: &GroupId, actor: Option<&ActorId>) -> PolicyResult<()> {
        self.update(group, |policy| policy.sub_admin = actor.cloned())
    }

    fn is_whitelisted(&self, actor: &ActorId) -> PolicyResult<bool> {
        let whitelist = self.whitelist.read().map_err(handle_poison)?;
        Ok(match whitelist.get(actor) {
            None => false,
            Some(None) => true,
            Some(Some(expires_at)) => *expires_at >= now_millis(),
        })
    }

    fn set_whitelisted(&self, actor: &ActorId, expires_at_ms: Option<u64>) -> PolicyResult<()> {
        self.whitelist
            .write()
            .map_err(handle_poison)?
            .insert(actor.clone(), expires_at_ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_policy_is_idempotent() {
        let store = MemoryPolicyStore::new();
        let policy = ProtectionPolicy::new(GroupId::new("g"), ActorId::new("owner"));

        assert!(store.create_policy(&policy).unwrap());
        assert!(!store.create_policy(&policy).unwrap());

        let stored = store.policy(&GroupId::new("g")).unwrap().unwrap();
        assert_eq!(stored.inviter, ActorId::new("owner"));
    }

    #[test]
    fn test_lock_toggles_round_trip() {
        let store = MemoryPolicyStore::new();
        let group = GroupId::new("g");
        store
            .create_policy(&ProtectionPolicy::new(group.clone(), ActorId::new("owner")))
            .unwrap();

        store.set_lock(&group, LockKind::Name, true).unwrap();
        store.set_lock(&group, LockKind::Invite, true).unwrap();

        let policy = store.policy(&group).unwrap().unwrap();
        assert!(policy.name_locked);
        assert!(policy.invite_locked);
        assert!(!policy.picture_locked);
    }

    #[test]
    fn test_group_permission_tracks_sub_admin_changes() {
        let store = MemoryPolicyStore::new();
        let group = GroupId::new("g");
        store
            .create_policy(&ProtectionPolicy::new(group.clone(), ActorId::new("owner")))
            .unwrap();

        let deputy = ActorId::new("deputy");
        assert!(!store.has_group_permission(&group, &deputy).unwrap());

        store.set_sub_admin(&group, Some(&deputy)).unwrap();
        assert!(store.has_group_permission(&group, &deputy).unwrap());

        store.set_sub_admin(&group, None).unwrap();
        assert!(!store.has_group_permission(&group, &deputy).unwrap());
    }

    #[test]
    fn test_whitelist_expiry() {
        let store = MemoryPolicyStore::new();
        let actor = ActorId::new("inviter");
        assert!(!store.is_whitelisted(&actor).unwrap());

        store.set_whitelisted(&actor, None).unwrap();
        assert!(store.is_whitelisted(&actor).unwrap());

        // Already expired
        store.set_whitelisted(&actor, Some(1)).unwrap();
        assert!(!store.is_whitelisted(&actor).unwrap());

        store.set_whitelisted(&actor, Some(now_millis() + 60_000)).unwrap();
        assert!(store.is_whitelisted(&actor).unwrap());
    }
}

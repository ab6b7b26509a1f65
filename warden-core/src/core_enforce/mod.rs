//! Enforcement engine
//!
//! Reacts to group-attribute-change notifications. For each changed
//! attribute the engine either adopts the new value as canonical (change
//! was allowed) or reverts it (change violated a lock), kicking the
//! offender first so they cannot immediately re-apply the change. A failed
//! permission or policy read aborts the branch; the next observed change
//! is evaluated fresh.

use crate::core_platform::{ActorId, GroupAttribute, GroupId, PlatformError};
use crate::core_policy::{PolicyError, PolicyStore, ProtectionPolicy};
use crate::core_pool::IdentityPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by enforcement branches
#[derive(Error, Debug)]
pub enum EnforceError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Every responder is currently withdrawn from rotation
    #[error("no responder identity available")]
    NoResponder,
}

/// Truncate to at most `max` characters, on a char boundary
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Handles group-attribute-change operations
pub struct EnforcementEngine {
    pool: Arc<IdentityPool>,
    store: Arc<dyn PolicyStore>,
    name_max_chars: usize,
}

impl EnforcementEngine {
    pub fn new(pool: Arc<IdentityPool>, store: Arc<dyn PolicyStore>, name_max_chars: usize) -> Self {
        Self { pool, store, name_max_chars }
    }

    /// Evaluate one attribute change against the group's policy
    pub async fn handle_attribute_change(
        &self,
        group: GroupId,
        actor: ActorId,
        attribute: GroupAttribute,
    ) -> Result<(), EnforceError> {
        if self.pool.is_controlled(&actor) {
            return Ok(());
        }
        let Some(policy) = self.store.policy(&group)? else {
            return Ok(());
        };
        match attribute {
            GroupAttribute::Name => self.enforce_name(&group, &actor, &policy).await,
            GroupAttribute::Picture => self.enforce_picture(&group, &actor, &policy).await,
            GroupAttribute::TicketPrevention => {
                self.enforce_ticket_prevention(&group, &actor, &policy).await
            }
        }
    }

    async fn enforce_name(
        &self,
        group: &GroupId,
        actor: &ActorId,
        policy: &ProtectionPolicy,
    ) -> Result<(), EnforceError> {
        let client = self.pool.random_responder().ok_or(EnforceError::NoResponder)?;
        let snapshot = client.get_group(group).await?;

        let permitted = !policy.name_locked
            || self.store.has_group_permission(group, actor)?;
        if permitted {
            let adopted = truncate_chars(&snapshot.name, self.name_max_chars);
            self.store.set_canonical_name(group, &adopted)?;
            debug!(%group, name = %adopted, "adopted new canonical name");
            return Ok(());
        }

        // Kick first so the actor cannot re-rename while we restore.
        client.kick_from_group(group, std::slice::from_ref(actor)).await?;
        match &policy.canonical_name {
            Some(canonical) => {
                let mut restored = snapshot;
                restored.name = canonical.clone();
                client.update_group(&restored).await?;
                info!(%group, %actor, name = %canonical, "reverted unauthorized rename");
            }
            None => warn!(%group, "no canonical name stored, cannot revert rename"),
        }
        Ok(())
    }

    async fn enforce_picture(
        &self,
        group: &GroupId,
        actor: &ActorId,
        policy: &ProtectionPolicy,
    ) -> Result<(), EnforceError> {
        let client = self.pool.random_responder().ok_or(EnforceError::NoResponder)?;
        let snapshot = client.get_group(group).await?;

        let permitted = !policy.picture_locked
            || self.store.has_group_permission(group, actor)?;
        if permitted {
            self.store.set_canonical_picture(group, &snapshot.picture_ref)?;
            debug!(%group, "adopted new canonical picture");
            return Ok(());
        }

        client.kick_from_group(group, std::slice::from_ref(actor)).await?;
        match &policy.canonical_picture {
            Some(canonical) => {
                let mut restored = snapshot;
                restored.picture_ref = canonical.clone();
                client.update_group(&restored).await?;
                info!(%group, %actor, "reverted unauthorized picture change");
            }
            None => warn!(%group, "no canonical picture stored, cannot revert"),
        }
        Ok(())
    }

    async fn enforce_ticket_prevention(
        &self,
        group: &GroupId,
        actor: &ActorId,
        policy: &ProtectionPolicy,
    ) -> Result<(), EnforceError> {
        if !policy.url_locked {
            return Ok(());
        }
        if self.store.has_group_permission(group, actor)? {
            return Ok(());
        }
        let client = self.pool.random_responder().ok_or(EnforceError::NoResponder)?;
        client.kick_from_group(group, std::slice::from_ref(actor)).await?;
        let mut snapshot = client.get_group(group).await?;
        snapshot.prevented_join_by_ticket = true;
        client.update_group(&snapshot).await?;
        info!(%group, %actor, "restored join-by-ticket prevention");
        Ok(())
    }
}

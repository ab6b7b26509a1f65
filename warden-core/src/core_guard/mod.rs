//! Invite guard
//!
//! Handles incoming group-invitation notifications. Invitations extended
//! to the primary identity go through the accept-and-claim flow (whitelist
//! check, capacity check, ticket fan-in of the responders, policy row
//! creation); invitations extended by unauthorized third parties into a
//! group with the invite lock set are cancelled by rotating responders.

use crate::config::EngineTunables;
use crate::core_enforce::truncate_chars;
use crate::core_platform::{ActorId, GroupId, PlatformError};
use crate::core_policy::{PolicyError, PolicyStore, ProtectionPolicy};
use crate::core_pool::IdentityPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors surfaced by invitation handling
#[derive(Error, Debug)]
pub enum GuardError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Handles group-invitation operations
pub struct InviteGuard {
    pool: Arc<IdentityPool>,
    store: Arc<dyn PolicyStore>,
    tunables: EngineTunables,
}

impl InviteGuard {
    pub fn new(
        pool: Arc<IdentityPool>,
        store: Arc<dyn PolicyStore>,
        tunables: EngineTunables,
    ) -> Self {
        Self { pool, store, tunables }
    }

    /// Route an invitation operation to the right branch
    pub async fn handle_invitation(
        &self,
        group: GroupId,
        inviter: ActorId,
        invitees: Vec<ActorId>,
    ) -> Result<(), GuardError> {
        if invitees.contains(self.pool.primary_id()) {
            return self.claim_group(group, inviter).await;
        }
        if self.pool.is_controlled(&inviter) {
            return Ok(());
        }
        if self.store.has_group_permission(&group, &inviter)? {
            return Ok(());
        }
        let invite_locked = self
            .store
            .policy(&group)?
            .map(|policy| policy.invite_locked)
            .unwrap_or(false);
        if invite_locked {
            self.cancel_unauthorized_invites(group, invitees);
        }
        Ok(())
    }

    /// Accept-and-claim flow for an invitation to the primary identity
    async fn claim_group(&self, group: GroupId, inviter: ActorId) -> Result<(), GuardError> {
        let primary = self.pool.primary();

        if !self.store.is_whitelisted(&inviter)? {
            info!(%group, %inviter, "rejecting invitation from non-whitelisted inviter");
            primary.reject_invitation(&group).await?;
            return Ok(());
        }

        let preview = primary.get_group(&group).await?;
        if preview.members.len() >= self.tunables.group_capacity {
            debug!(%group, members = preview.members.len(), "group over capacity, not joining");
            return Ok(());
        }

        primary.accept_invitation(&group).await?;
        let mut snapshot = match primary.get_group(&group).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%group, "primary identity failed to join: {e}");
                return Err(e.into());
            }
        };

        // A fresh ticket cannot be minted while prevention is active, so
        // clear it first and re-enable once every responder is in.
        if snapshot.prevented_join_by_ticket {
            snapshot.prevented_join_by_ticket = false;
            primary.update_group(&snapshot).await?;
        }
        let ticket = primary.reissue_invitation_ticket(&group).await?;

        let mut tasks = JoinSet::new();
        for responder in self.pool.responders() {
            let group = group.clone();
            let ticket = ticket.clone();
            tasks.spawn(async move {
                let result = responder.accept_invitation_by_ticket(&group, &ticket).await;
                (responder.actor_id(), result)
            });
        }
        if let Some(greeting) = self.tunables.greeting.clone() {
            let primary = primary.clone();
            let group = group.clone();
            tasks.spawn(async move {
                let result = primary.send_message(&group, &greeting).await;
                (primary.actor_id(), result)
            });
        }
        while let Some(result) = tasks.join_next().await {
            if let Ok((actor, Err(e))) = result {
                warn!(%actor, %group, "fan-out join step failed: {e}");
            }
        }

        snapshot.prevented_join_by_ticket = true;
        if let Err(e) = primary.update_group(&snapshot).await {
            warn!(%group, "failed to re-enable join-by-ticket prevention: {e}");
        }

        let mut policy = ProtectionPolicy::new(group.clone(), inviter.clone());
        policy.canonical_name =
            Some(truncate_chars(&snapshot.name, self.tunables.name_max_chars));
        policy.canonical_picture = Some(snapshot.picture_ref.clone());
        if self.store.create_policy(&policy)? {
            info!(%group, name = %snapshot.name, %inviter, "joined and claimed group");
        } else {
            debug!(%group, "policy row already present, keeping original inviter");
        }
        Ok(())
    }

    /// Cancel unauthorized third-party invitations via rotating responders
    ///
    /// Runs as detached sub-work: the handler does not wait on it, and each
    /// rotation wraparound backs off to respect platform rate limits.
    fn cancel_unauthorized_invites(&self, group: GroupId, invitees: Vec<ActorId>) {
        let responders = self.pool.responders();
        if responders.is_empty() {
            warn!(%group, "no responders available to cancel invitations");
            return;
        }
        let backoff = self.tunables.invite_cancel_backoff;
        info!(%group, targets = invitees.len(), "cancelling unauthorized invitations");
        tokio::spawn(async move {
            let mut index = 0;
            for target in invitees {
                let responder = &responders[index];
                if let Err(e) =
                    responder.cancel_invitation(&group, std::slice::from_ref(&target)).await
                {
                    warn!(%group, %target, "invitation cancel failed: {e}");
                }
                if index + 1 == responders.len() {
                    index = 0;
                    tokio::time::sleep(backoff).await;
                } else {
                    index += 1;
                }
            }
        });
    }
}

//! Eviction / reinstatement protocol
//!
//! Handles kick notifications. An authorized eviction of a controlled
//! identity is honored: every identity leaves the group. A hostile
//! eviction triggers reinstatement: the victim is swapped out of the
//! responder rotation, and the remaining identities run, in sequence,
//! kick-evictor → reissue ticket → fetch → (disable prevention) → victim
//! accepts by ticket → re-enable prevention. Prevention is off only for
//! the minimal window between ticket issuance and the victim's join; a
//! failed attempt re-enables it before the next responder tries.
//!
//! Evictions of third-party members are handled more lightly: re-invite
//! the victim when the evictor was authorized, otherwise tally the kick in
//! the violation ledger and escalate only past the threshold.

pub mod violations;

pub use violations::ViolationLedger;

use crate::core_platform::{ActorId, GroupId, PlatformClient, PlatformError};
use crate::core_policy::{PolicyError, PolicyStore};
use crate::core_pool::IdentityPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors surfaced by eviction handling
#[derive(Error, Debug)]
pub enum EvictError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The named victim is not a pool identity that can be withdrawn
    #[error("evicted identity {0} not found in responder rotation")]
    UnknownIdentity(ActorId),

    /// Every responder is currently withdrawn from rotation
    #[error("no responder identity available")]
    NoResponder,

    /// Every helper's reinstatement chain failed
    #[error("reinstatement exhausted all responders for group {0}")]
    ReinstatementExhausted(GroupId),
}

/// Handles kick-notification operations
pub struct EvictionProtocol {
    pool: Arc<IdentityPool>,
    store: Arc<dyn PolicyStore>,
    violations: Arc<ViolationLedger>,
}

impl EvictionProtocol {
    pub fn new(
        pool: Arc<IdentityPool>,
        store: Arc<dyn PolicyStore>,
        violations: Arc<ViolationLedger>,
    ) -> Self {
        Self { pool, store, violations }
    }

    /// Route a kick notification to the right branch
    pub async fn handle_kick(
        &self,
        group: GroupId,
        actor: ActorId,
        evicted: Vec<ActorId>,
    ) -> Result<(), EvictError> {
        if self.pool.is_controlled(&actor) {
            return Ok(());
        }

        let bot_victims: Vec<ActorId> =
            evicted.iter().filter(|v| self.pool.is_controlled(v)).cloned().collect();

        if !bot_victims.is_empty() {
            if self.store.has_group_permission(&group, &actor)? {
                info!(%group, %actor, "authorized eviction, leaving group");
                self.leave_group_everywhere(&group).await;
                return Ok(());
            }
            for victim in &bot_victims {
                self.reinstate(&group, &actor, victim).await?;
            }
            return Ok(());
        }

        if self.store.has_group_permission(&group, &actor)? {
            self.reinvite_victims(&group, &evicted).await
        } else {
            if self.violations.observe(&group, &actor) {
                info!(%group, %actor, "violation threshold crossed, kicking offender");
                let client = self.pool.random_responder().ok_or(EvictError::NoResponder)?;
                client.kick_from_group(&group, std::slice::from_ref(&actor)).await?;
            } else {
                debug!(%group, %actor, "unauthorized kick tallied");
            }
            Ok(())
        }
    }

    /// Every controlled identity leaves the group (fan-out, wait-barrier)
    async fn leave_group_everywhere(&self, group: &GroupId) {
        let mut tasks = JoinSet::new();
        for client in self.pool.all() {
            let group = group.clone();
            tasks.spawn(async move { (client.actor_id(), client.leave_group(&group).await) });
        }
        while let Some(result) = tasks.join_next().await {
            if let Ok((actor, Err(e))) = result {
                warn!(%actor, %group, "leave failed: {e}");
            }
        }
    }

    /// Reinstate one evicted controlled identity
    async fn reinstate(
        &self,
        group: &GroupId,
        evictor: &ActorId,
        victim: &ActorId,
    ) -> Result<(), EvictError> {
        // Swap the victim out of rotation so it is not handed new work
        // mid-rejoin; restore it whatever the outcome.
        let (victim_client, withdrawn) = if victim == self.pool.primary_id() {
            (self.pool.primary(), false)
        } else {
            let client = self
                .pool
                .withdraw_responder(victim)
                .ok_or_else(|| EvictError::UnknownIdentity(victim.clone()))?;
            (client, true)
        };

        let result = self.reinstate_with_helpers(group, evictor, victim_client.as_ref()).await;
        if withdrawn {
            self.pool.restore_responder(victim);
        }
        result
    }

    async fn reinstate_with_helpers(
        &self,
        group: &GroupId,
        evictor: &ActorId,
        victim_client: &dyn PlatformClient,
    ) -> Result<(), EvictError> {
        for helper in self.pool.responders() {
            match self.attempt_reinstatement(helper.as_ref(), group, evictor, victim_client).await
            {
                Ok(()) => {
                    info!(
                        %group,
                        victim = %victim_client.actor_id(),
                        helper = %helper.actor_id(),
                        "reinstated evicted identity"
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(%group, helper = %helper.actor_id(), "reinstatement attempt failed: {e}");
                }
            }
        }
        Err(EvictError::ReinstatementExhausted(group.clone()))
    }

    /// One helper's full reinstatement chain
    ///
    /// Ordering is the correctness property here: prevention is disabled
    /// only after the fresh ticket exists, and re-enabled as soon as the
    /// victim accepted, or immediately if a later step fails.
    async fn attempt_reinstatement(
        &self,
        helper: &dyn PlatformClient,
        group: &GroupId,
        evictor: &ActorId,
        victim_client: &dyn PlatformClient,
    ) -> Result<(), EvictError> {
        helper.kick_from_group(group, std::slice::from_ref(evictor)).await?;
        let ticket = helper.reissue_invitation_ticket(group).await?;
        let mut snapshot = helper.get_group_without_members(group).await?;

        let mut disabled_here = false;
        if snapshot.prevented_join_by_ticket {
            snapshot.prevented_join_by_ticket = false;
            helper.update_group(&snapshot).await?;
            disabled_here = true;
        }

        match victim_client.accept_invitation_by_ticket(group, &ticket).await {
            Ok(()) => {
                snapshot.prevented_join_by_ticket = true;
                helper.update_group(&snapshot).await.map_err(|e| {
                    warn!(%group, "re-enable failed after successful re-join: {e}");
                    EvictError::from(e)
                })?;
                Ok(())
            }
            Err(e) => {
                if disabled_here {
                    // Compensating toggle: never leave prevention off
                    // behind a failed attempt.
                    snapshot.prevented_join_by_ticket = true;
                    if let Err(e2) = helper.update_group(&snapshot).await {
                        warn!(%group, "compensating re-enable failed: {e2}");
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Re-invite third-party members accidentally removed by an authorized
    /// admin (re-add as contact, clear stale membership trace, re-invite)
    async fn reinvite_victims(
        &self,
        group: &GroupId,
        victims: &[ActorId],
    ) -> Result<(), EvictError> {
        let client = self.pool.random_responder().ok_or(EvictError::NoResponder)?;
        for victim in victims {
            client.find_and_add_contact(victim).await?;
            client.kick_from_group(group, std::slice::from_ref(victim)).await?;
            client.invite_into_group(group, std::slice::from_ref(victim)).await?;
            let contact_name = match client.get_contact(victim).await {
                Ok(name) => name,
                Err(_) => victim.to_string(),
            };
            info!(%group, %victim, name = %contact_name, "re-invited removed member");
        }
        Ok(())
    }
}

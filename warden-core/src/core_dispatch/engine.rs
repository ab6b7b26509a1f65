//! Engine wiring
//!
//! Builds the moderation services over one identity pool and one policy
//! store, registers them on an [`OperationDispatcher`], and owns the
//! periodic maintenance of the short-lived in-memory state.

use super::dispatcher::OperationDispatcher;
use crate::config::EngineTunables;
use crate::core_command::{CommandPipeline, DedupWindow};
use crate::core_enforce::EnforcementEngine;
use crate::core_evict::{EvictionProtocol, ViolationLedger};
use crate::core_guard::InviteGuard;
use crate::core_platform::{OpKind, Operation, RoomId};
use crate::core_policy::PolicyStore;
use crate::core_pool::IdentityPool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

/// The assembled moderation engine
pub struct Engine {
    pool: Arc<IdentityPool>,
    tunables: EngineTunables,
    guard: InviteGuard,
    enforcer: EnforcementEngine,
    eviction: EvictionProtocol,
    commands: CommandPipeline,
    violations: Arc<ViolationLedger>,
    dedup: Arc<DedupWindow>,
}

impl Engine {
    pub fn new(
        pool: Arc<IdentityPool>,
        store: Arc<dyn PolicyStore>,
        tunables: EngineTunables,
    ) -> Arc<Self> {
        let violations = Arc::new(ViolationLedger::new(tunables.violation_threshold));
        let dedup = Arc::new(DedupWindow::new());
        let guard = InviteGuard::new(pool.clone(), store.clone(), tunables.clone());
        let enforcer =
            EnforcementEngine::new(pool.clone(), store.clone(), tunables.name_max_chars);
        let eviction = EvictionProtocol::new(pool.clone(), store.clone(), violations.clone());
        let commands = CommandPipeline::new(
            pool.clone(),
            store,
            dedup.clone(),
            tunables.command_prefixes.clone(),
            Instant::now(),
        );
        Arc::new(Self {
            pool,
            tunables,
            guard,
            enforcer,
            eviction,
            commands,
            violations,
            dedup,
        })
    }

    /// Build a dispatcher with every operation kind wired to its service
    pub fn dispatcher(self: &Arc<Self>) -> OperationDispatcher {
        let mut dispatcher = OperationDispatcher::new();

        let engine = self.clone();
        dispatcher.set_handler(OpKind::InvitedIntoGroup, move |op| {
            let engine = engine.clone();
            async move {
                let Operation::InvitedIntoGroup { group, inviter, invitees } = op else {
                    return;
                };
                if let Err(e) = engine.guard.handle_invitation(group.clone(), inviter, invitees).await
                {
                    error!(%group, "invitation handling failed: {e}");
                }
            }
        });

        let engine = self.clone();
        dispatcher.set_handler(OpKind::MessageReceived, move |op| {
            let engine = engine.clone();
            async move {
                let Operation::MessageReceived { message } = op else {
                    return;
                };
                let group = message.group.clone();
                if let Err(e) = engine.commands.handle_message(message).await {
                    error!(%group, "command handling failed: {e}");
                    // Best effort; the group deserves to know the command
                    // was seen even when its execution broke midway.
                    if let Err(e) =
                        engine.pool.random_client().send_message(&group, "command failed").await
                    {
                        warn!(%group, "failure notice not delivered: {e}");
                    }
                }
            }
        });

        let engine = self.clone();
        dispatcher.set_handler(OpKind::GroupAttributeChanged, move |op| {
            let engine = engine.clone();
            async move {
                let Operation::GroupAttributeChanged { group, actor, attribute } = op else {
                    return;
                };
                if let Err(e) =
                    engine.enforcer.handle_attribute_change(group.clone(), actor, attribute).await
                {
                    error!(%group, "attribute enforcement failed: {e}");
                }
            }
        });

        let engine = self.clone();
        dispatcher.set_handler(OpKind::KickedFromGroup, move |op| {
            let engine = engine.clone();
            async move {
                let Operation::KickedFromGroup { group, actor, evicted } = op else {
                    return;
                };
                if let Err(e) = engine.eviction.handle_kick(group.clone(), actor, evicted).await {
                    error!(%group, "eviction handling failed: {e}");
                }
            }
        });

        let engine = self.clone();
        dispatcher.set_handler(OpKind::InvitedIntoRoom, move |op| {
            let engine = engine.clone();
            async move {
                let Operation::InvitedIntoRoom { room } = op else {
                    return;
                };
                engine.handle_room_invitation(room).await;
            }
        });

        dispatcher
    }

    /// Drain the operation feed until every sender is dropped
    pub async fn run(self: Arc<Self>, feed: mpsc::Receiver<Operation>) {
        let maintenance = self.spawn_maintenance();
        info!(identities = self.pool.len(), "engine running");
        // Invitations extended while we were down are re-observed by the
        // transport; this is just a startup heads-up.
        match self.pool.primary().get_group_ids_invited().await {
            Ok(pending) if !pending.is_empty() => {
                info!(count = pending.len(), "invitations were pending before startup")
            }
            Ok(_) => {}
            Err(e) => warn!("could not list pending invitations: {e}"),
        }
        self.dispatcher().run(feed).await;
        for task in maintenance {
            task.abort();
        }
    }

    /// Direct rooms are not moderated; every identity leaves immediately.
    async fn handle_room_invitation(&self, room: RoomId) {
        info!(%room, "leaving direct room");
        let mut tasks = JoinSet::new();
        for client in self.pool.all() {
            let room = room.clone();
            tasks.spawn(async move { (client.actor_id(), client.leave_room(&room).await) });
        }
        while let Some(result) = tasks.join_next().await {
            if let Ok((actor, Err(e))) = result {
                warn!(%actor, %room, "room leave failed: {e}");
            }
        }
    }

    /// Periodic clearing of the violation tally and the command dedup set
    pub fn spawn_maintenance(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let violations = self.violations.clone();
        let clear_period = self.tunables.violation_clear_period;
        let tally_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(clear_period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                violations.clear();
            }
        });

        let dedup = self.dedup.clone();
        let window = self.tunables.dedup_window;
        let dedup_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(window);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                dedup.clear();
            }
        });

        vec![tally_task, dedup_task]
    }
}

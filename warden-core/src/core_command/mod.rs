//! Command pipeline
//!
//! Thin glue over the engine's services: prefix detection, phrase parsing,
//! a permission gate, and dispatch to a settings mutation or a status
//! query. Execution is deduplicated per group within a short window since
//! every controlled identity receives its own echo of each group message.

pub mod dedup;
pub mod parser;

pub use dedup::DedupWindow;
pub use parser::{parse_command, Command};

use crate::core_platform::{ChatMessage, PlatformError};
use crate::core_policy::{PolicyError, PolicyStore};
use crate::core_pool::IdentityPool;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors surfaced by command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Executes parsed group commands against the policy store and the pool
pub struct CommandPipeline {
    pool: Arc<IdentityPool>,
    store: Arc<dyn PolicyStore>,
    dedup: Arc<DedupWindow>,
    prefixes: Vec<String>,
    started_at: Instant,
}

impl CommandPipeline {
    pub fn new(
        pool: Arc<IdentityPool>,
        store: Arc<dyn PolicyStore>,
        dedup: Arc<DedupWindow>,
        prefixes: Vec<String>,
        started_at: Instant,
    ) -> Self {
        Self { pool, store, dedup, prefixes, started_at }
    }

    /// Handle one received message; non-commands are ignored silently
    pub async fn handle_message(&self, message: ChatMessage) -> Result<(), CommandError> {
        let Some(command) = parse_command(&message.text, &self.prefixes) else {
            return Ok(());
        };
        if !self.dedup.try_claim(&message.group, &message.text) {
            debug!(group = %message.group, "command already handled in this window");
            return Ok(());
        }

        match command {
            Command::Status => self.report_status(&message).await,
            Command::ShowLocks => self.report_locks(&message).await,
            Command::SetLock { kind, enabled } => self.set_lock(&message, kind, enabled).await,
            Command::SetSubAdmin { actor } => self.set_sub_admin(&message, actor).await,
            Command::Leave => self.leave(&message).await,
        }
    }

    async fn reply(&self, message: &ChatMessage, text: &str) -> Result<(), CommandError> {
        self.pool.random_client().send_message(&message.group, text).await?;
        Ok(())
    }

    async fn report_status(&self, message: &ChatMessage) -> Result<(), CommandError> {
        let uptime = self.started_at.elapsed().as_secs();
        let text = format!("identities: {} | uptime: {}s", self.pool.len(), uptime);
        self.reply(message, &text).await
    }

    async fn report_locks(&self, message: &ChatMessage) -> Result<(), CommandError> {
        let text = match self.store.policy(&message.group)? {
            Some(policy) => format!(
                "name: {} | picture: {} | link: {} | invite: {}",
                on_off(policy.name_locked),
                on_off(policy.picture_locked),
                on_off(policy.url_locked),
                on_off(policy.invite_locked),
            ),
            None => "this group is not under protection".to_string(),
        };
        self.reply(message, &text).await
    }

    async fn set_lock(
        &self,
        message: &ChatMessage,
        kind: crate::core_policy::LockKind,
        enabled: bool,
    ) -> Result<(), CommandError> {
        if !self.store.has_group_permission(&message.group, &message.sender)? {
            debug!(group = %message.group, sender = %message.sender, "lock change denied");
            return Ok(());
        }
        self.store.set_lock(&message.group, kind, enabled)?;
        info!(group = %message.group, lock = %kind, enabled, "lock changed");
        self.reply(message, &format!("{} lock {}", kind, on_off(enabled))).await
    }

    async fn set_sub_admin(
        &self,
        message: &ChatMessage,
        actor: Option<crate::core_platform::ActorId>,
    ) -> Result<(), CommandError> {
        // Only the inviter may delegate; a sub-admin cannot appoint another.
        let Some(policy) = self.store.policy(&message.group)? else {
            return Ok(());
        };
        if policy.inviter != message.sender {
            debug!(group = %message.group, sender = %message.sender, "sub-admin change denied");
            return Ok(());
        }
        self.store.set_sub_admin(&message.group, actor.as_ref())?;
        let text = match &actor {
            Some(actor) => format!("sub-admin set to {}", actor),
            None => "sub-admin cleared".to_string(),
        };
        info!(group = %message.group, "sub-admin updated");
        self.reply(message, &text).await
    }

    async fn leave(&self, message: &ChatMessage) -> Result<(), CommandError> {
        if !self.store.has_group_permission(&message.group, &message.sender)? {
            debug!(group = %message.group, sender = %message.sender, "leave denied");
            return Ok(());
        }
        info!(group = %message.group, "leaving group on command");
        let mut tasks = JoinSet::new();
        for client in self.pool.all() {
            let group = message.group.clone();
            tasks.spawn(async move { (client.actor_id(), client.leave_group(&group).await) });
        }
        while let Some(result) = tasks.join_next().await {
            if let Ok((actor, Err(e))) = result {
                warn!(%actor, group = %message.group, "leave failed: {e}");
            }
        }
        Ok(())
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

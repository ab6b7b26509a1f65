//! Identity pool
//!
//! Owns the set of controlled platform identities: one primary identity
//! (index 0, performs group-level administrative calls by convention) and
//! N-1 responder identities pooled for fan-out joins and kicks. Set
//! membership is immutable for the process lifetime; only the responder
//! rotation order mutates, and only from the eviction path, which runs on
//! the single dispatcher task.

use crate::core_platform::{ActorId, PlatformClient};
use rand::Rng;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Role of a controlled identity within the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRole {
    /// Performs administrative calls (ticket reissue, group updates)
    Primary,
    /// Pooled for fan-out joins, kicks and invitation cancellations
    Responder,
}

/// A controlled identity and its role
#[derive(Debug, Clone)]
pub struct PlatformIdentity {
    pub id: ActorId,
    pub role: IdentityRole,
}

/// Errors raised while assembling the pool
#[derive(Error, Debug)]
pub enum PoolError {
    /// The engine needs a primary plus at least one responder
    #[error("at least 2 identities are required, found {found}")]
    TooFewIdentities { found: usize },

    /// Two configured identities share the same actor id
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(ActorId),
}

/// The pool of controlled identities
pub struct IdentityPool {
    /// Index 0 is the primary identity
    clients: Vec<Arc<dyn PlatformClient>>,
    ids: Vec<ActorId>,
    /// Responder indices in current rotation order; an index withdrawn
    /// during reinstatement is absent until restored
    rotation: Mutex<Vec<usize>>,
}

impl IdentityPool {
    /// Build a pool from per-identity clients; the first client is primary
    pub fn new(clients: Vec<Arc<dyn PlatformClient>>) -> Result<Self, PoolError> {
        if clients.len() < 2 {
            return Err(PoolError::TooFewIdentities { found: clients.len() });
        }
        let ids: Vec<ActorId> = clients.iter().map(|c| c.actor_id()).collect();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(PoolError::DuplicateIdentity(id.clone()));
            }
        }
        let rotation = Mutex::new((1..clients.len()).collect());
        Ok(Self { clients, ids, rotation })
    }

    /// Number of controlled identities
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True when the pool holds no identities (never, by construction)
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// The primary identity's client
    pub fn primary(&self) -> Arc<dyn PlatformClient> {
        self.clients[0].clone()
    }

    /// The primary identity's actor id
    pub fn primary_id(&self) -> &ActorId {
        &self.ids[0]
    }

    /// Whether the given actor is one of the controlled identities
    pub fn is_controlled(&self, actor: &ActorId) -> bool {
        self.ids.contains(actor)
    }

    /// Client acting as the given identity, if controlled
    pub fn client_for(&self, actor: &ActorId) -> Option<Arc<dyn PlatformClient>> {
        self.ids.iter().position(|id| id == actor).map(|i| self.clients[i].clone())
    }

    /// All identities with their roles
    pub fn identities(&self) -> Vec<PlatformIdentity> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| PlatformIdentity {
                id: id.clone(),
                role: if i == 0 { IdentityRole::Primary } else { IdentityRole::Responder },
            })
            .collect()
    }

    /// Every client, primary first
    pub fn all(&self) -> Vec<Arc<dyn PlatformClient>> {
        self.clients.clone()
    }

    /// Responder clients in current rotation order
    pub fn responders(&self) -> Vec<Arc<dyn PlatformClient>> {
        let rotation = self.rotation.lock().unwrap();
        rotation.iter().map(|&i| self.clients[i].clone()).collect()
    }

    /// A uniformly random client from the whole pool (primary included)
    pub fn random_client(&self) -> Arc<dyn PlatformClient> {
        let pick = rand::rng().random_range(0..self.clients.len());
        self.clients[pick].clone()
    }

    /// A uniformly random responder currently in rotation
    pub fn random_responder(&self) -> Option<Arc<dyn PlatformClient>> {
        let rotation = self.rotation.lock().unwrap();
        if rotation.is_empty() {
            return None;
        }
        let pick = rand::rng().random_range(0..rotation.len());
        Some(self.clients[rotation[pick]].clone())
    }

    /// Swap a responder out of the rotation, returning its client
    ///
    /// Used while reinstating an evicted responder so the re-joining
    /// identity is not immediately handed new work mid-join. The caller
    /// must pair this with [`restore_responder`](Self::restore_responder).
    pub fn withdraw_responder(&self, actor: &ActorId) -> Option<Arc<dyn PlatformClient>> {
        let index = self.ids.iter().position(|id| id == actor)?;
        if index == 0 {
            return None;
        }
        let mut rotation = self.rotation.lock().unwrap();
        let slot = rotation.iter().position(|&i| i == index)?;
        rotation.remove(slot);
        Some(self.clients[index].clone())
    }

    /// Append a previously withdrawn responder back to the rotation
    pub fn restore_responder(&self, actor: &ActorId) {
        if let Some(index) = self.ids.iter().position(|id| id == actor) {
            if index == 0 {
                return;
            }
            let mut rotation = self.rotation.lock().unwrap();
            if !rotation.contains(&index) {
                rotation.push(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_platform::MockPlatform;

    fn pool_of(platform: &MockPlatform, ids: &[&str]) -> IdentityPool {
        let clients = ids
            .iter()
            .map(|id| platform.client(*id) as Arc<dyn PlatformClient>)
            .collect();
        IdentityPool::new(clients).unwrap()
    }

    #[test]
    fn test_pool_requires_two_identities() {
        let platform = MockPlatform::new();
        let clients = vec![platform.client("only") as Arc<dyn PlatformClient>];
        assert!(matches!(
            IdentityPool::new(clients),
            Err(PoolError::TooFewIdentities { found: 1 })
        ));
    }

    #[test]
    fn test_primary_and_membership() {
        let platform = MockPlatform::new();
        let pool = pool_of(&platform, &["w0", "w1", "w2"]);

        assert_eq!(pool.primary_id(), &ActorId::new("w0"));
        assert!(pool.is_controlled(&ActorId::new("w1")));
        assert!(!pool.is_controlled(&ActorId::new("stranger")));
        assert_eq!(pool.responders().len(), 2);
    }

    #[test]
    fn test_random_responder_is_never_primary() {
        let platform = MockPlatform::new();
        let pool = pool_of(&platform, &["w0", "w1", "w2"]);

        for _ in 0..32 {
            let responder = pool.random_responder().unwrap();
            assert_ne!(responder.actor_id(), ActorId::new("w0"));
        }
    }

    #[test]
    fn test_withdraw_and_restore_responder() {
        let platform = MockPlatform::new();
        let pool = pool_of(&platform, &["w0", "w1", "w2"]);

        let withdrawn = pool.withdraw_responder(&ActorId::new("w1")).unwrap();
        assert_eq!(withdrawn.actor_id(), ActorId::new("w1"));
        assert_eq!(pool.responders().len(), 1);
        assert_eq!(pool.responders()[0].actor_id(), ActorId::new("w2"));

        pool.restore_responder(&ActorId::new("w1"));
        assert_eq!(pool.responders().len(), 2);

        // Restoring twice must not duplicate the slot
        pool.restore_responder(&ActorId::new("w1"));
        assert_eq!(pool.responders().len(), 2);
    }

    #[test]
    fn test_primary_cannot_be_withdrawn() {
        let platform = MockPlatform::new();
        let pool = pool_of(&platform, &["w0", "w1"]);
        assert!(pool.withdraw_responder(&ActorId::new("w0")).is_none());
    }
}

/*
    Scenario tests for the assembled engine

    Each suite drives the dispatcher with operation-feed payloads against
    the shared mock platform and asserts on the resulting platform calls
    and policy-store rows:
    - invitation claiming and rejection
    - attribute lock enforcement and canonical adoption
    - eviction, reinstatement, and violation escalation
    - command parsing, permissions, and dedup
*/

pub mod enforce_scenarios;
pub mod guard_scenarios;

use crate::config::EngineTunables;
use crate::core_dispatch::{Engine, OperationDispatcher};
use crate::core_platform::{ActorId, Group, GroupId, MockPlatform, PlatformClient};
use crate::core_policy::MemoryPolicyStore;
use crate::core_pool::IdentityPool;
use std::sync::Arc;

/// One assembled engine over a mock platform and an in-memory store
pub struct Scenario {
    pub platform: MockPlatform,
    pub store: Arc<MemoryPolicyStore>,
    pub engine: Arc<Engine>,
    pub dispatcher: OperationDispatcher,
}

/// Build a scenario with the given controlled identities (first is primary)
pub fn scenario(identities: &[&str], tunables: EngineTunables) -> Scenario {
    let platform = MockPlatform::new();
    let clients: Vec<Arc<dyn PlatformClient>> = identities
        .iter()
        .map(|id| platform.client(*id) as Arc<dyn PlatformClient>)
        .collect();
    let pool = Arc::new(IdentityPool::new(clients).unwrap());
    let store = Arc::new(MemoryPolicyStore::new());
    let engine = Engine::new(pool, store.clone(), tunables);
    let dispatcher = engine.dispatcher();
    Scenario { platform, store, engine, dispatcher }
}

pub fn gid(id: &str) -> GroupId {
    GroupId::new(id)
}

pub fn aid(id: &str) -> ActorId {
    ActorId::new(id)
}

/// Seedable group snapshot
pub fn group(id: &str, name: &str, prevented: bool, members: &[&str]) -> Group {
    Group {
        id: gid(id),
        name: name.to_string(),
        picture_ref: "pic-0".to_string(),
        prevented_join_by_ticket: prevented,
        members: members.iter().map(|m| aid(m)).collect(),
    }
}

impl Scenario {
    /// Indices (in call order) of calls with the given op name issued by
    /// any of the given identities
    pub fn call_positions(&self, op: &str, actors: &[&str]) -> Vec<usize> {
        self.platform
            .calls()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.op == op && actors.contains(&c.actor.as_str()))
            .map(|(i, _)| i)
            .collect()
    }
}

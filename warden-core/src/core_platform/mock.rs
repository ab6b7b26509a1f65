//! Mock platform for testing the engine without a real transport
//!
//! A single [`MockPlatform`] holds shared group state; [`MockClient`]
//! handles implement [`PlatformClient`] per identity against that shared
//! state, and every call is recorded so tests can assert on ordering
//! (e.g. kick-before-restore). Failures can be injected per
//! (identity, call) pair to exercise partial-failure paths.

use super::client::PlatformClient;
use super::error::{PlatformError, PlatformResult};
use super::types::{ActorId, Group, GroupId, RoomId, Ticket};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// One platform call as seen by the mock, in issue order
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Identity that issued the call
    pub actor: ActorId,
    /// Name of the trait method
    pub op: &'static str,
    /// Group the call addressed, if any
    pub group: Option<GroupId>,
    /// Target actors named by the call, if any
    pub targets: Vec<ActorId>,
}

#[derive(Debug, Clone)]
struct MockGroup {
    group: Group,
    /// invitee -> inviter
    pending_invites: HashMap<ActorId, ActorId>,
    current_ticket: Option<Ticket>,
}

#[derive(Debug, Default)]
struct MockState {
    groups: HashMap<GroupId, MockGroup>,
    contacts: HashMap<ActorId, String>,
    calls: Vec<RecordedCall>,
    messages: Vec<(ActorId, GroupId, String)>,
    failures: HashSet<(ActorId, &'static str)>,
}

impl MockState {
    fn record(
        &mut self,
        actor: &ActorId,
        op: &'static str,
        group: Option<&GroupId>,
        targets: &[ActorId],
    ) -> PlatformResult<()> {
        self.calls.push(RecordedCall {
            actor: actor.clone(),
            op,
            group: group.cloned(),
            targets: targets.to_vec(),
        });
        if self.failures.contains(&(actor.clone(), op)) {
            return Err(PlatformError::Transport("injected failure".to_string()));
        }
        Ok(())
    }

    fn group_mut(&mut self, id: &GroupId) -> PlatformResult<&mut MockGroup> {
        self.groups
            .get_mut(id)
            .ok_or_else(|| PlatformError::GroupNotFound(id.to_string()))
    }
}

/// Shared mock platform state and test helpers
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    /// Create an empty mock platform
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a client handle acting as the given identity
    pub fn client(&self, actor: impl Into<ActorId>) -> Arc<MockClient> {
        Arc::new(MockClient { actor: actor.into(), state: self.state.clone() })
    }

    /// Seed a group into the platform
    pub fn add_group(&self, group: Group) {
        let mut state = self.state.lock().unwrap();
        state.groups.insert(
            group.id.clone(),
            MockGroup { group, pending_invites: HashMap::new(), current_ticket: None },
        );
    }

    /// Seed a pending direct invitation
    pub fn add_pending_invite(&self, group: &GroupId, invitee: &ActorId, inviter: &ActorId) {
        let mut state = self.state.lock().unwrap();
        if let Some(g) = state.groups.get_mut(group) {
            g.pending_invites.insert(invitee.clone(), inviter.clone());
        }
    }

    /// Make every `op` call issued by `actor` fail with a transport error
    pub fn fail_on(&self, actor: impl Into<ActorId>, op: &'static str) {
        self.state.lock().unwrap().failures.insert((actor.into(), op));
    }

    /// Clear a previously injected failure
    pub fn clear_failure(&self, actor: impl Into<ActorId>, op: &'static str) {
        self.state.lock().unwrap().failures.remove(&(actor.into(), op));
    }

    /// Current snapshot of a group, if it exists
    pub fn group(&self, id: &GroupId) -> Option<Group> {
        self.state.lock().unwrap().groups.get(id).map(|g| g.group.clone())
    }

    /// Pending invitees of a group
    pub fn pending_invitees(&self, id: &GroupId) -> Vec<ActorId> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(id)
            .map(|g| g.pending_invites.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call issued so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls filtered by trait-method name
    pub fn calls_named(&self, op: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    /// Messages sent so far as (sender identity, group, text)
    pub fn messages(&self) -> Vec<(ActorId, GroupId, String)> {
        self.state.lock().unwrap().messages.clone()
    }
}

/// A [`PlatformClient`] acting as one identity against the shared mock state
pub struct MockClient {
    actor: ActorId,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl PlatformClient for MockClient {
    fn actor_id(&self) -> ActorId {
        self.actor.clone()
    }

    async fn send_message(&self, group: &GroupId, text: &str) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "send_message", Some(group), &[])?;
        state.messages.push((self.actor.clone(), group.clone(), text.to_string()));
        Ok(())
    }

    async fn get_group(&self, group: &GroupId) -> PlatformResult<Group> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "get_group", Some(group), &[])?;
        Ok(state.group_mut(group)?.group.clone())
    }

    async fn get_group_without_members(&self, group: &GroupId) -> PlatformResult<Group> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "get_group_without_members", Some(group), &[])?;
        let mut snapshot = state.group_mut(group)?.group.clone();
        snapshot.members.clear();
        Ok(snapshot)
    }

    async fn update_group(&self, group: &Group) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "update_group", Some(&group.id), &[])?;
        let stored = state.group_mut(&group.id)?;
        stored.group.name = group.name.clone();
        stored.group.picture_ref = group.picture_ref.clone();
        stored.group.prevented_join_by_ticket = group.prevented_join_by_ticket;
        Ok(())
    }

    async fn kick_from_group(&self, group: &GroupId, targets: &[ActorId]) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "kick_from_group", Some(group), targets)?;
        let stored = state.group_mut(group)?;
        stored.group.members.retain(|m| !targets.contains(m));
        Ok(())
    }

    async fn reissue_invitation_ticket(&self, group: &GroupId) -> PlatformResult<Ticket> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "reissue_invitation_ticket", Some(group), &[])?;
        let ticket = Ticket::new(uuid::Uuid::new_v4().to_string());
        state.group_mut(group)?.current_ticket = Some(ticket.clone());
        Ok(ticket)
    }

    async fn accept_invitation_by_ticket(
        &self,
        group: &GroupId,
        ticket: &Ticket,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "accept_invitation_by_ticket", Some(group), &[])?;
        let stored = state.group_mut(group)?;
        if stored.group.prevented_join_by_ticket {
            return Err(PlatformError::Rejected("join by ticket is prevented".to_string()));
        }
        if stored.current_ticket.as_ref() != Some(ticket) {
            return Err(PlatformError::Rejected("stale invitation ticket".to_string()));
        }
        if !stored.group.members.contains(&self.actor) {
            stored.group.members.push(self.actor.clone());
        }
        Ok(())
    }

    async fn accept_invitation(&self, group: &GroupId) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "accept_invitation", Some(group), &[])?;
        let stored = state.group_mut(group)?;
        if stored.pending_invites.remove(&self.actor).is_none() {
            return Err(PlatformError::Rejected("no pending invitation".to_string()));
        }
        if !stored.group.members.contains(&self.actor) {
            stored.group.members.push(self.actor.clone());
        }
        Ok(())
    }

    async fn reject_invitation(&self, group: &GroupId) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "reject_invitation", Some(group), &[])?;
        let stored = state.group_mut(group)?;
        if stored.pending_invites.remove(&self.actor).is_none() {
            return Err(PlatformError::Rejected("no pending invitation".to_string()));
        }
        Ok(())
    }

    async fn cancel_invitation(&self, group: &GroupId, targets: &[ActorId]) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "cancel_invitation", Some(group), targets)?;
        let stored = state.group_mut(group)?;
        for target in targets {
            stored.pending_invites.remove(target);
        }
        Ok(())
    }

    async fn invite_into_group(&self, group: &GroupId, targets: &[ActorId]) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "invite_into_group", Some(group), targets)?;
        let inviter = self.actor.clone();
        let stored = state.group_mut(group)?;
        for target in targets {
            stored.pending_invites.insert(target.clone(), inviter.clone());
        }
        Ok(())
    }

    async fn leave_group(&self, group: &GroupId) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "leave_group", Some(group), &[])?;
        let stored = state.group_mut(group)?;
        stored.group.members.retain(|m| m != &self.actor);
        Ok(())
    }

    async fn leave_room(&self, _room: &RoomId) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "leave_room", None, &[])?;
        Ok(())
    }

    async fn get_contact(&self, actor: &ActorId) -> PlatformResult<String> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "get_contact", None, std::slice::from_ref(actor))?;
        Ok(state.contacts.get(actor).cloned().unwrap_or_else(|| actor.to_string()))
    }

    async fn find_and_add_contact(&self, actor: &ActorId) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "find_and_add_contact", None, std::slice::from_ref(actor))?;
        let name = actor.to_string();
        state.contacts.entry(actor.clone()).or_insert(name);
        Ok(())
    }

    async fn get_group_ids_invited(&self) -> PlatformResult<Vec<GroupId>> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.actor, "get_group_ids_invited", None, &[])?;
        Ok(state
            .groups
            .iter()
            .filter(|(_, g)| g.pending_invites.contains_key(&self.actor))
            .map(|(id, _)| id.clone())
            .collect())
    }
}

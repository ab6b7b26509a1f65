//! PlatformClient trait, the abstraction over the chat-platform transport
//!
//! Every controlled identity owns one `PlatformClient`; all calls made
//! through a client are scoped to that identity, and the engine decides
//! which identity issues each call. The concrete transport lives outside
//! this crate; tests and the harness use [`super::mock::MockPlatform`].

use super::error::PlatformResult;
use super::types::{ActorId, Group, GroupId, RoomId, Ticket};
use async_trait::async_trait;

/// Actor-scoped capability interface consumed by the engine
///
/// Implementations are expected to bound each call with an internal
/// timeout; a stuck call blocks the dispatcher (that is the backpressure
/// mechanism), but must eventually surface as
/// [`super::PlatformError::Timeout`].
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// The identity this client acts as
    fn actor_id(&self) -> ActorId;

    /// Send a plain text message to a group
    async fn send_message(&self, group: &GroupId, text: &str) -> PlatformResult<()>;

    /// Fetch a full group snapshot, member list included
    async fn get_group(&self, group: &GroupId) -> PlatformResult<Group>;

    /// Fetch a group snapshot without its member list (cheaper round trip)
    async fn get_group_without_members(&self, group: &GroupId) -> PlatformResult<Group>;

    /// Push the mutable attributes of a snapshot back to the platform
    ///
    /// Applies name, picture reference and join-by-ticket prevention;
    /// membership is never written through this call.
    async fn update_group(&self, group: &Group) -> PlatformResult<()>;

    /// Remove the given actors from a group
    async fn kick_from_group(&self, group: &GroupId, targets: &[ActorId]) -> PlatformResult<()>;

    /// Invalidate the current invitation ticket and mint a fresh one
    async fn reissue_invitation_ticket(&self, group: &GroupId) -> PlatformResult<Ticket>;

    /// Join a group via a previously issued invitation ticket
    async fn accept_invitation_by_ticket(
        &self,
        group: &GroupId,
        ticket: &Ticket,
    ) -> PlatformResult<()>;

    /// Accept a pending direct invitation into a group
    async fn accept_invitation(&self, group: &GroupId) -> PlatformResult<()>;

    /// Reject a pending direct invitation into a group
    async fn reject_invitation(&self, group: &GroupId) -> PlatformResult<()>;

    /// Cancel pending invitations extended to the given actors
    async fn cancel_invitation(&self, group: &GroupId, targets: &[ActorId]) -> PlatformResult<()>;

    /// Invite the given actors into a group
    async fn invite_into_group(&self, group: &GroupId, targets: &[ActorId]) -> PlatformResult<()>;

    /// Leave a group
    async fn leave_group(&self, group: &GroupId) -> PlatformResult<()>;

    /// Leave a direct room
    async fn leave_room(&self, room: &RoomId) -> PlatformResult<()>;

    /// Look up an actor's display name
    async fn get_contact(&self, actor: &ActorId) -> PlatformResult<String>;

    /// Add an actor to this identity's contact list, resolving it first
    async fn find_and_add_contact(&self, actor: &ActorId) -> PlatformResult<()>;

    /// List the groups this identity currently has pending invitations for
    async fn get_group_ids_invited(&self) -> PlatformResult<Vec<GroupId>>;
}

//! Type definitions for the platform capability layer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a group on the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    /// Create a GroupId from any string-ish value
    pub fn new(id: impl Into<String>) -> Self {
        GroupId(id.into())
    }

    /// Get the underlying string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        GroupId(id.to_string())
    }
}

/// Stable identifier of an actor (controlled identity or outside user)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    /// Create an ActorId from any string-ish value
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    /// Get the underlying string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        ActorId(id.to_string())
    }
}

/// Identifier of a direct/room (non-group) conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    /// Create a RoomId from any string-ish value
    pub fn new(id: impl Into<String>) -> Self {
        RoomId(id.into())
    }

    /// Get the underlying string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque invitation ticket issued by the platform for join-by-link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket(pub String);

impl Ticket {
    /// Create a Ticket from any string-ish value
    pub fn new(id: impl Into<String>) -> Self {
        Ticket(id.into())
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a group as reported by the platform
///
/// The engine never caches this beyond the handling of a single operation;
/// every decision re-fetches current truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier
    pub id: GroupId,

    /// Current display name
    pub name: String,

    /// Reference to the current group picture (platform-scoped token)
    pub picture_ref: String,

    /// Whether joining via a shared invitation ticket is blocked
    pub prevented_join_by_ticket: bool,

    /// Current member actor ids (empty when fetched without members)
    pub members: Vec<ActorId>,
}

/// The group attribute named by an attribute-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupAttribute {
    /// Display name changed
    Name,
    /// Group picture changed
    Picture,
    /// Join-by-ticket prevention toggled
    TicketPrevention,
}

/// A text message observed in a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Group the message was posted in
    pub group: GroupId,

    /// Actor who sent it
    pub sender: ActorId,

    /// Raw message text
    pub text: String,
}

/// One inbound platform operation, consumed exactly once per dispatch cycle
#[derive(Debug, Clone)]
pub enum Operation {
    /// An invitation into a group was observed (either for a controlled
    /// identity or a third party invited into an occupied group)
    InvitedIntoGroup {
        group: GroupId,
        inviter: ActorId,
        invitees: Vec<ActorId>,
    },

    /// A text message was received
    MessageReceived { message: ChatMessage },

    /// A group attribute was changed by some actor
    GroupAttributeChanged {
        group: GroupId,
        actor: ActorId,
        attribute: GroupAttribute,
    },

    /// One or more actors were kicked out of a group
    KickedFromGroup {
        group: GroupId,
        actor: ActorId,
        evicted: Vec<ActorId>,
    },

    /// A controlled identity was invited into a direct room
    InvitedIntoRoom { room: RoomId },
}

/// Discriminant of [`Operation`], used as the dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    InvitedIntoGroup,
    MessageReceived,
    GroupAttributeChanged,
    KickedFromGroup,
    InvitedIntoRoom,
}

impl Operation {
    /// The kind this operation dispatches on
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::InvitedIntoGroup { .. } => OpKind::InvitedIntoGroup,
            Operation::MessageReceived { .. } => OpKind::MessageReceived,
            Operation::GroupAttributeChanged { .. } => OpKind::GroupAttributeChanged,
            Operation::KickedFromGroup { .. } => OpKind::KickedFromGroup,
            Operation::InvitedIntoRoom { .. } => OpKind::InvitedIntoRoom,
        }
    }
}

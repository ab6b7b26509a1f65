//! Protection policy data model

use crate::core_platform::{ActorId, GroupId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four owner-toggleable protection locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockKind {
    /// Display name is locked to the canonical value
    Name,
    /// Group picture is locked to the canonical reference
    Picture,
    /// Join-by-ticket prevention must stay enabled
    Url,
    /// Third-party invitations are cancelled
    Invite,
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockKind::Name => "name",
            LockKind::Picture => "picture",
            LockKind::Url => "url",
            LockKind::Invite => "invite",
        };
        write!(f, "{}", name)
    }
}

/// Per-group protection policy
///
/// Created on the first successful join (primary identity accepting a
/// whitelisted inviter's invitation) and mutated by settings commands and
/// by the enforcement engine when it adopts a new canonical value. Never
/// deleted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionPolicy {
    /// Group this policy protects
    pub group: GroupId,

    pub name_locked: bool,
    pub picture_locked: bool,
    pub url_locked: bool,
    pub invite_locked: bool,

    /// Last-known-good display name, restored on unauthorized change
    pub canonical_name: Option<String>,

    /// Last-known-good picture reference
    pub canonical_picture: Option<String>,

    /// Actor who invited the bots in; holds group permission
    pub inviter: ActorId,

    /// Optional second actor holding group permission
    pub sub_admin: Option<ActorId>,
}

impl ProtectionPolicy {
    /// Fresh policy for a newly claimed group: all locks off, no canonical
    /// values captured yet
    pub fn new(group: GroupId, inviter: ActorId) -> Self {
        Self {
            group,
            name_locked: false,
            picture_locked: false,
            url_locked: false,
            invite_locked: false,
            canonical_name: None,
            canonical_picture: None,
            inviter,
            sub_admin: None,
        }
    }

    /// Read one lock flag
    pub fn lock(&self, kind: LockKind) -> bool {
        match kind {
            LockKind::Name => self.name_locked,
            LockKind::Picture => self.picture_locked,
            LockKind::Url => self.url_locked,
            LockKind::Invite => self.invite_locked,
        }
    }

    /// Whether the given actor holds group permission under this policy
    pub fn permits(&self, actor: &ActorId) -> bool {
        self.inviter == *actor || self.sub_admin.as_ref() == Some(actor)
    }
}

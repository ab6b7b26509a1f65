//! Platform capability layer
//!
//! The engine never speaks the chat platform's wire protocol; it consumes
//! the actor-scoped [`PlatformClient`] capability interface, one instance
//! per controlled identity. This module defines the data types carried by
//! the operation feed, the capability trait, its error taxonomy, and a
//! shared-state mock used by tests and the scenario harness.

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::PlatformClient;
pub use error::{PlatformError, PlatformResult};
pub use mock::{MockClient, MockPlatform, RecordedCall};
pub use types::{
    ActorId, ChatMessage, Group, GroupAttribute, GroupId, OpKind, Operation, RoomId, Ticket,
};

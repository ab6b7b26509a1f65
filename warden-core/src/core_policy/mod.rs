//! Protection policy storage
//!
//! Per-group policy flags (locked name/picture/invite-link, invite
//! whitelisting), canonical values, and the inviter whitelist, behind the
//! [`PolicyStore`] trait. Two implementations: SQLite for deployments,
//! in-memory for tests and the harness.

pub mod error;
pub mod memory;
pub mod migrations;
pub mod policy;
pub mod sql_store;
pub mod store;

pub use error::{PolicyError, PolicyResult};
pub use memory::MemoryPolicyStore;
pub use migrations::{migrate, CURRENT_POLICY_SCHEMA_VERSION};
pub use policy::{LockKind, ProtectionPolicy};
pub use sql_store::SqlPolicyStore;
pub use store::PolicyStore;

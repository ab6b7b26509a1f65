//! Error types for the policy store

use thiserror::Error;

/// Result type for policy-store operations
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors surfaced by policy-store reads and writes
///
/// A failed read aborts the enforcement branch being evaluated (the group
/// is treated as unprotected for that one decision rather than risking a
/// false-positive kick).
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The underlying storage rejected the operation
    #[error("storage failure: {0}")]
    Storage(String),

    /// No connection could be drawn from the pool
    #[error("storage pool failure: {0}")]
    Pool(String),
}

//! Error types for platform-facing calls

use thiserror::Error;

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors surfaced by the platform capability interface
///
/// Nothing here is fatal to the process; handlers log the failure, abort the
/// branch being evaluated, and let the next observed operation get a fresh
/// chance.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Network or remote failure on a platform call
    #[error("transport failure: {0}")]
    Transport(String),

    /// The platform refused the call for the issuing identity
    #[error("call rejected by platform: {0}")]
    Rejected(String),

    /// The referenced group is unknown to the platform
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// The call did not complete within the internal bound
    #[error("platform call timed out")]
    Timeout,
}

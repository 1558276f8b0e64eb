//! Shared error definitions for gateway primitives.

use thiserror::Error;

/// Result alias used by primitive constructors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Backend identifier failed validation.
    #[error("invalid backend id `{id}`: {reason}")]
    InvalidBackendId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Request identifier failed validation.
    #[error("invalid request id: {reason}")]
    InvalidRequestId {
        /// Human-readable reason for rejection.
        reason: String,
    },
}

//! Transport errors.

use std::time::Duration;

use gateway_primitives::{CallError, ErrorKind};
use thiserror::Error;

/// Result alias used by transports.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures that prevented an HTTP response from being received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived within the deadline.
    #[error("request timed out after {after:?}")]
    Timeout {
        /// Deadline that elapsed.
        after: Duration,
    },

    /// The connection could not be established or was interrupted.
    #[error("connection failed: {reason}")]
    Connect {
        /// Underlying failure.
        reason: String,
    },

    /// The request could not be built (bad URL, header or body).
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong.
        reason: String,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {reason}")]
    Body {
        /// Underlying failure.
        reason: String,
    },
}

impl TransportError {
    /// Convenience constructor for connection failures.
    #[must_use]
    pub fn connect(reason: impl Into<String>) -> Self {
        Self::Connect {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Failure classification reported to callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidArgument,
            Self::Timeout { .. } | Self::Connect { .. } | Self::Body { .. } => {
                ErrorKind::NetworkFailure
            }
        }
    }
}

impl From<TransportError> for CallError {
    fn from(err: TransportError) -> Self {
        CallError::new(err.kind(), err.to_string())
    }
}

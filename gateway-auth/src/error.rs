//! Authentication errors.

use gateway_primitives::{CallError, ErrorKind};
use thiserror::Error;

use crate::lifecycle::{AuthEvent, AuthState};

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised by the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The backend needs a session but no credentials are configured.
    #[error("no credentials configured for {domain}")]
    MissingCredentials {
        /// Backend or login domain lacking credentials.
        domain: String,
    },

    /// The login request did not yield a session.
    #[error("login to {domain} failed: {reason}")]
    LoginFailed {
        /// Login domain.
        domain: String,
        /// What went wrong.
        reason: String,
        /// HTTP status of the login response, if one arrived.
        status_code: Option<u16>,
    },

    /// An event was applied in a state that does not accept it.
    #[error("invalid auth transition from {from:?} via {event:?} for {domain}")]
    InvalidTransition {
        /// Login domain.
        domain: String,
        /// State prior to the attempted transition.
        from: AuthState,
        /// Rejected event.
        event: AuthEvent,
    },
}

impl AuthError {
    /// Convenience constructor for login failures.
    #[must_use]
    pub fn login_failed(domain: impl Into<String>, reason: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::LoginFailed {
            domain: domain.into(),
            reason: reason.into(),
            status_code,
        }
    }
}

impl From<AuthError> for CallError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::MissingCredentials { .. } => CallError::new(ErrorKind::MissingCredentials, message),
            AuthError::LoginFailed { status_code, .. } => {
                let error = CallError::new(ErrorKind::LoginFailed, message);
                match status_code {
                    Some(status) => error.with_status_code(status),
                    None => error,
                }
            }
            AuthError::InvalidTransition { .. } => CallError::internal(message),
        }
    }
}

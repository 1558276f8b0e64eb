//! Authentication state machine for one login domain.

use serde::Serialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// States a login domain can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No credentials are configured.
    NoCredentials,
    /// Credentials are configured but no session is held.
    CredentialsSet,
    /// A login request is in flight.
    Authenticating,
    /// A session is held.
    Authenticated,
}

impl AuthState {
    /// Returns `true` when a session is held.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Events that drive [`AuthLifecycle`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Credentials were (re)configured; any session is discarded.
    SetCredentials,
    /// Credentials were removed.
    ClearCredentials,
    /// A login request was issued.
    BeginLogin,
    /// The login returned a session token.
    LoginSucceeded,
    /// The login failed.
    LoginFailed,
    /// The backend rejected the session.
    Invalidate,
}

/// Tracks the [`AuthState`] of one login domain.
#[derive(Debug, Clone)]
pub struct AuthLifecycle {
    domain: String,
    state: AuthState,
}

impl AuthLifecycle {
    /// Creates a lifecycle in `initial` state.
    #[must_use]
    pub fn new(domain: impl Into<String>, initial: AuthState) -> Self {
        Self {
            domain: domain.into(),
            state: initial,
        }
    }

    /// Login domain this lifecycle belongs to.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Applies an event, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidTransition`] when the event is not
    /// allowed from the current state.
    pub fn transition(&mut self, event: AuthEvent) -> AuthResult<AuthState> {
        let next = match (self.state, event) {
            (_, AuthEvent::SetCredentials)
            | (AuthState::Authenticating, AuthEvent::LoginFailed)
            | (AuthState::CredentialsSet | AuthState::Authenticated, AuthEvent::Invalidate) => {
                Some(AuthState::CredentialsSet)
            }
            (_, AuthEvent::ClearCredentials) => Some(AuthState::NoCredentials),
            (AuthState::CredentialsSet | AuthState::Authenticated, AuthEvent::BeginLogin) => {
                Some(AuthState::Authenticating)
            }
            (AuthState::Authenticating, AuthEvent::LoginSucceeded) => Some(AuthState::Authenticated),
            _ => None,
        };

        let Some(next_state) = next else {
            return Err(AuthError::InvalidTransition {
                domain: self.domain.clone(),
                from: self.state,
                event,
            });
        };

        if next_state != self.state {
            debug!(
                domain = %self.domain,
                ?self.state,
                ?next_state,
                ?event,
                "auth lifecycle transition"
            );
            self.state = next_state;
        }

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_flow() {
        let mut lifecycle = AuthLifecycle::new("http://auth/login", AuthState::NoCredentials);
        lifecycle.transition(AuthEvent::SetCredentials).unwrap();
        assert_eq!(lifecycle.state(), AuthState::CredentialsSet);
        lifecycle.transition(AuthEvent::BeginLogin).unwrap();
        assert_eq!(lifecycle.state(), AuthState::Authenticating);
        lifecycle.transition(AuthEvent::LoginSucceeded).unwrap();
        assert!(lifecycle.state().is_authenticated());
    }

    #[test]
    fn failed_login_reverts_to_credentials_set() {
        let mut lifecycle = AuthLifecycle::new("d", AuthState::CredentialsSet);
        lifecycle.transition(AuthEvent::BeginLogin).unwrap();
        lifecycle.transition(AuthEvent::LoginFailed).unwrap();
        assert_eq!(lifecycle.state(), AuthState::CredentialsSet);
    }

    #[test]
    fn invalidation_is_reactive_and_idempotent() {
        let mut lifecycle = AuthLifecycle::new("d", AuthState::Authenticated);
        lifecycle.transition(AuthEvent::Invalidate).unwrap();
        lifecycle.transition(AuthEvent::Invalidate).unwrap();
        assert_eq!(lifecycle.state(), AuthState::CredentialsSet);
    }

    #[test]
    fn invalid_transitions_error() {
        let mut lifecycle = AuthLifecycle::new("d", AuthState::NoCredentials);
        let err = lifecycle.transition(AuthEvent::BeginLogin).expect_err("no credentials");
        assert!(matches!(
            err,
            AuthError::InvalidTransition {
                from: AuthState::NoCredentials,
                event: AuthEvent::BeginLogin,
                ..
            }
        ));

        // a login that completes after credentials were replaced is stale
        let mut lifecycle = AuthLifecycle::new("d", AuthState::Authenticating);
        lifecycle.transition(AuthEvent::SetCredentials).unwrap();
        assert!(lifecycle.transition(AuthEvent::LoginSucceeded).is_err());
    }
}

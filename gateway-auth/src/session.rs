//! Session tokens and the per-domain slot that owns them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use gateway_telemetry::redact;
use serde::Serialize;

use crate::error::AuthError;
use crate::lifecycle::{AuthLifecycle, AuthState};

/// An opaque session token obtained by logging in.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    cookie_name: String,
    issued_at: DateTime<Utc>,
    generation: u64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &redact(&self.token))
            .field("cookie_name", &self.cookie_name)
            .field("issued_at", &self.issued_at)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Session {
    pub(crate) fn new(token: String, cookie_name: String, generation: u64) -> Self {
        Self {
            token,
            cookie_name,
            issued_at: Utc::now(),
            generation,
        }
    }

    /// Token value.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Name of the cookie carrying the token.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// `Cookie` header value presenting this session.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie_name, self.token)
    }

    /// When the login completed.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Login attempt that produced this session.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Observable state of one login domain. Never carries the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    /// Login URL identifying the domain.
    pub domain: String,
    /// Current state.
    pub state: AuthState,
    /// Whether a session is held.
    pub has_session: bool,
    /// When the held session was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub(crate) struct SlotState {
    pub(crate) lifecycle: AuthLifecycle,
    pub(crate) session: Option<Arc<Session>>,
    pub(crate) last_failure: Option<AuthError>,
}

/// Session storage and login serialisation for one login domain.
///
/// `login_gate` is held for the whole login exchange. `generation` counts
/// completed login attempts so that callers which queued behind a login can
/// tell it already happened.
#[derive(Debug)]
pub(crate) struct SessionSlot {
    pub(crate) domain: String,
    pub(crate) login_gate: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    state: Mutex<SlotState>,
}

impl SessionSlot {
    pub(crate) fn new(domain: String, initial: AuthState) -> Self {
        Self {
            domain: domain.clone(),
            login_gate: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            state: Mutex::new(SlotState {
                lifecycle: AuthLifecycle::new(domain, initial),
                session: None,
                last_failure: None,
            }),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn session(&self) -> Option<Arc<Session>> {
        self.state().session.clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Marks a login attempt as finished and returns the new generation.
    pub(crate) fn finish_attempt(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn status(&self) -> AuthStatus {
        let state = self.state();
        AuthStatus {
            domain: self.domain.clone(),
            state: state.lifecycle.state(),
            has_session: state.session.is_some(),
            issued_at: state.session.as_ref().map(|session| session.issued_at()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let session = Session::new("0123456789ABCDEF".into(), "JSESSIONID".into(), 1);
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("0123456789ABCDEF"));
        assert!(rendered.contains("0123…"));
        assert_eq!(session.cookie_header(), "JSESSIONID=0123456789ABCDEF");
    }

    #[test]
    fn status_never_exposes_token() {
        let slot = SessionSlot::new("http://auth/login".into(), AuthState::CredentialsSet);
        let status = slot.status();
        assert_eq!(status.state, AuthState::CredentialsSet);
        assert!(!status.has_session);
        assert_eq!(slot.finish_attempt(), 1);
        assert_eq!(slot.generation(), 1);
    }
}

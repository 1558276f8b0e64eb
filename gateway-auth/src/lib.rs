//! Credentials, sessions and login for the gateway.
//!
//! [`SessionManager`] owns every credential and session token. Dispatched
//! calls ask it for an [`AuthContext`]; authorization failures are reported
//! back through [`SessionManager::reauthenticate`].

#![warn(missing_docs, clippy::pedantic)]

pub mod credentials;
mod error;
pub mod lifecycle;
pub mod manager;
pub mod session;

pub use credentials::Credentials;
pub use error::{AuthError, AuthResult};
pub use lifecycle::{AuthEvent, AuthLifecycle, AuthState};
pub use manager::{AuthContext, LoginOutcome, LoginSettings, SessionManager};
pub use session::{AuthStatus, Session};

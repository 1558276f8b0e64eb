//! API-spec-to-tools gateway facade.
//!
//! Depend on this crate via `cargo add apigate`. It bundles the gateway crates
//! behind feature flags; the `gateway` feature additionally provides
//! [`Gateway`], which wires loader, registry, sessions, dispatcher and
//! orchestrator together from a single [`GatewayConfig`](config::GatewayConfig).

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use gateway_primitives as primitives;

/// Configuration surface (enabled by `config` feature).
#[cfg(feature = "config")]
pub use gateway_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use gateway_telemetry as telemetry;

/// Spec loading and the tool registry (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use gateway_tools as tools;

/// HTTP transport (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use gateway_adapters as adapters;

/// Credentials and sessions (enabled by `auth` feature).
#[cfg(feature = "auth")]
pub use gateway_auth as auth;

/// Request dispatch and response bounding (enabled by `dispatch` feature).
#[cfg(feature = "dispatch")]
pub use gateway_dispatch as dispatch;

/// Batch orchestration (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use gateway_kernel as kernel;

#[cfg(feature = "gateway")]
mod gateway;

#[cfg(feature = "gateway")]
pub use gateway::{Gateway, GatewayError, GatewayResult};

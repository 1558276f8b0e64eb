//! Core shared types for the apigate tool gateway.
//!
//! Everything that crosses a crate boundary between the loader, the session
//! manager, the dispatcher and the orchestrator lives here: identifiers, the
//! request a planner submits, and the typed result it gets back.

#![warn(missing_docs, clippy::pedantic)]

mod call;
mod error;
mod failure;
mod ids;

/// Tool call requests, results, and truncation metadata.
pub use call::{CallOutcome, ToolCallRequest, ToolCallResult, TruncatedField, TruncationReport};
/// Error type and result alias for primitive validation.
pub use error::{Error, Result};
/// Typed call failures surfaced inside [`ToolCallResult`].
pub use failure::{CallError, ErrorKind};
/// Identifiers for backends and batch requests.
pub use ids::{BackendId, RequestId};

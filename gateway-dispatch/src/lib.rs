//! Request dispatch for the apigate tool gateway.
//!
//! [`Dispatcher`] turns a [`ToolCallRequest`](gateway_primitives::ToolCallRequest)
//! into one HTTP exchange: registry lookup, argument binding and validation,
//! authentication, a single re-login retry on authorization failure, and
//! response bounding.

#![warn(missing_docs, clippy::pedantic)]

pub mod binding;
pub mod bounding;
pub mod dispatcher;
mod error;
mod validation;

pub use binding::{BoundRequest, bind};
pub use bounding::{DEFAULT_MAX_ITEMS, TRUNCATION_INFO_FIELD, bound};
pub use dispatcher::{DispatchSettings, Dispatcher, ERROR_BODY_LIMIT};
pub use error::{ToolError, ToolResult};

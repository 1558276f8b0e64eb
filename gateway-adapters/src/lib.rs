//! Outbound HTTP plumbing for the gateway.
//!
//! [`HttpTransport`] is the seam the session manager and the dispatcher talk
//! through; [`HyperTransport`] implements it over a pooled hyper client with
//! rustls, and tests substitute scripted fakes.

#![warn(missing_docs, clippy::pedantic)]

pub mod cookies;
mod error;
mod http_client;
pub mod message;
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use hyper::Method;
pub use message::{InboundResponse, OutboundRequest};
pub use transport::{DEFAULT_TIMEOUT, HttpTransport, HyperTransport};

//! Configuration management for the gateway.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! the process environment. Base-URL resolution for each backend lives here
//! too because it depends only on configuration and the spec document.

#![warn(missing_docs, clippy::pedantic)]

mod base_url;
mod error;
pub mod loader;
pub mod schema;

pub use base_url::{env_key_for, resolve_base_url};
pub use error::{ConfigError, ConfigResult};
pub use schema::{AuthConfig, GatewayConfig};

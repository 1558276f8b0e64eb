//! Spec loading, schema resolution and the tool registry.
//!
//! [`SpecLoader`] parses API specification documents and turns every
//! operation into a [`ToolDefinition`]; [`ToolRegistry`] is the immutable
//! lookup table the dispatcher reads from.

#![warn(missing_docs, clippy::pedantic)]

pub mod definition;
mod error;
pub mod loader;
pub mod naming;
pub mod registry;
pub mod report;
pub mod resolver;

pub use definition::{
    BODY_ARG, HEADER_ARG_PREFIX, HttpMethod, ParameterLocation, ParameterSpec, ToolDefinition,
    ToolDescriptor,
};
pub use error::{RegistryError, RegistryResult, SpecError, SpecResult};
pub use loader::{ApiSpecification, LoadedSpec, SpecLoader};
pub use registry::{SharedRegistry, ToolRegistry};
pub use report::{LoadReport, LoadWarning, LoadedSpecSummary};
pub use resolver::SchemaResolver;

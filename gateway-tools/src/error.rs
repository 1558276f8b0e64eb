//! Load and registry errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for spec loading.
pub type SpecResult<T> = Result<T, SpecError>;

/// Result alias for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while loading a single spec document.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The document could not be read.
    #[error("failed to read spec {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a recognisable API specification.
    #[error("invalid spec `{source_name}`: {reason}")]
    InvalidFormat {
        /// Spec name or file name.
        source_name: String,
        /// What was wrong.
        reason: String,
    },
}

impl SpecError {
    /// Convenience constructor for format errors.
    #[must_use]
    pub fn invalid(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while assembling a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two definitions share a qualified name.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Conflicting name.
        name: String,
    },

    /// Not a single spec loaded.
    #[error("no specs loaded from {dir} ({failed} failed)")]
    NoSpecsLoaded {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Number of documents that failed.
        failed: usize,
    },

    /// The spec directory itself could not be read.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

//! Observability utilities for the gateway.
//!
//! Installs a `tracing-subscriber` formatter filtered by an [`EnvFilter`]
//! and provides helpers for logging secrets without leaking them.

#![warn(missing_docs, clippy::pedantic)]

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was installed earlier in this process.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    /// The default directive could not be parsed.
    #[error("invalid log directive `{directive}`: {reason}")]
    InvalidDirective {
        /// Directive as configured.
        directive: String,
        /// Parser message.
        reason: String,
    },
}

/// Subscriber settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    directive: String,
    with_target: bool,
    ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            directive: "info".to_owned(),
            with_target: true,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Sets the default filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = directive.into();
        self
    }

    /// Toggles event targets in the output.
    #[must_use]
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Toggles ANSI colouring.
    #[must_use]
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    /// Default filter directive.
    #[must_use]
    pub fn directive(&self) -> &str {
        &self.directive
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.directive).map_err(|err| TelemetryError::InvalidDirective {
            directive: self.directive.clone(),
            reason: err.to_string(),
        })
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured directive.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidDirective`] for an unparsable directive
/// and [`TelemetryError::AlreadyInitialized`] when a subscriber is already
/// installed; callers may treat the latter as benign.
pub fn init_tracing(config: &TelemetryConfig) -> TelemetryResult<()> {
    let filter = config.filter()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialized)
}

/// Renders a secret as a short prefix followed by `…`, suitable for logs.
#[must_use]
pub fn redact(secret: &str) -> String {
    const VISIBLE: usize = 4;
    if secret.chars().count() <= VISIBLE * 2 {
        return "<redacted>".to_owned();
    }
    let prefix: String = secret.chars().take(VISIBLE).collect();
    format!("{prefix}…")
}

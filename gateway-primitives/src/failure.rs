//! Typed failures carried inside tool call results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse classification of a failed tool call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No tool with the requested name is registered.
    ToolNotFound,
    /// A required argument was absent.
    MissingParameter,
    /// An argument was present but unusable.
    InvalidArgument,
    /// The backend requires a session but no credentials are configured.
    MissingCredentials,
    /// Logging in to the backend failed.
    LoginFailed,
    /// The backend answered with a non-success HTTP status.
    ApiError,
    /// The request never produced an HTTP response (timeout, refused, DNS).
    NetworkFailure,
    /// The batch was cancelled before the call was scheduled.
    Cancelled,
    /// An unexpected fault inside the gateway.
    Internal,
}

impl ErrorKind {
    /// Returns `true` for failures caused by the caller's input, which are
    /// detected before any network I/O.
    #[must_use]
    pub const fn is_caller_error(self) -> bool {
        matches!(
            self,
            Self::ToolNotFound | Self::MissingParameter | Self::InvalidArgument
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToolNotFound => "tool_not_found",
            Self::MissingParameter => "missing_parameter",
            Self::InvalidArgument => "invalid_argument",
            Self::MissingCredentials => "missing_credentials",
            Self::LoginFailed => "login_failed",
            Self::ApiError => "api_error",
            Self::NetworkFailure => "network_failure",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        })
    }
}

/// Failure value returned to the caller instead of raising.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallError {
    kind: ErrorKind,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl CallError {
    /// Creates a failure of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            body: None,
        }
    }

    /// Creates an [`ErrorKind::ApiError`] failure from an HTTP status and a
    /// (possibly truncated) response body.
    #[must_use]
    pub fn api(status_code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            kind: ErrorKind::ApiError,
            message: format!("API error ({status_code}): {body}"),
            status_code: Some(status_code),
            body: Some(body),
        }
    }

    /// Creates an [`ErrorKind::Internal`] failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attaches an HTTP status code.
    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code, if the failure came from a response.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns the response body excerpt for API errors.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CallError {}

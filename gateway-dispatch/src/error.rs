//! Caller input errors detected before any network I/O.

use gateway_primitives::{CallError, ErrorKind};
use gateway_tools::ParameterLocation;
use thiserror::Error;

/// Result alias for binding operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised while resolving a tool call into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("tool `{name}` not found")]
    ToolNotFound {
        /// Requested name.
        name: String,
    },

    /// A required argument was not supplied.
    #[error("tool `{tool}` requires {location} parameter `{parameter}`")]
    MissingParameter {
        /// Tool being called.
        tool: String,
        /// Wire name of the parameter.
        parameter: String,
        /// Where the parameter belongs.
        location: ParameterLocation,
    },

    /// An argument could not be encoded.
    #[error("invalid argument `{parameter}` for tool `{tool}`: {reason}")]
    InvalidArgument {
        /// Tool being called.
        tool: String,
        /// Offending argument.
        parameter: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The tool's base URL cannot carry a path.
    #[error("tool `{tool}` has an unusable base url: {reason}")]
    InvalidBaseUrl {
        /// Tool being called.
        tool: String,
        /// Parser message.
        reason: String,
    },
}

impl ToolError {
    pub(crate) fn invalid_argument(tool: &str, parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            tool: tool.to_owned(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl From<ToolError> for CallError {
    fn from(err: ToolError) -> Self {
        let kind = match &err {
            ToolError::ToolNotFound { .. } => ErrorKind::ToolNotFound,
            ToolError::MissingParameter { .. } => ErrorKind::MissingParameter,
            ToolError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ToolError::InvalidBaseUrl { .. } => ErrorKind::Internal,
        };
        CallError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_names_location() {
        let err = ToolError::MissingParameter {
            tool: "payments_getPayment".into(),
            parameter: "payment_id".into(),
            location: ParameterLocation::Path,
        };
        assert_eq!(
            err.to_string(),
            "tool `payments_getPayment` requires path parameter `payment_id`"
        );
        let call: CallError = err.into();
        assert_eq!(call.kind(), ErrorKind::MissingParameter);
        assert!(call.kind().is_caller_error());
    }
}

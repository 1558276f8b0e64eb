//! Argument values checked against their parameter schemas.
//!
//! Each declared argument is validated with `jsonschema` (draft 7) against
//! the resolved schema of its parameter: type, `enum`, numeric ranges,
//! string lengths, `pattern`, and nested body properties. `format` is not
//! enforced. A schema that does not compile, such as one using OpenAPI-only
//! keyword forms, is skipped rather than blocking the call.

use gateway_tools::{ParameterSpec, ToolDefinition};
use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ToolError, ToolResult};

/// Validates every non-null declared argument of `tool`.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgument`] naming the first argument that
/// violates its schema.
pub fn check_arguments(tool: &ToolDefinition, arguments: &Map<String, Value>) -> ToolResult<()> {
    for (argument, value) in arguments {
        if value.is_null() {
            continue;
        }
        let Some(parameter) = tool.parameter_for_argument(argument) else {
            continue;
        };
        let Some(validator) = compile(tool, parameter) else {
            continue;
        };
        let violations: Vec<String> = validator.iter_errors(value).map(|error| describe(&error)).collect();
        if !violations.is_empty() {
            return Err(ToolError::invalid_argument(tool.name(), argument.as_str(), violations.join("; ")));
        }
    }
    Ok(())
}

fn compile(tool: &ToolDefinition, parameter: &ParameterSpec) -> Option<Validator> {
    let schema = parameter.schema();
    if !schema.is_object() {
        return None;
    }
    match Validator::options()
        .with_draft(Draft::Draft7)
        .should_validate_formats(false)
        .build(schema)
    {
        Ok(validator) => Some(validator),
        Err(err) => {
            debug!(tool = tool.name(), parameter = parameter.name(), %err, "parameter schema not enforceable");
            None
        }
    }
}

fn describe(error: &jsonschema::ValidationError<'_>) -> String {
    let path = error.instance_path.to_string();
    if path.is_empty() {
        error.to_string()
    } else {
        format!("{path}: {error}")
    }
}

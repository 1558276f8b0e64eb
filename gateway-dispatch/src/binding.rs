//! Binding an argument map onto a tool's request shape.

use gateway_adapters::{Method, OutboundRequest, TransportResult};
use gateway_tools::naming::path_placeholders;
use gateway_tools::{HttpMethod, ParameterLocation, ToolDefinition};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::{ToolError, ToolResult};
use crate::validation::check_arguments;

/// A tool call resolved into URL, headers and body, ready to send.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl BoundRequest {
    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL including the query string.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers taken from `header_*` arguments.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// JSON body from the `body` argument.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Builds a transport request carrying the bound parts on top of
    /// `defaults`. A bound header replaces a default of the same name.
    ///
    /// # Errors
    ///
    /// Fails when the body cannot be serialised.
    pub fn to_outbound(&self, defaults: &[(&str, &str)]) -> TransportResult<OutboundRequest> {
        let mut request = OutboundRequest::new(self.method.clone(), self.url.clone());
        for (name, value) in defaults {
            request = request.with_header(*name, *value);
        }
        for (name, value) in &self.headers {
            request = request.with_header_replaced(name.clone(), value.clone());
        }
        match &self.body {
            Some(body) => request.with_json_body(body),
            None => Ok(request),
        }
    }
}

/// Resolves `arguments` against `tool`.
///
/// Every required parameter is checked here and every declared argument is
/// validated against its schema, so a call that would fail for missing or
/// malformed input never reaches the network.
///
/// # Errors
///
/// Returns [`ToolError::MissingParameter`] for an absent required argument,
/// [`ToolError::InvalidArgument`] when `arguments` is not an object or a value
/// violates its parameter schema, and [`ToolError::InvalidBaseUrl`] when the
/// tool's base URL is unusable.
pub fn bind(tool: &ToolDefinition, arguments: &Value) -> ToolResult<BoundRequest> {
    let empty = Map::new();
    let arguments = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ToolError::invalid_argument(
                tool.name(),
                "arguments",
                format!("expected a JSON object, got {}", type_name(other)),
            ));
        }
    };

    check_required(tool, arguments)?;
    check_arguments(tool, arguments)?;

    let mut url = Url::parse(tool.base_url()).map_err(|err| ToolError::InvalidBaseUrl {
        tool: tool.name().to_owned(),
        reason: err.to_string(),
    })?;
    let placeholders = path_placeholders(tool.path_template());
    push_path(&mut url, tool, arguments)?;

    let mut query = Vec::new();
    let mut headers = Vec::new();
    let mut body = None;
    for (key, value) in arguments {
        if value.is_null() || placeholders.iter().any(|name| name == key) {
            continue;
        }
        match tool.parameter_for_argument(key).map(|p| (p.location(), p.name())) {
            Some((ParameterLocation::Path, _)) => {}
            Some((ParameterLocation::Query, name)) => push_query(&mut query, name, value),
            Some((ParameterLocation::Header, name)) => headers.push((name.to_owned(), scalar_text(value))),
            Some((ParameterLocation::Body, _)) => body = Some(value.clone()),
            None => {
                debug!(tool = tool.name(), argument = %key, "forwarding undeclared argument as query parameter");
                push_query(&mut query, key, value);
            }
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(BoundRequest {
        method: http_method(tool.method()),
        url: url.into(),
        headers,
        body,
    })
}

fn check_required(tool: &ToolDefinition, arguments: &Map<String, Value>) -> ToolResult<()> {
    let present = |key: &str| arguments.get(key).is_some_and(|value| !value.is_null());

    for name in path_placeholders(tool.path_template()) {
        if !present(&name) {
            return Err(ToolError::MissingParameter {
                tool: tool.name().to_owned(),
                parameter: name,
                location: ParameterLocation::Path,
            });
        }
    }
    for parameter in tool.parameters().iter().filter(|p| p.is_required()) {
        if !present(&parameter.argument_name()) {
            return Err(ToolError::MissingParameter {
                tool: tool.name().to_owned(),
                parameter: parameter.name().to_owned(),
                location: parameter.location(),
            });
        }
    }
    Ok(())
}

fn push_path(url: &mut Url, tool: &ToolDefinition, arguments: &Map<String, Value>) -> ToolResult<()> {
    let template = tool.path_template();
    let mut segments = url.path_segments_mut().map_err(|()| ToolError::InvalidBaseUrl {
        tool: tool.name().to_owned(),
        reason: "base url cannot carry a path".to_owned(),
    })?;
    segments.pop_if_empty();
    for raw in template.split('/').filter(|segment| !segment.is_empty()) {
        let mut segment = raw.to_owned();
        for name in path_placeholders(raw) {
            let value = arguments.get(&name).map(path_text).unwrap_or_default();
            segment = segment.replace(&format!("{{{name}}}"), &value);
        }
        segments.push(&segment);
    }
    if template.len() > 1 && template.ends_with('/') {
        segments.push("");
    }
    Ok(())
}

fn push_query(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Array(items) => query.extend(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| (name.to_owned(), scalar_text(item))),
        ),
        other => query.push((name.to_owned(), scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn path_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        other => scalar_text(other),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn http_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Trace => Method::TRACE,
    }
}

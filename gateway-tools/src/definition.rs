//! Canonical tool definitions produced by the loader.

use std::fmt;

use gateway_primitives::BackendId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Prefix that marks header parameters in the argument map.
pub const HEADER_ARG_PREFIX: &str = "header_";

/// Argument name carrying the JSON request body.
pub const BODY_ARG: &str = "body";

/// HTTP method of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Methods recognised as operation keys, in document order.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// Upper-case method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }

    /// Lower-case key used in path items.
    #[must_use]
    pub fn path_item_key(self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an argument is placed in the outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Substituted into the path template.
    Path,
    /// Appended as a query parameter.
    Query,
    /// Sent as a request header.
    Header,
    /// Serialized as the JSON request body.
    Body,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        })
    }
}

/// One declared input of an operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    name: String,
    location: ParameterLocation,
    required: bool,
    schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ParameterSpec {
    /// Creates a parameter. Path parameters are always required.
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParameterLocation, required: bool, schema: Value) -> Self {
        Self {
            name: name.into(),
            location,
            required: required || location == ParameterLocation::Path,
            schema,
            description: None,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wire name (path placeholder, query key or header name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location in the request.
    #[must_use]
    pub const fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Whether the caller must supply a value.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Resolved JSON schema, constraints included.
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Declared description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Key under which the caller supplies this parameter.
    #[must_use]
    pub fn argument_name(&self) -> String {
        match self.location {
            ParameterLocation::Header => format!("{HEADER_ARG_PREFIX}{}", self.name),
            ParameterLocation::Body => BODY_ARG.to_owned(),
            ParameterLocation::Path | ParameterLocation::Query => self.name.clone(),
        }
    }

    fn property_schema(&self) -> Value {
        let mut schema = match &self.schema {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Some(description) = &self.description {
            schema
                .entry("description")
                .or_insert_with(|| Value::String(description.clone()));
        }
        Value::Object(schema)
    }
}

/// A single invocable operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: String,
    backend: BackendId,
    method: HttpMethod,
    path_template: String,
    base_url: String,
    parameters: Vec<ParameterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ToolDefinition {
    /// Creates a definition without parameters.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        backend: BackendId,
        method: HttpMethod,
        path_template: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            method,
            path_template: path_template.into(),
            base_url: base_url.into(),
            parameters: Vec::new(),
            summary: None,
            description: None,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the operation summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the operation description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Qualified, registry-unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning backend.
    #[must_use]
    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path template with `{placeholder}` segments.
    #[must_use]
    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /// Base URL the path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Declared parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Looks up a parameter by the key the caller uses for it.
    #[must_use]
    pub fn parameter_for_argument(&self, argument: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.argument_name() == argument)
    }

    /// Human-readable description: summary, then description, then
    /// `METHOD /path`.
    #[must_use]
    pub fn display_description(&self) -> String {
        self.summary
            .as_deref()
            .or(self.description.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map_or_else(
                || format!("{} {}", self.method, self.path_template),
                ToOwned::to_owned,
            )
    }

    /// JSON-Schema object describing the argument map.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in &self.parameters {
            let key = parameter.argument_name();
            if parameter.is_required() {
                required.push(Value::String(key.clone()));
            }
            properties.insert(key, parameter.property_schema());
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Planner-facing descriptor.
    #[must_use]
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.display_description(),
            input_schema: self.input_schema(),
        }
    }
}

/// Name, description and input schema advertised to the planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Qualified tool name.
    pub name: String,
    /// Natural-language description.
    pub description: String,
    /// JSON-Schema of the argument map.
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> BackendId {
        BackendId::new("payments").expect("valid id")
    }

    #[test]
    fn path_parameters_are_always_required() {
        let param = ParameterSpec::new("id", ParameterLocation::Path, false, json!({"type": "string"}));
        assert!(param.is_required());
    }

    #[test]
    fn argument_names_distinguish_headers_and_body() {
        let header = ParameterSpec::new("X-Trace", ParameterLocation::Header, false, json!({}));
        let body = ParameterSpec::new("payload", ParameterLocation::Body, true, json!({}));
        assert_eq!(header.argument_name(), "header_X-Trace");
        assert_eq!(body.argument_name(), "body");
    }

    #[test]
    fn input_schema_lists_required_arguments() {
        let tool = ToolDefinition::new("payments_get", backend(), HttpMethod::Get, "/payments/{id}", "http://x")
            .with_parameter(ParameterSpec::new("id", ParameterLocation::Path, true, json!({"type": "string"})))
            .with_parameter(
                ParameterSpec::new("limit", ParameterLocation::Query, false, json!({"type": "integer", "maximum": 50}))
                    .with_description("page size"),
            );

        let schema = tool.input_schema();
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["properties"]["limit"]["maximum"], json!(50));
        assert_eq!(schema["properties"]["limit"]["description"], json!("page size"));
    }

    #[test]
    fn description_falls_back_to_method_and_path() {
        let tool = ToolDefinition::new("t", backend(), HttpMethod::Delete, "/items/{id}", "http://x");
        assert_eq!(tool.display_description(), "DELETE /items/{id}");
        let tool = tool.with_description("Remove an item");
        assert_eq!(tool.descriptor().description, "Remove an item");
    }
}

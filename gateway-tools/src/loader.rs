//! Spec document loading.
//!
//! A document is accepted when it parses as YAML or JSON and carries a
//! `paths` object. Every operation under `paths` becomes one
//! [`ToolDefinition`]; problems with individual operations, parameters or
//! references are recorded as [`LoadWarning`]s instead of failing the spec.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gateway_config::{GatewayConfig, resolve_base_url};
use gateway_primitives::BackendId;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::definition::{BODY_ARG, HttpMethod, ParameterLocation, ParameterSpec, ToolDefinition};
use crate::error::{RegistryError, RegistryResult, SpecError, SpecResult};
use crate::naming;
use crate::registry::ToolRegistry;
use crate::report::{LoadReport, LoadWarning};
use crate::resolver::SchemaResolver;

const SPEC_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Keywords copied from an inline (schema-less) parameter into its schema.
const INLINE_SCHEMA_KEYS: [&str; 13] = [
    "type",
    "format",
    "enum",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "default",
    "items",
    "example",
];

/// A parsed specification document and the backend it describes.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiSpecification {
    name: String,
    backend: BackendId,
    document: Value,
    servers: Vec<String>,
    base_url: String,
    source: Option<PathBuf>,
}

impl ApiSpecification {
    /// Spec name (the file stem for documents read from disk).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend identifier derived from the name.
    #[must_use]
    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    /// Parsed document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Server URLs declared by the document.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Base URL every tool of this spec is sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// File the document was read from.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// One successfully loaded document with its tools and warnings.
#[derive(Clone, Debug)]
pub struct LoadedSpec {
    /// The parsed spec.
    pub spec: Arc<ApiSpecification>,
    /// Tools in document order, names not yet deduplicated across specs.
    pub tools: Vec<ToolDefinition>,
    /// Degradations encountered.
    pub warnings: Vec<LoadWarning>,
}

/// Turns spec documents into tool definitions.
#[derive(Clone, Debug, Default)]
pub struct SpecLoader {
    config: GatewayConfig,
}

impl SpecLoader {
    /// Creates a loader that resolves base URLs with `config`.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Loads every `.yaml`, `.yml` and `.json` document in `dir` and builds
    /// a registry from those that succeed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Spec`] if the directory cannot be read and
    /// [`RegistryError::NoSpecsLoaded`] if no document loads.
    pub async fn load_dir(&self, dir: impl AsRef<Path>) -> RegistryResult<(ToolRegistry, LoadReport)> {
        let dir = dir.as_ref();
        let io_error = |source| SpecError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if is_spec_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut report = LoadReport::default();
        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_file(&path).await {
                Ok(spec) => loaded.push(spec),
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to load spec");
                    report.failed.push((path, err));
                }
            }
        }

        if loaded.is_empty() {
            return Err(RegistryError::NoSpecsLoaded {
                dir: dir.to_path_buf(),
                failed: report.failed.len(),
            });
        }

        let registry = ToolRegistry::from_loaded(loaded, &mut report)?;
        info!(
            dir = %dir.display(),
            specs = report.loaded.len(),
            tools = registry.len(),
            failed = report.failed.len(),
            warnings = report.warnings.len(),
            "spec directory loaded"
        );
        Ok((registry, report))
    }

    /// Reads and loads one document; the spec name is the file stem.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Io`] if the file cannot be read and
    /// [`SpecError::InvalidFormat`] if it is not a usable spec.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> SpecResult<LoadedSpec> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SpecError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| SpecError::invalid(path.display().to_string(), "file name is not valid UTF-8"))?;
        self.build(name, &text, Some(path.to_path_buf()))
    }

    /// Loads a document held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidFormat`] if the text is not a usable spec.
    pub fn load_document(&self, name: &str, text: &str) -> SpecResult<LoadedSpec> {
        self.build(name, text, None)
    }

    fn build(&self, name: &str, text: &str, source: Option<PathBuf>) -> SpecResult<LoadedSpec> {
        let document = parse_document(name, text)?;
        let backend = backend_id_for(name)?;

        let Some(Value::Object(paths)) = document.get("paths") else {
            return Err(SpecError::invalid(name, "document has no `paths` object"));
        };

        let servers = declared_servers(&document);
        let base_url = resolve_base_url(&self.config, name, &servers);
        debug!(spec = name, base_url = %base_url, "resolved base url");

        let mut resolver = SchemaResolver::new(name, &document);
        let mut tools = Vec::new();
        for (path, item) in paths {
            let context = OperationContext {
                spec: name,
                backend: &backend,
                base_url: &base_url,
                path,
            };
            let Value::Object(item) = item else {
                resolver.push_warning(context.skipped("*", "path item is not an object"));
                continue;
            };
            let shared = parameter_list(item.get("parameters"));
            for method in HttpMethod::ALL {
                if let Some(operation) = item.get(&method.path_item_key()) {
                    if let Some(tool) = context.build_tool(&mut resolver, method, operation, shared) {
                        tools.push(tool);
                    }
                }
            }
        }

        let warnings = resolver.take_warnings();
        info!(spec = name, tools = tools.len(), warnings = warnings.len(), "loaded spec");

        let spec = ApiSpecification {
            name: name.to_owned(),
            backend,
            servers,
            base_url,
            source,
            document,
        };
        Ok(LoadedSpec {
            spec: Arc::new(spec),
            tools,
            warnings,
        })
    }
}

struct OperationContext<'a> {
    spec: &'a str,
    backend: &'a BackendId,
    base_url: &'a str,
    path: &'a str,
}

impl OperationContext<'_> {
    fn skipped(&self, method: &str, reason: &str) -> LoadWarning {
        LoadWarning::SkippedOperation {
            spec: self.spec.to_owned(),
            path: self.path.to_owned(),
            method: method.to_owned(),
            reason: reason.to_owned(),
        }
    }

    fn skipped_parameter(&self, tool: &str, parameter: &str, reason: impl Into<String>) -> LoadWarning {
        LoadWarning::SkippedParameter {
            spec: self.spec.to_owned(),
            tool: tool.to_owned(),
            parameter: parameter.to_owned(),
            reason: reason.into(),
        }
    }

    fn build_tool(
        &self,
        resolver: &mut SchemaResolver<'_>,
        method: HttpMethod,
        operation: &Value,
        shared: &[Value],
    ) -> Option<ToolDefinition> {
        let Value::Object(operation) = operation else {
            resolver.push_warning(self.skipped(method.as_str(), "operation is not an object"));
            return None;
        };

        let operation_id = operation.get("operationId").and_then(Value::as_str);
        let name = naming::qualified_name(self.spec, operation_id, method.as_str(), self.path);
        let mut tool = ToolDefinition::new(
            name.clone(),
            self.backend.clone(),
            method,
            self.path,
            self.base_url,
        );
        if let Some(summary) = operation.get("summary").and_then(Value::as_str) {
            tool = tool.with_summary(summary);
        }
        if let Some(description) = operation.get("description").and_then(Value::as_str) {
            tool = tool.with_description(description);
        }

        let placeholders = naming::path_placeholders(self.path);
        let mut declared = self.merged_parameters(resolver, &name, shared, parameter_list(operation.get("parameters")));
        declared.retain(|parameter| {
            let orphan = parameter.location() == ParameterLocation::Path
                && !placeholders.iter().any(|p| p == parameter.name());
            if orphan {
                resolver.push_warning(self.skipped_parameter(
                    &name,
                    parameter.name(),
                    "path parameter does not appear in the path template",
                ));
            }
            !orphan
        });

        for placeholder in &placeholders {
            let is_declared = declared
                .iter()
                .any(|p| p.location() == ParameterLocation::Path && p.name() == placeholder);
            if !is_declared {
                debug!(tool = %name, parameter = %placeholder, "synthesising undeclared path parameter");
                declared.push(
                    ParameterSpec::new(placeholder.clone(), ParameterLocation::Path, true, json!({ "type": "string" }))
                        .with_description(format!("Path parameter: {placeholder}")),
                );
            }
        }

        let has_body = declared.iter().any(|p| p.location() == ParameterLocation::Body);
        if !has_body {
            if let Some(body) = operation.get("requestBody") {
                if let Some(parameter) = self.request_body(resolver, &name, body) {
                    declared.push(parameter);
                }
            }
        }

        for parameter in declared {
            tool = tool.with_parameter(parameter);
        }
        Some(tool)
    }

    /// Merges path-level and operation-level parameters; the operation wins
    /// on `(name, in)` and keeps the path-level position.
    fn merged_parameters(
        &self,
        resolver: &mut SchemaResolver<'_>,
        tool: &str,
        shared: &[Value],
        own: &[Value],
    ) -> Vec<ParameterSpec> {
        let mut raw: Vec<(String, String, &Map<String, Value>)> = Vec::new();
        for entry in shared.iter().chain(own) {
            let parameter = match entry.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    if let Some(target) = resolver.lookup(reference) {
                        target
                    } else {
                        let warning = self.skipped_parameter(tool, reference, "unresolved parameter reference");
                        resolver.push_warning(warning);
                        continue;
                    }
                }
                None => entry,
            };
            let Value::Object(parameter) = parameter else {
                continue;
            };
            let (Some(name), Some(location)) = (
                parameter.get("name").and_then(Value::as_str),
                parameter.get("in").and_then(Value::as_str),
            ) else {
                resolver.push_warning(self.skipped_parameter(tool, "?", "parameter lacks `name` or `in`"));
                continue;
            };
            match raw.iter_mut().find(|(n, l, _)| n == name && l == location) {
                Some(slot) => slot.2 = parameter,
                None => raw.push((name.to_owned(), location.to_owned(), parameter)),
            }
        }

        let mut out = Vec::with_capacity(raw.len());
        for (name, location, parameter) in raw {
            let location = match location.as_str() {
                "path" => ParameterLocation::Path,
                "query" => ParameterLocation::Query,
                "header" => ParameterLocation::Header,
                "body" => ParameterLocation::Body,
                other => {
                    resolver.push_warning(self.skipped_parameter(
                        tool,
                        &name,
                        format!("`{other}` parameters are not supported"),
                    ));
                    continue;
                }
            };

            let schema = match parameter.get("schema") {
                Some(schema) => resolver.resolve(schema),
                None => inline_schema(parameter),
            };
            let schema = with_example(schema, parameter.get("example"));
            let required = parameter.get("required").and_then(Value::as_bool).unwrap_or(false);

            let mut spec = ParameterSpec::new(name, location, required, schema);
            if let Some(description) = parameter.get("description").and_then(Value::as_str) {
                spec = spec.with_description(description);
            }
            out.push(spec);
        }
        out
    }

    fn request_body(&self, resolver: &mut SchemaResolver<'_>, tool: &str, body: &Value) -> Option<ParameterSpec> {
        let body = match body.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                let Some(target) = resolver.lookup(reference) else {
                    resolver.push_warning(self.skipped_parameter(tool, BODY_ARG, "unresolved request body reference"));
                    return None;
                };
                target
            }
            None => body,
        };

        let content = body.get("content").and_then(Value::as_object)?;
        let media = content.get("application/json").or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| media_type.contains("json"))
                .map(|(_, media)| media)
        });
        let Some(media) = media else {
            if !content.is_empty() {
                resolver.push_warning(self.skipped_parameter(tool, BODY_ARG, "request body has no JSON media type"));
            }
            return None;
        };

        let schema = media
            .get("schema")
            .map_or_else(|| json!({ "type": "object" }), |schema| resolver.resolve(schema));
        let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
        let mut parameter = ParameterSpec::new(BODY_ARG, ParameterLocation::Body, required, schema);
        if let Some(description) = body.get("description").and_then(Value::as_str) {
            parameter = parameter.with_description(description);
        }
        Some(parameter)
    }
}

fn parameter_list(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn inline_schema(parameter: &Map<String, Value>) -> Value {
    let mut schema: Map<String, Value> = INLINE_SCHEMA_KEYS
        .iter()
        .filter_map(|key| parameter.get(*key).map(|value| ((*key).to_owned(), value.clone())))
        .collect();
    schema
        .entry("type")
        .or_insert_with(|| Value::String("string".to_owned()));
    Value::Object(schema)
}

fn with_example(mut schema: Value, example: Option<&Value>) -> Value {
    if let (Value::Object(map), Some(example)) = (&mut schema, example) {
        map.entry("example").or_insert_with(|| example.clone());
    }
    schema
}

fn parse_document(name: &str, text: &str) -> SpecResult<Value> {
    let parsed = if text.trim_start().starts_with('{') {
        serde_json::from_str::<Value>(text).map_err(|err| SpecError::invalid(name, err.to_string()))
    } else {
        serde_yaml::from_str::<Value>(text).map_err(|err| SpecError::invalid(name, err.to_string()))
    }?;
    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err(SpecError::invalid(name, "document root is not a mapping"))
    }
}

/// Server URLs of an OpenAPI 3 (`servers`) or Swagger 2 (`host`/`basePath`)
/// document, with server variables replaced by their defaults.
fn declared_servers(document: &Value) -> Vec<String> {
    if let Some(Value::Array(servers)) = document.get("servers") {
        return servers
            .iter()
            .filter_map(|server| {
                let url = server.get("url")?.as_str()?;
                Some(substitute_server_variables(url, server.get("variables")))
            })
            .collect();
    }

    let base_path = document.get("basePath").and_then(Value::as_str).unwrap_or("");
    match document.get("host").and_then(Value::as_str) {
        Some(host) => {
            let scheme = document
                .get("schemes")
                .and_then(Value::as_array)
                .and_then(|schemes| schemes.first())
                .and_then(Value::as_str)
                .unwrap_or("https");
            vec![format!("{scheme}://{host}{base_path}")]
        }
        None if !base_path.is_empty() => vec![base_path.to_owned()],
        None => Vec::new(),
    }
}

fn substitute_server_variables(url: &str, variables: Option<&Value>) -> String {
    let Some(Value::Object(variables)) = variables else {
        return url.to_owned();
    };
    variables.iter().fold(url.to_owned(), |url, (name, variable)| {
        match variable.get("default").and_then(Value::as_str) {
            Some(default) => url.replace(&format!("{{{name}}}"), default),
            None => url,
        }
    })
}

fn backend_id_for(name: &str) -> SpecResult<BackendId> {
    let candidate: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();
    BackendId::new(candidate).map_err(|err| SpecError::invalid(name, err.to_string()))
}

fn is_spec_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SPEC_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYMENTS: &str = r#"
openapi: 3.0.0
info:
  title: Payments
  version: "1"
servers:
  - url: https://{region}.payments.example.com/v1
    variables:
      region:
        default: eu
paths:
  /payments:
    get:
      operationId: listPayments
      summary: List payments
      parameters:
        - $ref: '#/components/parameters/Limit'
        - name: X-Trace-Id
          in: header
          schema:
            type: string
        - name: session
          in: cookie
          schema:
            type: string
    post:
      operationId: createPayment
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Payment'
  /payments/{payment_id}:
    parameters:
      - name: payment_id
        in: path
        required: true
        schema:
          type: string
          pattern: "^PAY-"
    get:
      operationId: getPayment
    delete:
      description: Cancel a payment
  /accounts/{account_id}/statements/{year}:
    get:
      parameters:
        - name: year
          in: path
          schema:
            type: integer
            minimum: 2000
components:
  parameters:
    Limit:
      name: limit
      in: query
      schema:
        type: integer
        maximum: 100
        default: 20
  schemas:
    Payment:
      type: object
      properties:
        amount:
          type: number
        payer:
          $ref: '#/components/schemas/Party'
      required: [amount]
"#;

    fn loader() -> SpecLoader {
        SpecLoader::new(GatewayConfig::default())
    }

    fn tool<'a>(loaded: &'a LoadedSpec, name: &str) -> &'a ToolDefinition {
        loaded
            .tools
            .iter()
            .find(|tool| tool.name() == name)
            .unwrap_or_else(|| panic!("tool {name} missing"))
    }

    #[test]
    fn every_operation_becomes_a_tool() {
        let loaded = loader().load_document("payments", PAYMENTS).expect("load");
        let names: Vec<_> = loaded.tools.iter().map(ToolDefinition::name).collect();
        assert_eq!(
            names,
            vec![
                "payments_listPayments",
                "payments_createPayment",
                "payments_getPayment",
                "payments_delete_payments_payment_id",
                "payments_get_accounts_account_id_statements_year",
            ]
        );
        assert_eq!(loaded.spec.base_url(), "https://eu.payments.example.com/v1");
        assert_eq!(loaded.tools[0].base_url(), "https://eu.payments.example.com/v1");
    }

    #[test]
    fn parameters_are_classified_and_resolved() {
        let loaded = loader().load_document("payments", PAYMENTS).expect("load");
        let list = tool(&loaded, "payments_listPayments");

        let limit = list.parameter_for_argument("limit").expect("limit");
        assert_eq!(limit.location(), ParameterLocation::Query);
        assert_eq!(limit.schema()["maximum"], json!(100));
        assert_eq!(limit.schema()["default"], json!(20));

        let trace = list.parameter_for_argument("header_X-Trace-Id").expect("header");
        assert_eq!(trace.location(), ParameterLocation::Header);
        assert!(list.parameter_for_argument("session").is_none());

        assert!(loaded.warnings.iter().any(|w| matches!(
            w,
            LoadWarning::SkippedParameter { parameter, .. } if parameter == "session"
        )));
    }

    #[test]
    fn request_body_becomes_body_argument() {
        let loaded = loader().load_document("payments", PAYMENTS).expect("load");
        let create = tool(&loaded, "payments_createPayment");
        let body = create.parameter_for_argument("body").expect("body");
        assert!(body.is_required());
        assert_eq!(body.schema()["title"], json!("Payment"));
        assert_eq!(
            body.schema()["properties"]["payer"]["description"],
            json!("Referenced schema not found: Party")
        );
        assert!(loaded.warnings.iter().any(|w| matches!(w, LoadWarning::UnresolvedReference { .. })));
    }

    #[test]
    fn path_level_parameters_and_placeholders_are_covered() {
        let loaded = loader().load_document("payments", PAYMENTS).expect("load");

        let get = tool(&loaded, "payments_getPayment");
        let id = get.parameter_for_argument("payment_id").expect("path param");
        assert_eq!(id.schema()["pattern"], json!("^PAY-"));

        let statements = tool(&loaded, "payments_get_accounts_account_id_statements_year");
        let path_params: Vec<_> = statements
            .parameters()
            .iter()
            .filter(|p| p.location() == ParameterLocation::Path)
            .map(|p| (p.name(), p.is_required()))
            .collect();
        assert_eq!(path_params, vec![("year", true), ("account_id", true)]);
    }

    #[test]
    fn swagger_two_documents_are_accepted() {
        let doc = r#"{
            "swagger": "2.0",
            "host": "legacy.example.com",
            "basePath": "/api",
            "schemes": ["http"],
            "paths": {
                "/orders": {
                    "post": {
                        "operationId": "createOrder",
                        "parameters": [
                            { "name": "order", "in": "body", "required": true, "schema": { "type": "object" } },
                            { "name": "dryRun", "in": "query", "type": "boolean", "default": false }
                        ]
                    }
                }
            }
        }"#;
        let loaded = loader().load_document("legacy", doc).expect("load");
        assert_eq!(loaded.spec.base_url(), "http://legacy.example.com/api");
        let create = tool(&loaded, "legacy_createOrder");
        assert_eq!(create.parameter_for_argument("body").map(ParameterSpec::location), Some(ParameterLocation::Body));
        let dry_run = create.parameter_for_argument("dryRun").expect("query");
        assert_eq!(dry_run.schema()["type"], json!("boolean"));
        assert_eq!(dry_run.schema()["default"], json!(false));
    }

    #[test]
    fn documents_without_paths_are_invalid() {
        let err = loader()
            .load_document("broken", "openapi: 3.0.0\ninfo: {}\n")
            .expect_err("no paths");
        assert!(matches!(err, SpecError::InvalidFormat { ref source_name, .. } if source_name == "broken"));

        let err = loader().load_document("scalar", "just text").expect_err("not a mapping");
        assert!(matches!(err, SpecError::InvalidFormat { .. }));
    }

    #[test]
    fn base_url_override_applies_to_tools() {
        let config = GatewayConfig::default().with_backend_base_url("payments", "http://127.0.0.1:1234");
        let loaded = SpecLoader::new(config).load_document("payments", PAYMENTS).expect("load");
        assert!(loaded.tools.iter().all(|t| t.base_url() == "http://127.0.0.1:1234"));
    }

    #[tokio::test]
    async fn directory_load_reports_failures_and_keeps_good_specs() {
        let dir = std::env::temp_dir().join(format!("apigate-specs-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.expect("create dir");
        tokio::fs::write(dir.join("payments.yaml"), PAYMENTS).await.expect("write");
        tokio::fs::write(dir.join("broken.json"), "{ not json").await.expect("write");
        tokio::fs::write(dir.join("notes.txt"), "ignored").await.expect("write");

        let (registry, report) = loader().load_dir(&dir).await.expect("load dir");
        assert_eq!(registry.len(), 5);
        assert_eq!(report.tool_count(), 5);
        assert_eq!(report.loaded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("broken.json"));

        tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
    }

    #[tokio::test]
    async fn empty_directory_fails_with_no_specs_loaded() {
        let dir = std::env::temp_dir().join(format!("apigate-empty-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.expect("create dir");

        let err = loader().load_dir(&dir).await.expect_err("no specs");
        assert!(matches!(err, RegistryError::NoSpecsLoaded { failed: 0, .. }));

        tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
    }

    #[tokio::test]
    async fn missing_directory_is_an_io_error() {
        let dir = std::env::temp_dir().join(format!("apigate-missing-{}", uuid::Uuid::new_v4()));
        let err = loader().load_dir(&dir).await.expect_err("missing dir");
        assert!(matches!(err, RegistryError::Spec(SpecError::Io { .. })));
    }
}

//! Executes a single tool call against its backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_adapters::{DEFAULT_TIMEOUT, HttpTransport, InboundResponse};
use gateway_auth::{AuthContext, SessionManager};
use gateway_config::GatewayConfig;
use gateway_primitives::{CallError, ToolCallRequest, ToolCallResult, TruncationReport};
use gateway_tools::{SharedRegistry, ToolDefinition};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::binding::{BoundRequest, bind};
use crate::bounding::{DEFAULT_MAX_ITEMS, bound};
use crate::error::ToolError;

/// Longest response body excerpt carried in an API error.
pub const ERROR_BODY_LIMIT: usize = 500;

/// Limits and identity applied to every dispatched request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchSettings {
    timeout: Duration,
    max_items: usize,
    user_agent: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_items: DEFAULT_MAX_ITEMS,
            user_agent: concat!("apigate/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl DispatchSettings {
    /// Derives settings from the gateway configuration.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            max_items: config.max_response_items(),
            user_agent: config.user_agent().to_owned(),
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the list length limit for response bounding.
    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// List length limit.
    #[must_use]
    pub const fn max_items(&self) -> usize {
        self.max_items
    }
}

struct Completed {
    data: Value,
    status: u16,
    truncation: TruncationReport,
}

/// Resolves tool calls into HTTP requests and interprets the responses.
///
/// [`Dispatcher::execute`] never fails: lookup, binding, authentication and
/// transport problems all come back as a failed [`ToolCallResult`].
pub struct Dispatcher {
    registry: Arc<SharedRegistry>,
    sessions: Arc<SessionManager>,
    transport: Arc<dyn HttpTransport>,
    settings: DispatchSettings,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.registry.snapshot().len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry and session manager.
    #[must_use]
    pub fn new(
        registry: Arc<SharedRegistry>,
        sessions: Arc<SessionManager>,
        transport: Arc<dyn HttpTransport>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            registry,
            sessions,
            transport,
            settings,
        }
    }

    /// Registry the dispatcher resolves tool names against.
    #[must_use]
    pub fn registry(&self) -> &Arc<SharedRegistry> {
        &self.registry
    }

    /// Session manager used for authentication.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Executes one tool call.
    pub async fn execute(&self, request: ToolCallRequest) -> ToolCallResult {
        let started = Instant::now();
        let outcome = self.run(&request).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(completed) => {
                debug!(
                    tool = request.tool(),
                    status = completed.status,
                    elapsed_ms = elapsed.as_millis(),
                    "tool call succeeded"
                );
                ToolCallResult::success(request, completed.data, completed.status, elapsed)
                    .with_truncation(completed.truncation)
            }
            Err(error) => {
                if error.kind().is_caller_error() {
                    debug!(tool = request.tool(), %error, "tool call rejected");
                } else {
                    warn!(
                        tool = request.tool(),
                        kind = %error.kind(),
                        status = ?error.status_code(),
                        elapsed_ms = elapsed.as_millis(),
                        "tool call failed"
                    );
                }
                ToolCallResult::failure(request, error, elapsed)
            }
        }
    }

    async fn run(&self, request: &ToolCallRequest) -> Result<Completed, CallError> {
        let tool = self
            .registry
            .snapshot()
            .get(request.tool())
            .ok_or_else(|| ToolError::ToolNotFound {
                name: request.tool().to_owned(),
            })?;
        let bound = bind(&tool, request.arguments())?;

        let context = self.sessions.ensure_authenticated(tool.backend()).await?;
        let mut response = self.send(&tool, &bound, &context).await?;

        if is_auth_failure(response.status()) {
            if let Some(stale) = context.session() {
                info!(
                    tool = tool.name(),
                    backend = %tool.backend(),
                    status = response.status(),
                    "session rejected, logging in again"
                );
                let context = self.sessions.reauthenticate(tool.backend(), Some(stale.as_ref())).await?;
                response = self.send(&tool, &bound, &context).await?;
            }
        }

        self.interpret(response)
    }

    async fn send(
        &self,
        tool: &ToolDefinition,
        bound: &BoundRequest,
        context: &AuthContext,
    ) -> Result<InboundResponse, CallError> {
        let defaults = [
            ("Accept", "application/json"),
            ("Content-Type", "application/json"),
            ("User-Agent", self.settings.user_agent.as_str()),
        ];
        let mut request = bound.to_outbound(&defaults)?.with_timeout(self.settings.timeout);
        for (name, value) in context.headers() {
            request = request.with_header_replaced(name, value);
        }

        debug!(tool = tool.name(), method = %bound.method(), url = bound.url(), "dispatching request");
        Ok(self.transport.send(request).await?)
    }

    fn interpret(&self, response: InboundResponse) -> Result<Completed, CallError> {
        let status = response.status();
        if !response.is_success() {
            let body: String = response.text().chars().take(ERROR_BODY_LIMIT).collect();
            return Err(CallError::api(status, body));
        }

        let data = if response.body().is_empty() {
            Value::Null
        } else {
            response.json().unwrap_or_else(|| Value::String(response.text()))
        };
        let (data, truncation) = bound(data, self.settings.max_items);
        Ok(Completed {
            data,
            status,
            truncation,
        })
    }
}

const fn is_auth_failure(status: u16) -> bool {
    matches!(status, 401 | 403)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_adapters::HyperTransport;
    use gateway_auth::{Credentials, LoginSettings};
    use gateway_primitives::{BackendId, ErrorKind};
    use gateway_tools::{HttpMethod, ParameterLocation, ParameterSpec, ToolRegistry};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payment_tool(base_url: &str) -> ToolDefinition {
        ToolDefinition::new(
            "payments_getPayment",
            BackendId::new("payments").expect("id"),
            HttpMethod::Get,
            "/payments/{payment_id}",
            base_url,
        )
        .with_parameter(ParameterSpec::new("payment_id", ParameterLocation::Path, true, json!({"type": "string"})))
    }

    fn list_tool(base_url: &str) -> ToolDefinition {
        ToolDefinition::new(
            "payments_listPayments",
            BackendId::new("payments").expect("id"),
            HttpMethod::Get,
            "/payments",
            base_url,
        )
        .with_parameter(ParameterSpec::new(
            "status",
            ParameterLocation::Query,
            false,
            json!({"type": "string", "enum": ["OPEN", "CLOSED"]}),
        ))
        .with_parameter(ParameterSpec::new(
            "limit",
            ParameterLocation::Query,
            false,
            json!({"type": "integer", "maximum": 10}),
        ))
        .with_parameter(ParameterSpec::new("Accept", ParameterLocation::Header, false, json!({"type": "string"})))
    }

    fn dispatcher(server: &MockServer, credentials: Option<Credentials>) -> Dispatcher {
        let transport: Arc<dyn HttpTransport> = Arc::new(HyperTransport::default());
        let registry = ToolRegistry::new(Vec::new(), [payment_tool(&server.uri()), list_tool(&server.uri())])
            .expect("registry");
        let sessions = SessionManager::new(Arc::clone(&transport), LoginSettings::default().with_allow_anonymous(true));
        if let Some(credentials) = credentials {
            sessions.set_credentials(credentials);
        }
        Dispatcher::new(
            Arc::new(SharedRegistry::new(registry)),
            Arc::new(sessions),
            transport,
            DispatchSettings::default().with_max_items(3),
        )
    }

    fn basic(server: &MockServer) -> Credentials {
        Credentials::basic("svc", "pw", format!("{}/auth/login", server.uri()))
    }

    async fn mount_login(server: &MockServer, token: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", format!("JSESSIONID={token}; Path=/")))
            .up_to_n_times(times)
            .expect(times)
            .mount(server)
            .await;
    }

    fn get_payment(id: &str) -> ToolCallRequest {
        ToolCallRequest::new("payments_getPayment", json!({"payment_id": id}))
    }

    #[tokio::test]
    async fn successful_call_presents_session_cookie() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("GET"))
            .and(path("/payments/PAY-1"))
            .and(header("cookie", "JSESSIONID=tok-1"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "PAY-1", "amount": 10})))
            .expect(2)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Some(basic(&server)));
        for _ in 0..2 {
            let result = dispatcher.execute(get_payment("PAY-1")).await;
            assert!(result.is_success(), "{:?}", result.error());
            assert_eq!(result.status_code(), Some(200));
            assert_eq!(result.data(), Some(&json!({"id": "PAY-1", "amount": 10})));
        }
    }

    #[tokio::test]
    async fn missing_path_argument_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Some(basic(&server)));
        let result = dispatcher
            .execute(ToolCallRequest::new("payments_getPayment", json!({})))
            .await;
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::MissingParameter);
        assert!(error.message().contains("payment_id"));
    }

    #[tokio::test]
    async fn schema_violation_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Some(basic(&server)));
        let result = dispatcher
            .execute(ToolCallRequest::new(
                "payments_listPayments",
                json!({"status": "BOGUS", "limit": "lots"}),
            ))
            .await;
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert!(error.message().contains("status"), "{}", error.message());
    }

    #[tokio::test]
    async fn declared_header_argument_overrides_default_accept() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("GET"))
            .and(path("/payments"))
            .and(header("accept", "text/csv"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id,amount\nPAY-1,10"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Some(basic(&server)));
        let result = dispatcher
            .execute(ToolCallRequest::new(
                "payments_listPayments",
                json!({"header_Accept": "text/csv", "status": "OPEN"}),
            ))
            .await;
        assert!(result.is_success(), "{:?}", result.error());
        assert_eq!(result.data(), Some(&json!("id,amount\nPAY-1,10")));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server, None);
        let result = dispatcher.execute(ToolCallRequest::new("nope", json!({}))).await;
        assert_eq!(result.error().map(CallError::kind), Some(ErrorKind::ToolNotFound));
        assert_eq!(result.request().tool(), "nope");
    }

    #[tokio::test]
    async fn rejected_session_is_renewed_once() {
        let server = MockServer::start().await;
        mount_login(&server, "old", 1).await;
        mount_login(&server, "new", 1).await;
        Mock::given(method("GET"))
            .and(path("/payments/PAY-1"))
            .and(header("cookie", "JSESSIONID=old"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/payments/PAY-1"))
            .and(header("cookie", "JSESSIONID=new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "PAY-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = dispatcher(&server, Some(basic(&server))).execute(get_payment("PAY-1")).await;
        assert!(result.is_success(), "{:?}", result.error());
    }

    #[tokio::test]
    async fn second_authorization_failure_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=tok; Path=/"))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/payments/PAY-1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(2)
            .mount(&server)
            .await;

        let result = dispatcher(&server, Some(basic(&server))).execute(get_payment("PAY-1")).await;
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::ApiError);
        assert_eq!(error.status_code(), Some(403));
        assert_eq!(error.body(), Some("forbidden"));
        assert_eq!(result.status_code(), Some(403));
    }

    #[tokio::test]
    async fn api_error_body_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2_000)))
            .mount(&server)
            .await;

        let result = dispatcher(&server, None).execute(get_payment("PAY-1")).await;
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::ApiError);
        assert_eq!(error.body().map(str::len), Some(ERROR_BODY_LIMIT));
    }

    #[tokio::test]
    async fn non_json_success_is_returned_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain ok"))
            .mount(&server)
            .await;

        let result = dispatcher(&server, None).execute(get_payment("PAY-1")).await;
        assert_eq!(result.data(), Some(&json!("plain ok")));
    }

    #[tokio::test]
    async fn large_lists_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3, 4, 5])))
            .mount(&server)
            .await;

        let result = dispatcher(&server, None)
            .execute(ToolCallRequest::new("payments_listPayments", json!({})))
            .await;
        let data = result.data().expect("data");
        assert_eq!(data["items"], json!([1, 2, 3]));
        assert_eq!(data["total_count"], json!(5));
        let truncation = result.truncation().expect("truncation");
        assert_eq!(truncation.fields[0].total_count, 5);
    }

    #[tokio::test]
    async fn api_key_is_sent_without_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payments"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials::api_key_only("X-Api-Key", "secret", format!("{}/auth/login", server.uri()));
        let result = dispatcher(&server, Some(credentials))
            .execute(ToolCallRequest::new("payments_listPayments", json!({})))
            .await;
        assert!(result.is_success(), "{:?}", result.error());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        drop(listener);

        let transport: Arc<dyn HttpTransport> = Arc::new(HyperTransport::default());
        let registry = ToolRegistry::new(Vec::new(), [payment_tool(&format!("http://{address}"))]).expect("registry");
        let sessions = SessionManager::new(Arc::clone(&transport), LoginSettings::default().with_allow_anonymous(true));
        let dispatcher = Dispatcher::new(
            Arc::new(SharedRegistry::new(registry)),
            Arc::new(sessions),
            transport,
            DispatchSettings::default(),
        );

        let result = dispatcher.execute(get_payment("PAY-1")).await;
        assert_eq!(result.error().map(CallError::kind), Some(ErrorKind::NetworkFailure));
        assert_eq!(result.status_code(), None);
    }

    #[tokio::test]
    async fn missing_credentials_surface_as_failed_result() {
        let server = MockServer::start().await;
        let transport: Arc<dyn HttpTransport> = Arc::new(HyperTransport::default());
        let registry = ToolRegistry::new(Vec::new(), [payment_tool(&server.uri())]).expect("registry");
        let dispatcher = Dispatcher::new(
            Arc::new(SharedRegistry::new(registry)),
            Arc::new(SessionManager::new(Arc::clone(&transport), LoginSettings::default())),
            transport,
            DispatchSettings::default(),
        );

        let result = dispatcher.execute(get_payment("PAY-1")).await;
        assert_eq!(result.error().map(CallError::kind), Some(ErrorKind::MissingCredentials));
    }
}

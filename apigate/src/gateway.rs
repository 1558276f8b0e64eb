//! The assembled gateway.

use std::sync::Arc;

use gateway_adapters::{HttpTransport, HyperTransport};
use gateway_auth::{AuthError, AuthStatus, Credentials, LoginOutcome, SessionManager};
use gateway_config::{ConfigError, GatewayConfig};
use gateway_dispatch::{DispatchSettings, Dispatcher};
use gateway_kernel::{
    BatchError, CancellationFlag, ExecutionHistory, HistorySummary, Orchestrator, SchedulerConfig,
    TracingResultSink,
};
use gateway_primitives::{BackendId, ToolCallRequest, ToolCallResult};
use gateway_tools::{LoadReport, RegistryError, SharedRegistry, SpecLoader, ToolDescriptor, ToolRegistry};
use thiserror::Error;
use tracing::info;

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures surfaced by [`Gateway`] operations. Individual tool calls never
/// fail this way; they report through [`ToolCallResult`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Specs could not be loaded.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A batch was malformed.
    #[error(transparent)]
    Batch(#[from] BatchError),
    /// Login could not be attempted.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Loader, registry, sessions, dispatcher and orchestrator wired together.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    loader: SpecLoader,
    registry: Arc<SharedRegistry>,
    sessions: Arc<SessionManager>,
    dispatcher: Arc<Dispatcher>,
    orchestrator: Orchestrator,
}

impl Gateway {
    /// Validates `config`, loads its spec directory and builds the gateway
    /// with the hyper transport.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for invalid settings and
    /// [`GatewayError::Registry`] when no spec loads.
    pub async fn from_config(config: GatewayConfig) -> GatewayResult<(Self, LoadReport)> {
        config.validate()?;
        let transport: Arc<dyn HttpTransport> = Arc::new(HyperTransport::new(config.request_timeout()));
        Self::with_transport(config, transport).await
    }

    /// Same as [`Gateway::from_config`] with a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::from_config`].
    pub async fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> GatewayResult<(Self, LoadReport)> {
        config.validate()?;
        let loader = SpecLoader::new(config.clone());
        let (registry, report) = loader.load_dir(config.spec_dir()).await?;

        let registry = Arc::new(SharedRegistry::new(registry));
        let sessions = Arc::new(SessionManager::from_config(Arc::clone(&transport), &config));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&sessions),
            transport,
            DispatchSettings::from_config(&config),
        ));
        let orchestrator = Orchestrator::new(
            dispatcher.clone(),
            SchedulerConfig::with_limit(config.max_concurrency()),
        )
        .with_history(Arc::new(ExecutionHistory::new()))
        .with_sink(Arc::new(TracingResultSink));

        info!(
            specs = report.loaded.len(),
            tools = report.tool_count(),
            max_concurrency = config.max_concurrency(),
            "gateway ready"
        );
        Ok((
            Self {
                config,
                loader,
                registry,
                sessions,
                dispatcher,
                orchestrator,
            },
            report,
        ))
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Current registry snapshot.
    #[must_use]
    pub fn registry(&self) -> Arc<ToolRegistry> {
        self.registry.snapshot()
    }

    /// Tool list for the planner.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.registry.snapshot().descriptors()
    }

    /// Session manager.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Executes one call.
    pub async fn execute(&self, request: ToolCallRequest) -> ToolCallResult {
        self.dispatcher.execute(request).await
    }

    /// Executes a batch; see [`Orchestrator::execute_batch`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Batch`] for a malformed batch.
    pub async fn execute_batch(&self, requests: Vec<ToolCallRequest>) -> GatewayResult<Vec<ToolCallResult>> {
        Ok(self.orchestrator.execute_batch(requests).await?)
    }

    /// Executes a batch that stops scheduling waves once `cancel` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Batch`] for a malformed batch.
    pub async fn execute_batch_with_cancel(
        &self,
        requests: Vec<ToolCallRequest>,
        cancel: &CancellationFlag,
    ) -> GatewayResult<Vec<ToolCallResult>> {
        Ok(self.orchestrator.execute_batch_with_cancel(requests, cancel).await?)
    }

    /// Replaces the default credentials without any I/O.
    pub fn set_credentials(&self, credentials: Credentials) {
        self.sessions.set_credentials(credentials);
    }

    /// Sets credentials for a single backend.
    pub fn set_credentials_for(&self, backend: BackendId, credentials: Credentials) {
        self.sessions.set_credentials_for(backend, credentials);
    }

    /// Logs in to every configured login domain.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] when no login credentials exist.
    pub async fn perform_login(&self, force: bool) -> GatewayResult<Vec<LoginOutcome>> {
        Ok(self.sessions.perform_login(force).await?)
    }

    /// Per-domain authentication state.
    #[must_use]
    pub fn auth_status(&self) -> Vec<AuthStatus> {
        self.sessions.auth_status()
    }

    /// Reloads the spec directory and swaps the registry. Calls already in
    /// flight finish against the registry they started with. On failure the
    /// current registry stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Registry`] when no spec loads.
    pub async fn reload(&self) -> GatewayResult<LoadReport> {
        let (registry, report) = self.loader.load_dir(self.config.spec_dir()).await?;
        let tools = registry.len();
        let previous = self.registry.replace(registry);
        info!(tools, previous = previous.len(), "registry reloaded");
        Ok(report)
    }

    /// Statistics over every call executed through this gateway.
    #[must_use]
    pub fn history_summary(&self) -> HistorySummary {
        self.orchestrator.summary()
    }

    /// Execution history.
    #[must_use]
    pub fn history(&self) -> &Arc<ExecutionHistory> {
        self.orchestrator.history()
    }
}

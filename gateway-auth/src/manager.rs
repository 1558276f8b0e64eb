//! The session manager.
//!
//! Sessions are shared per login domain (the login URL), so backends that
//! authenticate against the same endpoint reuse one session. Each domain has
//! a [`SessionSlot`] whose async gate admits one login at a time; callers
//! that queue behind a login observe its outcome instead of repeating it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use gateway_adapters::{HttpTransport, Method, OutboundRequest, DEFAULT_TIMEOUT};
use gateway_config::GatewayConfig;
use gateway_primitives::BackendId;
use gateway_telemetry::redact;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::lifecycle::{AuthEvent, AuthState};
use crate::session::{AuthStatus, Session, SessionSlot};

const LOGIN_BODY_EXCERPT: usize = 200;

/// Settings for login requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginSettings {
    session_cookie: String,
    user_agent: String,
    timeout: Duration,
    allow_anonymous: bool,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            session_cookie: "JSESSIONID".to_owned(),
            user_agent: concat!("apigate/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout: DEFAULT_TIMEOUT,
            allow_anonymous: false,
        }
    }
}

impl LoginSettings {
    /// Derives settings from the gateway configuration.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            session_cookie: config.auth().session_cookie().to_owned(),
            user_agent: config.user_agent().to_owned(),
            timeout: config.request_timeout(),
            allow_anonymous: config.auth().allow_anonymous(),
        }
    }

    /// Sets the session cookie name.
    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    /// Allows calls without credentials.
    #[must_use]
    pub fn with_allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    /// Sets the login request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// What a dispatched call presents to its backend.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    session: Option<Arc<Session>>,
    api_key: Option<(String, String)>,
}

impl AuthContext {
    /// Context for calls made without credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn for_credentials(credentials: &Credentials, session: Option<Arc<Session>>) -> Self {
        Self {
            session,
            api_key: credentials
                .api_key()
                .map(|(name, value)| (name.to_owned(), value.to_owned())),
        }
    }

    /// Session to present, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// API-key header, if configured.
    #[must_use]
    pub fn api_key(&self) -> Option<(&str, &str)> {
        self.api_key
            .as_ref()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Headers carrying the API key and the session cookie.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(2);
        if let Some((name, value)) = &self.api_key {
            headers.push((name.clone(), value.clone()));
        }
        if let Some(session) = &self.session {
            headers.push(("Cookie".to_owned(), session.cookie_header()));
        }
        headers
    }
}

/// Result of logging in to one domain via [`SessionManager::perform_login`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Login URL.
    pub domain: String,
    /// Whether a session is now held.
    pub result: AuthResult<()>,
}

#[derive(Debug, Default)]
struct CredentialStore {
    default: Option<Credentials>,
    overrides: HashMap<BackendId, Credentials>,
}

/// Owns credentials and sessions for every backend.
pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    settings: LoginSettings,
    credentials: RwLock<CredentialStore>,
    slots: Mutex<HashMap<String, Arc<SessionSlot>>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("settings", &self.settings)
            .field("domains", &self.auth_status())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager without credentials.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, settings: LoginSettings) -> Self {
        Self {
            transport,
            settings,
            credentials: RwLock::new(CredentialStore::default()),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a manager primed with the configured credentials.
    #[must_use]
    pub fn from_config(transport: Arc<dyn HttpTransport>, config: &GatewayConfig) -> Self {
        let manager = Self::new(transport, LoginSettings::from_config(config));
        if let Some(credentials) = Credentials::from_config(config.auth()) {
            manager.set_credentials(credentials);
        }
        manager
    }

    /// Replaces the default credentials. Performs no I/O; sessions of the
    /// affected domains are discarded.
    pub fn set_credentials(&self, credentials: Credentials) {
        info!(
            domain = credentials.login_url(),
            user = credentials.username().unwrap_or("-"),
            "credentials updated"
        );
        let domains = {
            let mut store = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
            let domain = credentials.login_url().to_owned();
            let old = store.default.replace(credentials);
            old.map(|old| old.login_url().to_owned())
                .into_iter()
                .chain([domain])
                .collect::<Vec<_>>()
        };
        for domain in domains {
            self.reset_domain(&domain, AuthEvent::SetCredentials);
        }
    }

    /// Sets credentials used only for `backend`, overriding the default.
    pub fn set_credentials_for(&self, backend: BackendId, credentials: Credentials) {
        info!(%backend, domain = credentials.login_url(), "backend credentials updated");
        let domains = {
            let mut store = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
            let domain = credentials.login_url().to_owned();
            let old = store.overrides.insert(backend, credentials);
            old.map(|old| old.login_url().to_owned())
                .into_iter()
                .chain([domain])
                .collect::<Vec<_>>()
        };
        for domain in domains {
            self.reset_domain(&domain, AuthEvent::SetCredentials);
        }
    }

    /// Removes the default credentials and their sessions.
    pub fn clear_credentials(&self) {
        let removed = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .default
            .take();
        if let Some(credentials) = removed {
            info!(domain = credentials.login_url(), "credentials cleared");
            self.reset_domain(credentials.login_url(), AuthEvent::ClearCredentials);
        }
    }

    /// Credentials that apply to `backend`.
    #[must_use]
    pub fn credentials_for(&self, backend: &BackendId) -> Option<Credentials> {
        let store = self.credentials.read().unwrap_or_else(PoisonError::into_inner);
        store.overrides.get(backend).or(store.default.as_ref()).cloned()
    }

    /// Returns what a call to `backend` must present, logging in first if
    /// no session is held. Concurrent callers share a single login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when nothing is configured
    /// for the backend and anonymous access is off, and
    /// [`AuthError::LoginFailed`] when the login does not yield a session.
    pub async fn ensure_authenticated(&self, backend: &BackendId) -> AuthResult<AuthContext> {
        let Some(credentials) = self.credentials_for(backend) else {
            return self.anonymous_or_missing(backend);
        };
        let session = self.ensure_session(&credentials).await?;
        Ok(AuthContext::for_credentials(&credentials, session))
    }

    /// Discards `stale` and logs in again, unless another caller already
    /// replaced it since it was issued.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::ensure_authenticated`].
    pub async fn reauthenticate(&self, backend: &BackendId, stale: Option<&Session>) -> AuthResult<AuthContext> {
        let Some(credentials) = self.credentials_for(backend) else {
            return self.anonymous_or_missing(backend);
        };
        if !credentials.requires_login() {
            return Ok(AuthContext::for_credentials(&credentials, None));
        }

        let slot = self.slot(credentials.login_url());
        let _gate = slot.login_gate.lock().await;

        let stale_generation = stale.map_or(0, Session::generation);
        if let Some(current) = slot.session() {
            if current.generation() > stale_generation {
                debug!(domain = %slot.domain, "session already refreshed by another caller");
                return Ok(AuthContext::for_credentials(&credentials, Some(current)));
            }
        } else if slot.generation() > stale_generation {
            let last_failure = slot.state().last_failure.clone();
            if let Some(err) = last_failure {
                return Err(err);
            }
        }

        Self::drop_session(&slot);
        let session = self.login(&slot, &credentials).await?;
        Ok(AuthContext::for_credentials(&credentials, Some(session)))
    }

    /// Discards the session used for `backend`, if any.
    pub fn invalidate(&self, backend: &BackendId) {
        if let Some(credentials) = self.credentials_for(backend) {
            let slot = self.slot(credentials.login_url());
            Self::drop_session(&slot);
        }
    }

    /// Logs in to every configured domain. With `force`, existing sessions
    /// are replaced; otherwise domains already holding one are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when no username/password
    /// credentials are configured anywhere.
    pub async fn perform_login(&self, force: bool) -> AuthResult<Vec<LoginOutcome>> {
        let targets = self.login_targets();
        if targets.is_empty() {
            return Err(AuthError::MissingCredentials {
                domain: "*".to_owned(),
            });
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        for credentials in targets {
            let result = if force {
                let slot = self.slot(credentials.login_url());
                let _gate = slot.login_gate.lock().await;
                Self::drop_session(&slot);
                self.login(&slot, &credentials).await.map(|_| ())
            } else {
                self.ensure_session(&credentials).await.map(|_| ())
            };
            outcomes.push(LoginOutcome {
                domain: credentials.login_url().to_owned(),
                result,
            });
        }
        Ok(outcomes)
    }

    /// State of every known login domain.
    #[must_use]
    pub fn auth_status(&self) -> Vec<AuthStatus> {
        let mut domains: Vec<String> = {
            let store = self.credentials.read().unwrap_or_else(PoisonError::into_inner);
            store
                .default
                .iter()
                .chain(store.overrides.values())
                .map(|credentials| credentials.login_url().to_owned())
                .collect()
        };
        domains.extend(self.slots.lock().unwrap_or_else(PoisonError::into_inner).keys().cloned());
        domains.sort();
        domains.dedup();

        domains
            .into_iter()
            .map(|domain| {
                let slot = self.slots.lock().unwrap_or_else(PoisonError::into_inner).get(&domain).cloned();
                slot.map_or_else(
                    || AuthStatus {
                        domain: domain.clone(),
                        state: AuthState::CredentialsSet,
                        has_session: false,
                        issued_at: None,
                    },
                    |slot| slot.status(),
                )
            })
            .collect()
    }

    fn anonymous_or_missing(&self, backend: &BackendId) -> AuthResult<AuthContext> {
        if self.settings.allow_anonymous {
            debug!(%backend, "no credentials, calling anonymously");
            Ok(AuthContext::anonymous())
        } else {
            Err(AuthError::MissingCredentials {
                domain: backend.to_string(),
            })
        }
    }

    async fn ensure_session(&self, credentials: &Credentials) -> AuthResult<Option<Arc<Session>>> {
        if !credentials.requires_login() {
            return Ok(None);
        }

        let slot = self.slot(credentials.login_url());
        if let Some(session) = slot.session() {
            return Ok(Some(session));
        }

        let observed = slot.generation();
        let _gate = slot.login_gate.lock().await;
        if let Some(session) = slot.session() {
            return Ok(Some(session));
        }
        if slot.generation() != observed {
            // the login we queued behind failed; report it instead of retrying
            let last_failure = slot.state().last_failure.clone();
            if let Some(err) = last_failure {
                return Err(err);
            }
        }

        self.login(&slot, credentials).await.map(Some)
    }

    /// Performs the login exchange. The caller holds the slot's gate.
    async fn login(&self, slot: &SessionSlot, credentials: &Credentials) -> AuthResult<Arc<Session>> {
        slot.state().lifecycle.transition(AuthEvent::BeginLogin)?;
        info!(domain = %slot.domain, user = credentials.username().unwrap_or("-"), "logging in");

        let outcome = self.request_token(credentials).await;
        let generation = slot.finish_attempt();

        let mut state = slot.state();
        match outcome {
            Ok(token) => {
                info!(domain = %slot.domain, token = %redact(&token), "login succeeded");
                let session = Arc::new(Session::new(token, self.settings.session_cookie.clone(), generation));
                match state.lifecycle.transition(AuthEvent::LoginSucceeded) {
                    Ok(_) => {
                        state.session = Some(Arc::clone(&session));
                        state.last_failure = None;
                    }
                    Err(err) => debug!(%err, "credentials changed during login, session not cached"),
                }
                Ok(session)
            }
            Err(err) => {
                warn!(domain = %slot.domain, %err, "login failed");
                if let Err(transition) = state.lifecycle.transition(AuthEvent::LoginFailed) {
                    debug!(%transition, "credentials changed during login");
                }
                state.last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn request_token(&self, credentials: &Credentials) -> AuthResult<String> {
        let domain = credentials.login_url();
        let authorization = credentials.basic_auth_header().ok_or_else(|| AuthError::MissingCredentials {
            domain: domain.to_owned(),
        })?;

        let mut request = OutboundRequest::new(Method::POST, domain)
            .with_header("Authorization", authorization)
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
            .with_header("User-Agent", self.settings.user_agent.clone())
            .with_timeout(self.settings.timeout);
        if let Some((name, value)) = credentials.api_key() {
            request = request.with_header(name, value);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|err| AuthError::login_failed(domain, err.to_string(), None))?;

        let status = response.status();
        if !response.is_success() {
            let body: String = response.text().chars().take(LOGIN_BODY_EXCERPT).collect();
            return Err(AuthError::login_failed(
                domain,
                format!("login returned status {status}: {body}"),
                Some(status),
            ));
        }

        response.cookie(&self.settings.session_cookie).ok_or_else(|| {
            AuthError::login_failed(
                domain,
                format!("response did not set the {} cookie", self.settings.session_cookie),
                Some(status),
            )
        })
    }

    fn login_targets(&self) -> Vec<Credentials> {
        let store = self.credentials.read().unwrap_or_else(PoisonError::into_inner);
        let mut targets: Vec<Credentials> = Vec::new();
        for credentials in store.default.iter().chain(store.overrides.values()) {
            if credentials.requires_login()
                && !targets.iter().any(|known| known.login_url() == credentials.login_url())
            {
                targets.push(credentials.clone());
            }
        }
        targets
    }

    fn slot(&self, domain: &str) -> Arc<SessionSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(domain.to_owned())
                .or_insert_with(|| Arc::new(SessionSlot::new(domain.to_owned(), AuthState::CredentialsSet))),
        )
    }

    fn reset_domain(&self, domain: &str, event: AuthEvent) {
        let slot = self.slots.lock().unwrap_or_else(PoisonError::into_inner).get(domain).cloned();
        if let Some(slot) = slot {
            let mut state = slot.state();
            state.session = None;
            state.last_failure = None;
            if let Err(err) = state.lifecycle.transition(event) {
                debug!(%err, "ignored credential reset");
            }
        }
    }

    fn drop_session(slot: &SessionSlot) {
        let mut state = slot.state();
        if state.session.take().is_some() {
            debug!(domain = %slot.domain, "session invalidated");
            if let Err(err) = state.lifecycle.transition(AuthEvent::Invalidate) {
                debug!(%err, "ignored invalidation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use gateway_adapters::{InboundResponse, TransportResult};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Login endpoint that counts requests and answers after a delay.
    struct ScriptedLogin {
        calls: AtomicUsize,
        status: u16,
        delay: Duration,
    }

    impl ScriptedLogin {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status,
                delay: Duration::from_millis(50),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedLogin {
        async fn send(&self, _request: OutboundRequest) -> TransportResult<InboundResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            let headers = if self.status < 300 {
                vec![("set-cookie".to_owned(), format!("JSESSIONID=token-{call}; Path=/"))]
            } else {
                Vec::new()
            };
            Ok(InboundResponse::new(self.status, headers, "denied"))
        }
    }

    fn backend(name: &str) -> BackendId {
        BackendId::new(name).expect("backend id")
    }

    fn manager(transport: Arc<dyn HttpTransport>) -> SessionManager {
        let manager = SessionManager::new(transport, LoginSettings::default());
        manager.set_credentials(Credentials::basic("svc", "pw", "http://auth.local/login"));
        manager
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_login() {
        let transport = ScriptedLogin::new(200);
        let manager = Arc::new(manager(transport.clone()));

        let callers = (0..10).map(|i| {
            let manager = Arc::clone(&manager);
            // two backends sharing one login domain
            let backend = backend(if i % 2 == 0 { "payments" } else { "accounts" });
            tokio::spawn(async move { manager.ensure_authenticated(&backend).await })
        });
        let results = futures::future::join_all(callers).await;

        assert_eq!(transport.calls(), 1);
        for result in results {
            let context = result.expect("join").expect("authenticated");
            assert_eq!(context.session().map(|s| s.token()), Some("token-1"));
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_failed_login() {
        let transport = ScriptedLogin::new(401);
        let manager = Arc::new(manager(transport.clone()));

        let callers = (0..5).map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.ensure_authenticated(&backend("payments")).await })
        });
        for result in futures::future::join_all(callers).await {
            let err = result.expect("join").expect_err("login fails");
            assert!(matches!(err, AuthError::LoginFailed { status_code: Some(401), .. }));
        }
        assert_eq!(transport.calls(), 1);
        assert_eq!(manager.auth_status()[0].state, AuthState::CredentialsSet);
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_io() {
        let transport = ScriptedLogin::new(200);
        let manager = SessionManager::new(transport.clone(), LoginSettings::default());

        let err = manager.ensure_authenticated(&backend("payments")).await.expect_err("no creds");
        assert_eq!(err, AuthError::MissingCredentials { domain: "payments".into() });
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn anonymous_mode_skips_login() {
        let transport = ScriptedLogin::new(200);
        let manager = SessionManager::new(transport.clone(), LoginSettings::default().with_allow_anonymous(true));

        let context = manager.ensure_authenticated(&backend("payments")).await.expect("anonymous");
        assert!(context.session().is_none());
        assert!(context.headers().is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn reauthenticate_replaces_stale_session_once() {
        let transport = ScriptedLogin::new(200);
        let manager = Arc::new(manager(transport.clone()));
        let payments = backend("payments");

        let first = manager.ensure_authenticated(&payments).await.expect("login");
        let stale = first.session().cloned().expect("session");

        let callers = (0..4).map(|_| {
            let manager = Arc::clone(&manager);
            let stale = Arc::clone(&stale);
            let payments = payments.clone();
            tokio::spawn(async move { manager.reauthenticate(&payments, Some(&stale)).await })
        });
        for result in futures::future::join_all(callers).await {
            let context = result.expect("join").expect("relogin");
            assert_eq!(context.session().map(|s| s.token()), Some("token-2"));
        }
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn set_credentials_discards_sessions() {
        let transport = ScriptedLogin::new(200);
        let manager = manager(transport.clone());
        let payments = backend("payments");

        manager.ensure_authenticated(&payments).await.expect("login");
        assert!(manager.auth_status()[0].has_session);

        manager.set_credentials(Credentials::basic("other", "pw", "http://auth.local/login"));
        let status = &manager.auth_status()[0];
        assert_eq!(status.state, AuthState::CredentialsSet);
        assert!(!status.has_session);

        manager.ensure_authenticated(&payments).await.expect("login again");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn backend_override_uses_its_own_domain() {
        let transport = ScriptedLogin::new(200);
        let manager = manager(transport.clone());
        manager.set_credentials_for(backend("legacy"), Credentials::basic("l", "pw", "http://legacy.local/login"));

        let legacy = manager.ensure_authenticated(&backend("legacy")).await.expect("legacy");
        let payments = manager.ensure_authenticated(&backend("payments")).await.expect("payments");
        assert_ne!(
            legacy.session().map(|s| s.token().to_owned()),
            payments.session().map(|s| s.token().to_owned())
        );
        assert_eq!(manager.auth_status().len(), 2);
    }

    #[tokio::test]
    async fn perform_login_forces_new_sessions() {
        let transport = ScriptedLogin::new(200);
        let manager = manager(transport.clone());

        let outcomes = manager.perform_login(false).await.expect("targets");
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());
        manager.perform_login(false).await.expect("targets");
        assert_eq!(transport.calls(), 1);

        manager.perform_login(true).await.expect("targets");
        assert_eq!(transport.calls(), 2);

        let empty = SessionManager::new(transport, LoginSettings::default());
        assert!(matches!(
            empty.perform_login(true).await,
            Err(AuthError::MissingCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn login_sends_basic_auth_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(header("authorization", "Basic c3ZjOnB3"))
            .and(header("x-api-key", "key-1"))
            .and(header("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=live-token; Path=/; HttpOnly"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = SessionManager::new(
            Arc::new(gateway_adapters::HyperTransport::default()),
            LoginSettings::default(),
        );
        manager.set_credentials(
            Credentials::basic("svc", "pw", format!("{}/auth/login", server.uri())).with_api_key("X-Api-Key", "key-1"),
        );

        let context = manager.ensure_authenticated(&backend("payments")).await.expect("login");
        assert_eq!(context.session().map(|s| s.token()), Some("live-token"));
        assert_eq!(
            context.headers(),
            vec![
                ("X-Api-Key".to_owned(), "key-1".to_owned()),
                ("Cookie".to_owned(), "JSESSIONID=live-token".to_owned()),
            ]
        );
        // fast path, no second request
        manager.ensure_authenticated(&backend("payments")).await.expect("cached");
    }

    #[tokio::test]
    async fn login_without_session_cookie_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let manager = SessionManager::new(
            Arc::new(gateway_adapters::HyperTransport::default()),
            LoginSettings::default(),
        );
        manager.set_credentials(Credentials::basic("svc", "pw", format!("{}/login", server.uri())));

        let err = manager.ensure_authenticated(&backend("payments")).await.expect_err("no cookie");
        assert!(matches!(err, AuthError::LoginFailed { ref reason, .. } if reason.contains("JSESSIONID")));
    }
}

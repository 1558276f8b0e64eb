//! Strongly typed configuration schemas.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, ConfigResult};

const DEFAULT_SPEC_DIR: &str = "./openapi_specs";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RESPONSE_ITEMS: usize = 100;
const DEFAULT_MAX_CONCURRENCY: usize = 5;
const DEFAULT_MOCK_BASE_URL: &str = "http://127.0.0.1:9001";
const DEFAULT_FALLBACK_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_LOGIN_URL: &str = "http://localhost:8080/auth/login";
const DEFAULT_SESSION_COOKIE: &str = "JSESSIONID";

/// Top-level gateway configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub(crate) spec_dir: PathBuf,
    pub(crate) request_timeout_secs: u64,
    pub(crate) max_response_items: usize,
    pub(crate) max_concurrency: usize,
    pub(crate) global_base_url: Option<String>,
    pub(crate) backend_base_urls: BTreeMap<String, String>,
    pub(crate) mock_all: bool,
    pub(crate) mock_base_url: String,
    pub(crate) fallback_base_url: String,
    pub(crate) user_agent: String,
    pub(crate) auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            spec_dir: PathBuf::from(DEFAULT_SPEC_DIR),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_response_items: DEFAULT_MAX_RESPONSE_ITEMS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            global_base_url: None,
            backend_base_urls: BTreeMap::new(),
            mock_all: false,
            mock_base_url: DEFAULT_MOCK_BASE_URL.to_owned(),
            fallback_base_url: DEFAULT_FALLBACK_BASE_URL.to_owned(),
            user_agent: concat!("apigate/", env!("CARGO_PKG_VERSION")).to_owned(),
            auth: AuthConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration populated with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory scanned for specification documents.
    #[must_use]
    pub fn spec_dir(&self) -> &Path {
        &self.spec_dir
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// List length above which responses are truncated.
    #[must_use]
    pub const fn max_response_items(&self) -> usize {
        self.max_response_items
    }

    /// Ceiling on simultaneously in-flight tool calls.
    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Base URL that overrides every backend's declared server.
    #[must_use]
    pub fn global_base_url(&self) -> Option<&str> {
        self.global_base_url.as_deref()
    }

    /// Base URL override for a single backend, keyed by spec name.
    #[must_use]
    pub fn backend_base_url(&self, spec_name: &str) -> Option<&str> {
        self.backend_base_urls.get(spec_name).map(String::as_str)
    }

    /// All per-backend overrides.
    #[must_use]
    pub fn backend_base_urls(&self) -> &BTreeMap<String, String> {
        &self.backend_base_urls
    }

    /// Whether every backend is routed to the mock base URL.
    #[must_use]
    pub const fn mock_all(&self) -> bool {
        self.mock_all
    }

    /// Base URL of the mock server.
    #[must_use]
    pub fn mock_base_url(&self) -> &str {
        &self.mock_base_url
    }

    /// Base URL used when nothing else applies.
    #[must_use]
    pub fn fallback_base_url(&self) -> &str {
        &self.fallback_base_url
    }

    /// `User-Agent` header sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Authentication settings.
    #[must_use]
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Sets the specification directory.
    #[must_use]
    pub fn with_spec_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec_dir = dir.into();
        self
    }

    /// Sets the request timeout, rounded down to whole seconds.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the response item limit.
    #[must_use]
    pub fn with_max_response_items(mut self, items: usize) -> Self {
        self.max_response_items = items;
        self
    }

    /// Sets the concurrency ceiling.
    #[must_use]
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Sets the global base URL override.
    #[must_use]
    pub fn with_global_base_url(mut self, url: impl Into<String>) -> Self {
        self.global_base_url = Some(url.into());
        self
    }

    /// Adds a per-backend base URL override.
    #[must_use]
    pub fn with_backend_base_url(
        mut self,
        spec_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.backend_base_urls.insert(spec_name.into(), url.into());
        self
    }

    /// Routes every backend to the mock base URL.
    #[must_use]
    pub fn with_mock_all(mut self, mock_base_url: impl Into<String>) -> Self {
        self.mock_all = true;
        self.mock_base_url = mock_base_url.into();
        self
    }

    /// Sets the fallback base URL.
    #[must_use]
    pub fn with_fallback_base_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_base_url = url.into();
        self
    }

    /// Replaces the authentication settings.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a limit is zero or a URL is not
    /// an absolute `http`/`https` URL.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "request_timeout_secs",
                "timeout must be greater than zero",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid(
                "max_concurrency",
                "concurrency ceiling must be greater than zero",
            ));
        }
        if self.max_response_items == 0 {
            return Err(ConfigError::invalid(
                "max_response_items",
                "item limit must be greater than zero",
            ));
        }

        validate_http_url("fallback_base_url", &self.fallback_base_url)?;
        validate_http_url("mock_base_url", &self.mock_base_url)?;
        if let Some(url) = &self.global_base_url {
            validate_http_url("global_base_url", url)?;
        }
        for url in self.backend_base_urls.values() {
            validate_http_url("backend_base_urls", url)?;
        }
        self.auth.validate()
    }
}

/// Credentials and session settings applied at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) api_key_name: Option<String>,
    pub(crate) api_key_value: Option<String>,
    pub(crate) login_url: String,
    pub(crate) session_cookie: String,
    pub(crate) allow_anonymous: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            api_key_name: None,
            api_key_value: None,
            login_url: DEFAULT_LOGIN_URL.to_owned(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            allow_anonymous: false,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_key_name", &self.api_key_name)
            .field(
                "api_key_value",
                &self.api_key_value.as_ref().map(|_| "<redacted>"),
            )
            .field("login_url", &self.login_url)
            .field("session_cookie", &self.session_cookie)
            .field("allow_anonymous", &self.allow_anonymous)
            .finish()
    }
}

impl AuthConfig {
    /// Username for Basic-Auth login.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password for Basic-Auth login.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// API-key header name and value, when both are set.
    #[must_use]
    pub fn api_key(&self) -> Option<(&str, &str)> {
        Some((self.api_key_name.as_deref()?, self.api_key_value.as_deref()?))
    }

    /// Login endpoint.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Name of the cookie that carries the session token.
    #[must_use]
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    /// Whether backends may be called without a session.
    #[must_use]
    pub const fn allow_anonymous(&self) -> bool {
        self.allow_anonymous
    }

    /// Sets username and password.
    #[must_use]
    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the API-key header.
    #[must_use]
    pub fn with_api_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.api_key_name = Some(name.into());
        self.api_key_value = Some(value.into());
        self
    }

    /// Sets the login endpoint.
    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Sets the session cookie name.
    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    /// Allows calls without a session when no credentials are configured.
    #[must_use]
    pub fn with_allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    fn validate(&self) -> ConfigResult<()> {
        validate_http_url("auth.login_url", &self.login_url)?;
        if self.session_cookie.trim().is_empty() {
            return Err(ConfigError::invalid(
                "auth.session_cookie",
                "cookie name cannot be empty",
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::invalid(
                "auth.username",
                "username and password must be set together",
            ));
        }
        Ok(())
    }
}

fn validate_http_url(field: &'static str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|err| ConfigError::invalid(field, format!("invalid URL `{value}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            field,
            format!("URL `{value}` must use http or https"),
        ));
    }
    Ok(())
}

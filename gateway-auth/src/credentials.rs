//! Caller-supplied credentials.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gateway_config::AuthConfig;

/// Username/password and optional API-key header for one login domain.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
    api_key: Option<(String, String)>,
    login_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|(name, _)| name))
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl Credentials {
    /// Creates username/password credentials for `login_url`.
    #[must_use]
    pub fn basic(
        username: impl Into<String>,
        password: impl Into<String>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            api_key: None,
            login_url: login_url.into(),
        }
    }

    /// Creates API-key-only credentials; no login is performed for these.
    #[must_use]
    pub fn api_key_only(name: impl Into<String>, value: impl Into<String>, login_url: impl Into<String>) -> Self {
        Self {
            username: None,
            password: None,
            api_key: Some((name.into(), value.into())),
            login_url: login_url.into(),
        }
    }

    /// Adds an API-key header sent with the login and every call.
    #[must_use]
    pub fn with_api_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.api_key = Some((name.into(), value.into()));
        self
    }

    /// Builds credentials from configuration, or `None` when neither a
    /// username/password pair nor an API key is configured.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let api_key = config
            .api_key()
            .map(|(name, value)| (name.to_owned(), value.to_owned()));
        let (username, password) = match (config.username(), config.password()) {
            (Some(user), Some(pass)) => (Some(user.to_owned()), Some(pass.to_owned())),
            _ => (None, None),
        };
        if username.is_none() && api_key.is_none() {
            return None;
        }
        Some(Self {
            username,
            password,
            api_key,
            login_url: config.login_url().to_owned(),
        })
    }

    /// Login endpoint; also the key under which sessions are shared.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Configured username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// API-key header name and value.
    #[must_use]
    pub fn api_key(&self) -> Option<(&str, &str)> {
        self.api_key
            .as_ref()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns `true` when a login yields a session for these credentials.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// `Authorization` header value for the login request.
    #[must_use]
    pub fn basic_auth_header(&self) -> Option<String> {
        let (user, pass) = (self.username.as_deref()?, self.password.as_deref()?);
        Some(format!("Basic {}", STANDARD.encode(format!("{user}:{pass}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_header_is_base64_of_user_and_password() {
        let creds = Credentials::basic("Aladdin", "open sesame", "http://auth/login");
        assert_eq!(
            creds.basic_auth_header().as_deref(),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
        assert!(creds.requires_login());
    }

    #[test]
    fn api_key_only_credentials_skip_login() {
        let creds = Credentials::api_key_only("X-Api-Key", "k", "http://auth/login");
        assert!(!creds.requires_login());
        assert_eq!(creds.basic_auth_header(), None);
        assert_eq!(creds.api_key(), Some(("X-Api-Key", "k")));
    }

    #[test]
    fn config_without_secrets_yields_none() {
        assert!(Credentials::from_config(&AuthConfig::default()).is_none());
        let config = AuthConfig::default().with_basic("svc", "pw").with_api_key("X-Key", "v");
        let creds = Credentials::from_config(&config).expect("credentials");
        assert_eq!(creds.username(), Some("svc"));
        assert_eq!(creds.login_url(), "http://localhost:8080/auth/login");
    }

    #[test]
    fn debug_hides_secrets() {
        let creds = Credentials::basic("svc", "pw-secret", "http://auth").with_api_key("X-Key", "key-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("pw-secret"));
        assert!(!rendered.contains("key-secret"));
    }
}

//! Configuration loader implementations.
//!
//! Layers are applied lowest to highest precedence: defaults, a TOML file,
//! then environment variables.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::base_url::ENV_OVERRIDE_PREFIX;
use crate::error::{ConfigError, ConfigResult};
use crate::schema::GatewayConfig;

impl GatewayConfig {
    /// Parses a configuration from TOML text. Missing fields keep defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML for the
    /// schema.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it cannot be parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builds a configuration from defaults and the process environment,
    /// first loading a `.env` file if one is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable holds an unusable
    /// value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_env()
    }

    /// Overlays the process environment (primed from `.env`) on this
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable holds an unusable
    /// value.
    pub fn apply_env(self) -> ConfigResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => warn!(%err, "ignoring unreadable .env file"),
        }
        self.apply_env_with(std::env::vars())
    }

    /// Overlays the given variables on this configuration.
    ///
    /// Unknown keys are ignored. Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable holds an unusable
    /// value.
    pub fn apply_env_with<I, K, V>(mut self, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut backend_overrides = Vec::new();

        for (key, value) in vars {
            let key = key.as_ref();
            let value: String = value.into();
            if value.trim().is_empty() {
                continue;
            }

            match key {
                "OPENAPI_DIR" => self.spec_dir = PathBuf::from(value),
                "REQUEST_TIMEOUT" => self.request_timeout_secs = parse_number(key, &value)?,
                "MAX_RESPONSE_ITEMS" => self.max_response_items = parse_number(key, &value)?,
                "MAX_TOOL_EXECUTIONS" => self.max_concurrency = parse_number(key, &value)?,
                "FORCE_BASE_URL" => self.global_base_url = Some(value),
                "MOCK_ALL" => self.mock_all = parse_flag(key, &value)?,
                "MOCK_API_BASE_URL" => self.mock_base_url = value,
                "API_USERNAME" => self.auth.username = Some(value),
                "API_PASSWORD" => self.auth.password = Some(value),
                "API_KEY_NAME" => self.auth.api_key_name = Some(value),
                "API_KEY_VALUE" => self.auth.api_key_value = Some(value),
                "LOGIN_URL" => self.auth.login_url = value,
                "SESSION_COOKIE_NAME" => self.auth.session_cookie = value,
                "ALLOW_ANONYMOUS" => self.auth.allow_anonymous = parse_flag(key, &value)?,
                other => {
                    if let Some(suffix) = other.strip_prefix(ENV_OVERRIDE_PREFIX) {
                        backend_overrides.push((suffix.to_owned(), value));
                    }
                }
            }
        }

        // Keyed by env suffix until spec names are known; resolution matches
        // on the normalised key.
        for (suffix, url) in backend_overrides {
            self.backend_base_urls.insert(suffix, url);
        }
        Ok(self)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::InvalidEnv {
            key: key.to_owned(),
            reason: err.to_string(),
        })
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnv {
            key: key.to_owned(),
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}

//! Per-backend base URL resolution.

use tracing::{debug, warn};
use url::Url;

use crate::schema::GatewayConfig;

pub(crate) const ENV_OVERRIDE_PREFIX: &str = "FORCE_BASE_URL_";

/// Returns the environment-variable suffix used for a spec name: upper-cased
/// with every non-alphanumeric character replaced by `_`.
#[must_use]
pub fn env_key_for(spec_name: &str) -> String {
    spec_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Resolves the base URL a backend's requests are sent to.
///
/// Precedence: per-backend override, global override, mock base (when
/// `mock_all` is set), first declared server, fallback. Relative server URLs
/// are joined onto the fallback origin. The result never ends with `/`.
#[must_use]
pub fn resolve_base_url(
    config: &GatewayConfig,
    spec_name: &str,
    declared_servers: &[String],
) -> String {
    let resolved = if let Some(url) = backend_override(config, spec_name) {
        debug!(spec = spec_name, url, "using per-backend base url override");
        url.to_owned()
    } else if let Some(url) = config.global_base_url() {
        debug!(spec = spec_name, url, "using global base url override");
        url.to_owned()
    } else if config.mock_all() {
        config.mock_base_url().to_owned()
    } else if let Some(server) = declared_servers.iter().find(|s| !s.trim().is_empty()) {
        absolutize(server.trim(), config.fallback_base_url())
    } else {
        config.fallback_base_url().to_owned()
    };

    resolved.trim_end_matches('/').to_owned()
}

fn backend_override<'a>(config: &'a GatewayConfig, spec_name: &str) -> Option<&'a str> {
    if let Some(url) = config.backend_base_url(spec_name) {
        return Some(url);
    }
    let wanted = env_key_for(spec_name);
    config
        .backend_base_urls()
        .iter()
        .find(|(key, _)| env_key_for(key) == wanted)
        .map(|(_, url)| url.as_str())
}

fn absolutize(server: &str, fallback: &str) -> String {
    if Url::parse(server).is_ok() {
        return server.to_owned();
    }
    match Url::parse(fallback).and_then(|base| base.join(server)) {
        Ok(joined) => joined.to_string(),
        Err(err) => {
            warn!(server, %err, "unusable server url, using fallback");
            fallback.to_owned()
        }
    }
}

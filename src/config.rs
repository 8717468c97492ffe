//! Runtime configuration resolved once at start-up

use crate::constants::{BACKEND_URL_ENV, DEFAULT_BACKEND_URL, REQUEST_TIMEOUT, STALE_TIME};
use crate::settings::Settings;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url {url:?}: {source}")]
    InvalidBackendUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend url must use http or https: {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub request_timeout: Duration,
    pub stale_time: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: Url::parse(DEFAULT_BACKEND_URL).expect("default backend url is valid"),
            request_timeout: REQUEST_TIMEOUT,
            stale_time: STALE_TIME,
        }
    }
}

impl Config {
    /// Environment (after loading `.env`) wins over settings.json, which wins
    /// over the built-in default.
    pub fn load(settings: &Settings) -> Result<Self, ConfigError> {
        match dotenv::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(_) => debug!("No .env file found"),
        }
        let from_env = std::env::var(BACKEND_URL_ENV).ok();
        let config = Self::resolve(from_env.as_deref(), settings.backend_url.as_deref())?;
        info!(backend = %config.backend_url, "Configuration resolved");
        Ok(config)
    }

    pub fn resolve(from_env: Option<&str>, from_settings: Option<&str>) -> Result<Self, ConfigError> {
        let raw = [from_env, from_settings]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL);

        Ok(Self {
            backend_url: parse_backend_url(raw)?,
            ..Self::default()
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBackendUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme(raw.to_string())),
    }
}

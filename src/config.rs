//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Base URLs of the external endpoints. Any of them may be unset; the
/// corresponding wizard step then shows an empty result.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    pub streets_url: Option<String>,
    pub offers_url: Option<String>,
    pub creatives_url: Option<String>,
}

impl EndpointConfig {
    /// Build from `LOCA_STREETS_API_URL`, `LOCA_OFFERS_API_URL`, and
    /// `LOCA_CREATIVES_API_URL`. Rejects values that are not http(s) URLs.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            streets_url: url_var("LOCA_STREETS_API_URL")?,
            offers_url: url_var("LOCA_OFFERS_API_URL")?,
            creatives_url: url_var("LOCA_CREATIVES_API_URL")?,
        })
    }

    /// Names of the endpoints that are configured.
    pub fn configured(&self) -> Vec<&'static str> {
        [
            ("streets", &self.streets_url),
            ("offers", &self.offers_url),
            ("creatives", &self.creatives_url),
        ]
        .into_iter()
        .filter(|(_, url)| url.is_some())
        .map(|(name, _)| name)
        .collect()
    }
}

fn url_var(key: &str) -> Result<Option<String>, ConfigError> {
    let Some(value) = std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };
    validate_url(key, &value)?;
    Ok(Some(value))
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(())
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct LocaConfig {
    pub endpoints: EndpointConfig,
    /// Port for the HTTP server.
    pub port: u16,
    /// Path of the libSQL database holding the wizard record.
    pub db_path: PathBuf,
    /// Timeout applied to every external request.
    pub http_timeout: Duration,
    /// Interval between campaign launch progress ticks.
    pub launch_tick: Duration,
    /// Idle time after which an unfinished wizard session is dropped.
    pub session_ttl: Duration,
}

impl Default for LocaConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            port: 8080,
            db_path: PathBuf::from("./data/loca.db"),
            http_timeout: Duration::from_secs(30),
            launch_tick: Duration::from_millis(800),
            session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl LocaConfig {
    /// Build config from environment variables, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port: u16 = std::env::var("LOCA_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let db_path = std::env::var("LOCA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let http_timeout = std::env::var("LOCA_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let launch_tick = std::env::var("LOCA_LAUNCH_TICK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.launch_tick);

        let session_ttl = std::env::var("LOCA_SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_ttl);

        Ok(Self {
            endpoints: EndpointConfig::from_env()?,
            port,
            db_path,
            http_timeout,
            launch_tick,
            session_ttl,
        })
    }
}

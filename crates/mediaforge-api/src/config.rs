//! Recognized configuration options (spec §6), loaded as a typed
//! [`Settings`] rather than read ad hoc at each call site, the same flat,
//! env-overridable settings object `app/config.py`'s `Settings(BaseSettings)`
//! gives the original service, adapted to the `config` crate's layered
//! loader instead of `pydantic-settings`.

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub rate_limit_enabled: bool,
    pub rate_limit_calls: u64,
    pub rate_limit_period_seconds: u64,
    /// Default 100 MiB (spec §6).
    pub max_body_size_bytes: u64,
    pub cors_origins: Vec<String>,
    pub webhook_max_retries: u32,
    pub webhook_timeout_seconds: u64,
    pub webhook_secret: Option<String>,
    pub cache_max_fallback_size: usize,
    pub enable_ip_allowlist: bool,
    pub ip_allowlist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            environment: "production".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            rate_limit_enabled: true,
            rate_limit_calls: 1000,
            rate_limit_period_seconds: 3600,
            max_body_size_bytes: 100 * 1024 * 1024,
            cors_origins: Vec::new(),
            webhook_max_retries: 5,
            webhook_timeout_seconds: 30,
            webhook_secret: None,
            cache_max_fallback_size: 1000,
            enable_ip_allowlist: false,
            ip_allowlist: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads defaults overlaid with `MEDIAFORGE_*` environment variables
    /// (e.g. `MEDIAFORGE_PORT=9000`, `MEDIAFORGE_RATE_LIMIT_ENABLED=false`).
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(Environment::with_prefix("MEDIAFORGE").try_parsing(true).separator("_"))
            .build()?
            .try_deserialize()
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_seconds)
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_seconds)
    }
}

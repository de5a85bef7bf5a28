//! Client configuration (layered: code > env > config file).

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AcontextError, Result};

/// Default API root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.acontext.app/api/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<ClientConfig> = OnceLock::new();

/// Connection settings for [`AcontextClient`](crate::client::AcontextClient).
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("acontext-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// On-disk shape of a config file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (`ACONTEXT_API_KEY`, `ACONTEXT_BASE_URL`,
    /// `ACONTEXT_TIMEOUT_SECS`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();

        if let Ok(key) = std::env::var("ACONTEXT_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("ACONTEXT_BASE_URL") {
            config.base_url = url;
        }
        if let Some(secs) = std::env::var("ACONTEXT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Parse a TOML document with `api_key`, `base_url` and `timeout_secs` keys.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|e| AcontextError::Configuration(format!("invalid config file: {e}")))?;

        let mut config = Self::new();
        config.api_key = file.api_key;
        if let Some(url) = file.base_url {
            config.base_url = url;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AcontextError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static ClientConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without a trailing slash.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

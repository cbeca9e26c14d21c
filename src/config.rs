//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$EZGMAIL_CONFIG` (environment variable)
//! 2. `~/.config/ezgmail/config.toml` (Linux)
//!    `~/Library/Application Support/ezgmail/config.toml` (macOS)
//!    `%APPDATA%\ezgmail\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::query::DEFAULT_MAX_RESULTS;
use crate::transport::DEFAULT_BASE_URL;

/// Directory under the home directory holding the token cache.
pub const TOKEN_CACHE_DIR: &str = ".ezGmail";

/// Token cache file name.
pub const TOKEN_CACHE_FILE: &str = "ezGmail.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Which mailbox to read and where its credentials live.
    pub account: AccountConfig,
    /// Remote API settings.
    pub api: ApiConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Mailbox owner; `me` is the authenticated user.
    pub user: String,
    /// Google client-secret JSON document.
    pub credentials_path: PathBuf,
    /// Override for the token cache (default `~/.ezGmail/ezGmail.json`).
    pub token_cache_path: Option<PathBuf>,
    /// Default page size for listings.
    pub max_results: u32,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the Gmail REST API.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user: "me".to_string(),
            credentials_path: PathBuf::from("client_secret.json"),
            token_cache_path: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("EZGMAIL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("ezgmail").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ezgmail")
}

/// Where the OAuth token is cached.
///
/// `None` only when no override is configured and the home directory is
/// unknown.
pub fn token_cache_path(config: &Config) -> Option<PathBuf> {
    if let Some(ref path) = config.account.token_cache_path {
        return Some(path.clone());
    }
    dirs::home_dir().map(|home| home.join(TOKEN_CACHE_DIR).join(TOKEN_CACHE_FILE))
}

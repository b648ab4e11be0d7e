//! Configuration types for the beacon gateway

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `backend.base_url`
pub const BACKEND_URL_ENV: &str = "BEACON_BACKEND_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub guard: GuardConfig,
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("Backend URL overridden by {}", BACKEND_URL_ENV);
                self.backend.base_url = url;
            }
        }
    }

    /// Reject configurations the gateway cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(crate::BeaconError::Config(format!(
                "backend.base_url must be an http(s) URL, got {:?}",
                self.backend.base_url
            )));
        }
        if self.session.cookie_name.is_empty() {
            return Err(crate::BeaconError::Config(
                "session.cookie_name must not be empty".to_string(),
            ));
        }
        for path in [&self.guard.landing_page, &self.guard.sign_in_page] {
            if !path.starts_with('/') {
                return Err(crate::BeaconError::Config(format!(
                    "guard pages must be absolute paths, got {:?}",
                    path
                )));
            }
        }
        Ok(())
    }
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Monitoring backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Session cookie and token lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: u64,
    #[serde(default = "default_refresh_buffer_ms")]
    pub refresh_buffer_ms: u64,
    #[serde(default)]
    pub secure_cookie: bool,
    #[serde(default = "default_true")]
    pub sign_out_on_refresh_error: bool,
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_seconds: default_max_age_seconds(),
            refresh_buffer_ms: default_refresh_buffer_ms(),
            secure_cookie: false,
            sign_out_on_refresh_error: true,
            purge_interval_seconds: default_purge_interval_seconds(),
        }
    }
}

/// Route guard path lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_landing_page")]
    pub landing_page: String,
    #[serde(default = "default_sign_in_page")]
    pub sign_in_page: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            public_paths: default_public_paths(),
            exempt_paths: default_exempt_paths(),
            api_prefix: default_api_prefix(),
            landing_page: default_landing_page(),
            sign_in_page: default_sign_in_page(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_cookie_name() -> String {
    "beacon_session".to_string()
}

fn default_max_age_seconds() -> u64 {
    30 * 24 * 60 * 60
}

fn default_refresh_buffer_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_purge_interval_seconds() -> u64 {
    300
}

fn default_public_paths() -> Vec<String> {
    [
        "/login",
        "/register",
        "/reset-password",
        "/verify-otp",
        "/forgot-password",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_exempt_paths() -> Vec<String> {
    ["/health", "/_next/static", "/_next/image", "/favicon.ico"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_landing_page() -> String {
    "/dashboard".to_string()
}

fn default_sign_in_page() -> String {
    "/login".to_string()
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::BeaconError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

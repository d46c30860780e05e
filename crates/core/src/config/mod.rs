//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FOLIO_SW_*)
//! 2. TOML config file (if FOLIO_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Fixed message carried by the synthesized offline response.
pub const OFFLINE_MESSAGE: &str = "You are offline. Please check your connection and try again.";

/// Controller configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FOLIO_SW_*)
/// 2. TOML config file (if FOLIO_SW_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List values in environment variables use figment's array syntax,
/// e.g. `FOLIO_SW_PRECACHE_URLS='["/", "/manifest.json"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the controller is installed for; other origins pass through.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix of every namespace this controller owns.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version of the current deployment. Bumping it rotates the namespace.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Critical assets fetched during install. Relative paths resolve against `origin`.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Document served to navigations while offline.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Path prefix that marks a request as API traffic.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// API routes whose successful responses are kept for offline use.
    #[serde(default = "default_cacheable_api_routes")]
    pub cacheable_api_routes: Vec<String>,

    /// Tag of the background-sync trigger that drains the submission queue.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Path queued submissions are POSTed to.
    #[serde(default = "default_sync_endpoint")]
    pub sync_endpoint: String,

    /// Failed resends after which a queued submission is discarded.
    #[serde(default = "default_max_sync_attempts")]
    pub max_sync_attempts: u32,

    /// Title used for push notifications without one.
    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./folio-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_prefix() -> String {
    "portfolio".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_precache_urls() -> Vec<String> {
    vec!["/".into(), "/static/js/bundle.js".into(), "/static/css/main.css".into(), "/manifest.json".into()]
}

fn default_root_document() -> String {
    "/".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_cacheable_api_routes() -> Vec<String> {
    vec!["/api/portfolio".into()]
}

fn default_sync_tag() -> String {
    "contact-form-sync".into()
}

fn default_sync_endpoint() -> String {
    "/api/contact".into()
}

fn default_max_sync_attempts() -> u32 {
    5
}

fn default_notification_title() -> String {
    "Portfolio update".into()
}

fn default_user_agent() -> String {
    "folio-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            root_document: default_root_document(),
            api_prefix: default_api_prefix(),
            cacheable_api_routes: default_cacheable_api_routes(),
            sync_tag: default_sync_tag(),
            sync_endpoint: default_sync_endpoint(),
            max_sync_attempts: default_max_sync_attempts(),
            notification_title: default_notification_title(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the namespace owned by the current deployment.
    pub fn current_namespace(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let parsed = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FOLIO_SW_`
    /// 2. TOML file from `FOLIO_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FOLIO_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FOLIO_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

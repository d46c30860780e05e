//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `cache_prefix` or `cache_version` is empty
    /// - a path setting does not start with `/`
    /// - a cacheable API route lies outside `api_prefix`
    /// - a precache URL is malformed or resolves to another origin
    /// - `max_sync_attempts` is 0 or above 100
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.origin_url()?;

        if self.cache_prefix.is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }
        if self.cache_version.is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        for (field, path) in [
            ("root_document", &self.root_document),
            ("api_prefix", &self.api_prefix),
            ("sync_endpoint", &self.sync_endpoint),
        ] {
            if !path.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if let Some(route) = self.cacheable_api_routes.iter().find(|r| !r.starts_with(&self.api_prefix)) {
            return Err(ConfigError::Invalid {
                field: "cacheable_api_routes".into(),
                reason: format!("{route} is outside api_prefix {}", self.api_prefix),
            });
        }

        if self.max_sync_attempts == 0 || self.max_sync_attempts > 100 {
            return Err(invalid("max_sync_attempts", "must be between 1 and 100"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        for entry in &self.precache_urls {
            let resolved = origin.join(entry).map_err(|e| ConfigError::Invalid {
                field: "precache_urls".into(),
                reason: format!("{entry}: {e}"),
            })?;
            if resolved.origin() != origin.origin() {
                return Err(ConfigError::Invalid {
                    field: "precache_urls".into(),
                    reason: format!("{entry} is not on origin {}", self.origin),
                });
            }
        }

        if self.precache_urls.is_empty() {
            tracing::warn!("precache_urls is empty; install will store nothing and offline navigation has no fallback");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_relative_api_prefix() {
        let config = AppConfig { api_prefix: "api/".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_prefix"));
    }

    #[test]
    fn test_validate_route_outside_api_prefix() {
        let config = AppConfig { cacheable_api_routes: vec!["/portfolio".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cacheable_api_routes"));
    }

    #[test]
    fn test_validate_sync_attempts_bounds() {
        let config = AppConfig { max_sync_attempts: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_sync_attempts"));

        let config = AppConfig { max_sync_attempts: 101, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_sync_attempts"));

        let config = AppConfig { max_sync_attempts: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_cross_origin_precache() {
        let config = AppConfig {
            precache_urls: vec!["/".into(), "https://cdn.example.com/lib.js".into()],
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "precache_urls"));

        let config = AppConfig {
            precache_urls: vec!["/".into(), "http://localhost:3000/static/js/bundle.js".into()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }
}

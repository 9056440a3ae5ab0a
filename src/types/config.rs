//! Configuration types
//!
//! Startup configuration for the remote backend client and the local store,
//! read once from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Remote backend endpoint URL
pub const ENV_REMOTE_URL: &str = "SUPABASE_URL";
/// Remote backend API key
pub const ENV_REMOTE_KEY: &str = "SUPABASE_ANON_KEY";
/// Optional request timeout override, in seconds
pub const ENV_HTTP_TIMEOUT: &str = "FINCACHE_HTTP_TIMEOUT_SECS";
/// Optional override of the directory holding the local store
pub const ENV_DATA_DIR: &str = "FINCACHE_DATA_DIR";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Missing or unusable startup configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Could not determine a data directory")]
    NoDataDir,
}

/// Remote backend client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the backend, without a trailing slash
    pub url: String,
    /// Public API key sent with every request
    pub anon_key: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Build a config from explicit values, applying the same checks as `from_env`
    pub fn new(url: &str, anon_key: &str) -> Result<Self, ConfigurationError> {
        let mut config = Self {
            url: url.to_string(),
            anon_key: anon_key.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read the config from process environment variables
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the config through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = required(&lookup, ENV_REMOTE_URL)?;
        let anon_key = required(&lookup, ENV_REMOTE_KEY)?;

        let mut config = Self::new(&url, &anon_key)?;

        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigurationError::Invalid {
                    key: ENV_HTTP_TIMEOUT,
                    reason: e.to_string(),
                })?;
            config.validate()?;
        }

        Ok(config)
    }

    /// Normalize and check values
    pub fn validate(&mut self) -> Result<(), ConfigurationError> {
        self.url = self.url.trim().trim_end_matches('/').to_string();
        self.anon_key = self.anon_key.trim().to_string();

        if self.url.is_empty() {
            return Err(ConfigurationError::Missing(ENV_REMOTE_URL));
        }
        if self.anon_key.is_empty() {
            return Err(ConfigurationError::Missing(ENV_REMOTE_KEY));
        }

        let parsed = reqwest::Url::parse(&self.url).map_err(|e| ConfigurationError::Invalid {
            key: ENV_REMOTE_URL,
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigurationError::Invalid {
                key: ENV_REMOTE_URL,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigurationError::Invalid {
                key: ENV_HTTP_TIMEOUT,
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Local store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory the store directory is created in
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `FINCACHE_DATA_DIR` if set, otherwise the platform data directory
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            return Ok(Self::at(dir.trim()));
        }

        crate::storage::get_data_dir()
            .map(Self::at)
            .map_err(|_| ConfigurationError::NoDataDir)
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigurationError::Missing(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_remote_config_from_lookup() {
        let config = RemoteConfig::from_lookup(env(&[
            (ENV_REMOTE_URL, "https://abc.supabase.co/"),
            (ENV_REMOTE_KEY, " anon-key "),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://abc.supabase.co");
        assert_eq!(config.anon_key, "anon-key");
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let err = RemoteConfig::from_lookup(env(&[(ENV_REMOTE_KEY, "anon-key")])).unwrap_err();
        assert_eq!(err, ConfigurationError::Missing(ENV_REMOTE_URL));
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let err = RemoteConfig::from_lookup(env(&[
            (ENV_REMOTE_URL, "https://abc.supabase.co"),
            (ENV_REMOTE_KEY, "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigurationError::Missing(ENV_REMOTE_KEY));
    }

    #[test]
    fn test_invalid_url_and_timeout() {
        let err = RemoteConfig::new("not a url", "key").unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid { key: ENV_REMOTE_URL, .. }));

        let err = RemoteConfig::new("ftp://abc.supabase.co", "key").unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid { key: ENV_REMOTE_URL, .. }));

        let err = RemoteConfig::from_lookup(env(&[
            (ENV_REMOTE_URL, "https://abc.supabase.co"),
            (ENV_REMOTE_KEY, "key"),
            (ENV_HTTP_TIMEOUT, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid { key: ENV_HTTP_TIMEOUT, .. }));
    }

    #[test]
    fn test_timeout_override() {
        let config = RemoteConfig::from_lookup(env(&[
            (ENV_REMOTE_URL, "http://localhost:54321"),
            (ENV_REMOTE_KEY, "key"),
            (ENV_HTTP_TIMEOUT, "5"),
        ]))
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_store_config_override() {
        let config = StoreConfig::from_lookup(env(&[(ENV_DATA_DIR, "/tmp/fincache-test")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fincache-test"));
    }
}

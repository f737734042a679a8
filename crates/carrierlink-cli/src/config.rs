//! Configuration management for the CLI
//!
//! Provider settings come from a config file (YAML, JSON or TOML) and are
//! completed from `<PROVIDER>_*` environment variables. This is the only
//! place the process environment is read; the adapters receive plain
//! [`Credentials`] and [`AdapterConfig`] values.

use crate::error::{Error, Result};
use carrierlink_core::{AdapterConfig, Credentials, RetryPolicy, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider configurations keyed by provider id
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration
///
/// Which credential fields matter depends on the provider: Shiprocket takes
/// `token` or `email` + `password`, UPS takes `access_key` + `username` +
/// `password` or `client_id` + `client_secret`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub access_key: Option<String>,
    pub username: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Overrides the adapter's built-in API endpoint
    pub base_url: Option<String>,

    /// Total time budget for one HTTP request
    pub timeout_secs: Option<u64>,

    /// Retries for idempotent reads after the first attempt
    pub max_retries: Option<u32>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "YAML, JSON or TOML".to_string(),
                })
            }
        };

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in &Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config file");
                    }
                }
            }
        }

        tracing::debug!("No configuration file found, relying on environment");
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("carrierlink.yaml"),
            PathBuf::from("carrierlink.yml"),
            PathBuf::from("carrierlink.json"),
            PathBuf::from("carrierlink.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join("carrierlink");
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.yml"));
            paths.push(dir.join("config.json"));
            paths.push(dir.join("config.toml"));
        }

        paths
    }

    /// File settings for `provider`, ids compared case-insensitively
    pub fn get_provider(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider))
            .map(|(_, config)| config)
    }

    /// File settings completed from the process environment
    pub fn resolve_provider(&self, provider: &str) -> ProviderConfig {
        let mut resolved = self.get_provider(provider).cloned().unwrap_or_default();
        resolved.fill_from_env(provider, |key| std::env::var(key).ok());
        resolved
    }
}

impl ProviderConfig {
    /// Fill fields the file left empty from `<PROVIDER>_<FIELD>` variables
    ///
    /// Values present in the file win; blank variables are ignored. When the
    /// file already holds a complete credential set, no credential field is
    /// taken from the environment.
    pub fn fill_from_env<F>(&mut self, provider: &str, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = provider.to_uppercase();
        let var = |suffix: &str| {
            lookup(&format!("{}_{}", prefix, suffix))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if is_blank(&self.base_url) {
            if let Some(value) = var("BASE_URL") {
                self.base_url = Some(value);
            }
        }

        let file_credentials = self.credentials();
        if !file_credentials.is_none() {
            tracing::debug!(
                provider,
                credentials = file_credentials.kind(),
                "Using credentials from the config file"
            );
        }

        for (suffix, field) in [
            ("TOKEN", &mut self.token),
            ("EMAIL", &mut self.email),
            ("PASSWORD", &mut self.password),
            ("ACCESS_KEY", &mut self.access_key),
            ("USERNAME", &mut self.username),
            ("CLIENT_ID", &mut self.client_id),
            ("CLIENT_SECRET", &mut self.client_secret),
        ] {
            if file_credentials.is_none() && is_blank(field) {
                if let Some(value) = var(suffix) {
                    *field = Some(value);
                }
            }
        }

        if self.timeout_secs.is_none() {
            self.timeout_secs = var("TIMEOUT_SECS").and_then(|v| parse_env(&prefix, "TIMEOUT_SECS", &v));
        }
        if self.max_retries.is_none() {
            self.max_retries = var("MAX_RETRIES").and_then(|v| parse_env(&prefix, "MAX_RETRIES", &v));
        }
    }

    /// Credentials in the shape the configured fields describe
    ///
    /// A token beats a login, a login beats an access key, and an access
    /// key beats OAuth client credentials.
    pub fn credentials(&self) -> Credentials {
        let field = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        if let Some(token) = field(&self.token) {
            return Credentials::token(token);
        }
        if let (Some(email), Some(password)) = (field(&self.email), field(&self.password)) {
            return Credentials::email_password(email, password);
        }
        if let (Some(access_key), Some(username), Some(password)) =
            (field(&self.access_key), field(&self.username), field(&self.password))
        {
            return Credentials::AccessKey {
                access_key,
                username,
                password,
            };
        }
        if let (Some(client_id), Some(client_secret)) = (field(&self.client_id), field(&self.client_secret)) {
            return Credentials::OAuth {
                client_id,
                client_secret,
            };
        }
        Credentials::None
    }

    /// Adapter settings for the configured endpoint, timeout and retries
    pub fn adapter_config(&self) -> Result<AdapterConfig> {
        let mut config = AdapterConfig::default();

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }

        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err(Error::config("timeout_secs must be greater than zero"));
            }
            let request = Duration::from_secs(secs);
            let defaults = TimeoutConfig::default();
            let connect = defaults.connect_timeout.min(request);
            config = config.with_timeouts(TimeoutConfig::new(connect, request));
        }

        if let Some(retries) = self.max_retries {
            config = config.with_retry(RetryPolicy::new(retries));
        }

        Ok(config)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(prefix: &str, suffix: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(variable = %format!("{}_{}", prefix, suffix), value, "Ignoring unparseable environment value");
            None
        }
    }
}

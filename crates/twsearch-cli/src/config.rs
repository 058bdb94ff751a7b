//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (TOML, or YAML/JSON by extension)
//! - Environment variables (credentials only)
//!
//! Command-line flags are applied on top by the handlers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use twsearch_core::{ClientConfig, Credentials, RetryPolicy};

/// Environment variable holding the consumer API key
pub const API_KEY_ENV: &str = "TWSEARCH_API_KEY";
/// Environment variable holding the consumer API secret
pub const API_SECRET_ENV: &str = "TWSEARCH_API_SECRET";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub credentials: CredentialsConfig,
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Application identity, sent as the User-Agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
}

/// Consumer credentials
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialsConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

/// API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Fetch loop defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Tweets requested per page
    pub count: i64,

    /// Maximum tweets per run, -1 for no limit
    pub dispcount: i64,

    pub retry_max: u32,

    /// Seconds between retries
    pub interval_secs: u64,
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file; derived from `prefix` and `extension` when unset
    pub file: Option<PathBuf>,
    pub prefix: String,
    pub extension: String,
    pub resume_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Twitter-Search".to_string(),
            version: "2.0".to_string(),
        }
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("CredentialsConfig")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &mask(&self.api_secret))
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: twsearch_core::http::client::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            count: 100,
            dispcount: -1,
            retry_max: 5,
            interval_secs: 5,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: None,
            prefix: "twsearch".to_string(),
            extension: "csv".to_string(),
            resume_file: PathBuf::from("twsearch.resume.json"),
        }
    }
}

/// On-disk format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            Some("json") => Format::Json,
            _ => Format::Toml,
        }
    }
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

        let config = match Format::of(path) {
            Format::Yaml => serde_yaml::from_str(&content)?,
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                return Self::from_file(&path);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations,
    /// then apply credential overrides from the environment
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be greater than 0".to_string()));
        }
        if self.output.file.is_none() && self.output.prefix.trim().is_empty() {
            return Err(Error::Config("output.prefix must not be empty".to_string()));
        }
        Ok(())
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("twsearch.toml"), PathBuf::from(".twsearch.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("twsearch").join("config.toml"));
        }

        paths
    }

    /// Override credentials with non-empty values from `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = present(API_KEY_ENV) {
            self.credentials.api_key = Some(key);
        }
        if let Some(secret) = present(API_SECRET_ENV) {
            self.credentials.api_secret = Some(secret);
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.credentials.api_key.clone().unwrap_or_default(),
            self.credentials.api_secret.clone().unwrap_or_default(),
        )
    }

    /// Session settings for the core client
    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig::default()
            .with_app(&self.app.name, &self.app.version)
            .with_base_url(&self.api.base_url)?
            .with_timeout(Duration::from_secs(self.api.timeout_secs)))
    }

    /// Retry policy, with optional command-line overrides
    pub fn retry_policy(&self, retry_max: Option<u32>, interval_secs: Option<u64>) -> RetryPolicy {
        RetryPolicy::new(retry_max.unwrap_or(self.fetch.retry_max))
            .with_interval_secs(interval_secs.unwrap_or(self.fetch.interval_secs))
    }

    /// Output file when none is given on the command line.
    ///
    /// JSON output uses `<prefix>.json` unless `file` is set.
    pub fn default_output(&self, json: bool) -> PathBuf {
        match (&self.output.file, json) {
            (Some(file), _) => file.clone(),
            (None, true) => PathBuf::from(format!("{}.json", self.output.prefix)),
            (None, false) => PathBuf::from(format!("{}.{}", self.output.prefix, self.output.extension)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.app.name, "Twitter-Search");
        assert_eq!(config.api.base_url, "https://api.twitter.com");
        assert_eq!(config.fetch.count, 100);
        assert_eq!(config.fetch.dispcount, -1);
        assert_eq!(config.fetch.retry_max, 5);
        assert_eq!(config.default_output(false), PathBuf::from("twsearch.csv"));
        assert_eq!(config.default_output(true), PathBuf::from("twsearch.json"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twsearch.toml");
        fs::write(
            &path,
            "[credentials]\napi_key = \"key\"\napi_secret = \"secret\"\n\n[fetch]\nretry_max = 2\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.credentials.api_key.as_deref(), Some("key"));
        assert_eq!(config.fetch.retry_max, 2);
        assert_eq!(config.fetch.interval_secs, 5);
        assert_eq!(config.output.resume_file, PathBuf::from("twsearch.resume.json"));
    }

    #[test]
    fn test_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twsearch.yaml");
        fs::write(&path, "app:\n  name: Harvester\n  version: \"9\"\noutput:\n  file: out.csv\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.app.name, "Harvester");
        assert_eq!(config.default_output(true), PathBuf::from("out.csv"));
        let client = config.client_config().unwrap();
        assert_eq!(client.user_agent, "Harvester 9");
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/twsearch.toml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = Config::default();
        config.credentials.api_key = Some("file-key".to_string());
        let env: HashMap<&str, &str> = [(API_KEY_ENV, "env-key"), (API_SECRET_ENV, " ")].into();

        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.credentials.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.credentials.api_secret, None);
        assert!(config.credentials().validate().is_err());
    }

    #[test]
    fn test_retry_policy_overrides() {
        let config = Config::default();
        let policy = config.retry_policy(Some(1), None);
        assert_eq!(policy.retry_max, 1);
        assert_eq!(policy.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_credentials_debug_is_masked() {
        let mut config = Config::default();
        config.credentials.api_secret = Some("hunter2".to_string());
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}

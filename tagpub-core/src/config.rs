//! Layered service configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.tagpub/
//!   config.yaml   (optional: every key has a built-in default)
//! ```
//!
//! # Layering
//!
//! Built-in defaults, then `config.yaml`, then environment
//! (`TAGPUB_STORE_URL`, `TAGPUB_REGISTRY_URL`). The CLI applies its flags on
//! top via [`Config::with_endpoints`].
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const STORE_URL_ENV: &str = "TAGPUB_STORE_URL";
pub const REGISTRY_URL_ENV: &str = "TAGPUB_REGISTRY_URL";

const DEFAULT_STORE_URL: &str = "http://localhost:7070";
const DEFAULT_REGISTRY_URL: &str = "http://localhost:9090";

/// Bounded polling applied after an upload, waiting for the store to report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 30,
        }
    }
}

impl ConsistencyConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Endpoints and timing for the store and registry clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_url: String,
    pub registry_url: String,
    pub http_timeout_secs: u64,
    pub consistency: ConsistencyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            http_timeout_secs: 30,
            consistency: ConsistencyConfig::default(),
        }
    }
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Override endpoints from a lookup function (normally `std::env::var`).
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(STORE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.store_url = url;
        }
        if let Some(url) = lookup(REGISTRY_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.registry_url = url;
        }
        self
    }

    /// Override endpoints with explicit values (CLI flags); `None` keeps the current one.
    pub fn with_endpoints(
        mut self,
        store_url: Option<String>,
        registry_url: Option<String>,
    ) -> Self {
        if let Some(url) = store_url {
            self.store_url = url;
        }
        if let Some(url) = registry_url {
            self.registry_url = url;
        }
        self
    }

    /// Check endpoints and limits; trims trailing slashes from endpoints.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.store_url = normalize_url("store_url", &self.store_url)?;
        self.registry_url = normalize_url("registry_url", &self.registry_url)?;
        if self.consistency.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "consistency.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.tagpub/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".tagpub").join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Defaults overlaid with `<home>/.tagpub/config.yaml` if it exists. No environment.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_file_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Config::default().validate();
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Config::default().validate();
    }
    let config: Config =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
    config.validate()
}

/// File layer plus process environment.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_file_at(home)?
        .apply_env(|key| std::env::var(key).ok())
        .validate()
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

fn normalize_url(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };
    let parsed = url::Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.query().is_some() {
        return Err(invalid("query strings are not allowed".to_string()));
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let home = TempDir::new().expect("tempdir");
        let config = load_file_at(home.path()).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(config_path_at(home.path()).ends_with(".tagpub/config.yaml"));
    }

    #[test]
    fn env_overrides_file_values() {
        let config = Config::default().apply_env(|key| match key {
            STORE_URL_ENV => Some("http://files.example:7070/".to_string()),
            _ => None,
        });
        let config = config.validate().expect("valid");
        assert_eq!(config.store_url, "http://files.example:7070");
        assert_eq!(config.registry_url, DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let config = Config::default().apply_env(|_| Some(String::new()));
        assert_eq!(config.store_url, DEFAULT_STORE_URL);
    }

    #[test]
    fn explicit_endpoints_win() {
        let config = Config::default()
            .with_endpoints(None, Some("https://tags.example".to_string()))
            .validate()
            .expect("valid");
        assert_eq!(config.registry_url, "https://tags.example");
        assert_eq!(config.store_url, DEFAULT_STORE_URL);
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = Config::default();
        config.consistency.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}

//! Console configuration
//!
//! Settings are resolved in three layers: the TOML file at
//! `<config_dir>/vigil/config.toml`, then `VIGIL_*` environment variables,
//! then command-line flags applied by the binary. Unknown keys in the file
//! are tolerated so older consoles keep working against newer configs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};

/// Per-dashboard refresh cadence, in seconds. Zero means manual-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RefreshIntervals {
    pub metrics_secs: u64,
    pub logs_secs: u64,
    pub recovery_secs: u64,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            metrics_secs: 30,
            logs_secs: 15,
            recovery_secs: 60,
        }
    }
}

/// Top-level console configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the portal API
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Default tracing filter when VIGIL_LOG is unset
    pub log_filter: String,
    /// Entries requested per logs fetch
    pub log_limit: usize,
    pub refresh: RefreshIntervals,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: 10,
            log_filter: "info".to_string(),
            log_limit: 200,
            refresh: RefreshIntervals::default(),
        }
    }
}

impl ConsoleConfig {
    /// Location of the config file, if a config directory exists
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vigil").join("config.toml"))
    }

    /// Load the config file (if any), then apply environment overrides.
    pub fn load() -> VigilResult<Self> {
        let mut config = match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(std::env::vars());
        config.validate()?;
        Ok(config)
    }

    /// Read one specific config file, without environment layering
    pub fn load_from(path: &Path) -> VigilResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> VigilResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_string(&self) -> VigilResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `VIGIL_*` overrides from an environment snapshot.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        if let Some(url) = vars.get("VIGIL_API_URL") {
            self.api_url = url.clone();
        }
        if let Some(secs) = vars.get("VIGIL_REFRESH_SECS").and_then(|v| v.parse().ok()) {
            self.refresh.metrics_secs = secs;
            self.refresh.logs_secs = secs;
            self.refresh.recovery_secs = secs;
        }
        if let Some(secs) = vars.get("VIGIL_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = secs;
        }
        if let Some(filter) = vars.get("VIGIL_LOG") {
            self.log_filter = filter.clone();
        }
    }

    pub fn validate(&self) -> VigilResult<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(VigilError::Config(format!(
                "api_url must start with http:// or https://: {}",
                self.api_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(VigilError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.metrics_secs)
    }

    pub fn logs_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.logs_secs)
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.recovery_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.refresh.metrics_secs, 30);
        assert_eq!(config.refresh.logs_secs, 15);
        assert_eq!(config.refresh.recovery_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            api_url = "https://portal.internal"

            [refresh]
            metrics_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://portal.internal");
        assert_eq!(config.refresh.metrics_secs, 5);
        assert_eq!(config.refresh.logs_secs, 15);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            api_url = "http://portal"
            some_future_option = true
            "#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConsoleConfig::default();
        config.apply_env(vec![
            ("VIGIL_API_URL".to_string(), "http://staging:9000".to_string()),
            ("VIGIL_REFRESH_SECS".to_string(), "5".to_string()),
            ("VIGIL_LOG".to_string(), "vigil=debug".to_string()),
        ]);
        assert_eq!(config.api_url, "http://staging:9000");
        assert_eq!(config.refresh.metrics_secs, 5);
        assert_eq!(config.refresh.logs_secs, 5);
        assert_eq!(config.refresh.recovery_secs, 5);
        assert_eq!(config.log_filter, "vigil=debug");
    }

    #[test]
    fn test_env_ignores_unparseable_numbers() {
        let mut config = ConsoleConfig::default();
        config.apply_env(vec![("VIGIL_REFRESH_SECS".to_string(), "soon".to_string())]);
        assert_eq!(config.refresh.metrics_secs, 30);
    }

    #[test]
    fn test_zero_interval_is_valid_manual_mode() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [refresh]
            metrics_secs = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.metrics_interval(), Duration::ZERO);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = ConsoleConfig::default();
        config.api_url = "portal.internal".to_string();
        assert!(matches!(
            config.validate(),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            api_url = "https://portal.internal"
            request_timeout_secs = 3
            "#,
        )
        .unwrap();

        let config = ConsoleConfig::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://portal.internal");
        assert_eq!(config.request_timeout_secs, 3);

        let missing = ConsoleConfig::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(VigilError::Io(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConsoleConfig::default();
        let raw = config.to_toml_string().unwrap();
        let parsed = ConsoleConfig::from_toml_str(&raw).unwrap();
        assert_eq!(parsed, config);
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Collection endpoint
pub const DEFAULT_ENDPOINT: &str = "https://q.stripe.com";

/// Static user-agent tag sent as `analytics_ua`
pub const DEFAULT_ANALYTICS_UA: &str = "analytics.paykit-rust-1.0";

/// HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variable name for the analytics enabled flag
pub const ENV_ANALYTICS_ENABLED: &str = "PAYKIT_ANALYTICS_ENABLED";

/// Analytics config file name
pub const CONFIG_FILE_NAME: &str = "analytics.toml";

/// Paykit data directory name
pub const PAYKIT_DIR_NAME: &str = ".paykit";

/// What happens to a payload when collection is disabled for a non-test reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledPolicy {
    /// Discard silently
    #[default]
    Drop,
    /// Discard, but record the payload in the debug log
    DebugLog,
}

/// Analytics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Whether collection is allowed at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Collection endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Value of the `analytics_ua` payload field
    #[serde(default = "default_analytics_ua")]
    pub analytics_ua: String,

    /// HTTP timeout in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Handling of payloads when collection is disabled outside tests
    #[serde(default)]
    pub disabled_policy: DisabledPolicy,
}

/// Returns whether analytics is enabled (checks PAYKIT_ANALYTICS_ENABLED env var).
pub fn default_enabled() -> bool {
    std::env::var(ENV_ANALYTICS_ENABLED)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0"))
        .unwrap_or(true)
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_analytics_ua() -> String {
    DEFAULT_ANALYTICS_UA.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            analytics_ua: default_analytics_ua(),
            request_timeout_secs: default_request_timeout(),
            disabled_policy: DisabledPolicy::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Load config from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save config as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `~/.paykit/analytics.toml`, the per-user file layered over built-in
    /// defaults
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(PAYKIT_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyticsConfig::default();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.analytics_ua, DEFAULT_ANALYTICS_UA);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.disabled_policy, DisabledPolicy::Drop);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AnalyticsConfig = toml::from_str(
            r#"
            endpoint = "https://collector.example.com/e"
            disabled_policy = "debug_log"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "https://collector.example.com/e");
        assert_eq!(config.disabled_policy, DisabledPolicy::DebugLog);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = AnalyticsConfig {
            enabled: false,
            request_timeout_secs: 3,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = AnalyticsConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "enabled = \"maybe\"").unwrap();

        let err = AnalyticsConfig::load_from(&path).unwrap_err();
        assert_eq!(err.code(), "config");
    }

    #[test]
    fn test_default_path_is_under_paykit_dir() {
        let path = AnalyticsConfig::default_path();
        assert!(path.ends_with(Path::new(PAYKIT_DIR_NAME).join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalyticsConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.code(), "io");
    }
}

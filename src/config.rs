//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat, FileSourceString, Map};
use paykit_analytics::{AnalyticsConfig, EnvironmentInfo};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub environment: EnvironmentInfo,
}

impl AppConfig {
    /// Environment facts from config, with build facts filling the gaps
    pub fn environment_info(&self) -> EnvironmentInfo {
        let detected = EnvironmentInfo::detect();
        let configured = self.environment.clone();
        EnvironmentInfo {
            sdk_version: configured.sdk_version.or(detected.sdk_version),
            os_version: configured.os_version.or(detected.os_version),
            device_type: configured.device_type.or(detected.device_type),
            ..configured
        }
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    load_config_with(Some(&AnalyticsConfig::default_path()), None)
}

/// Per-user analytics file (`~/.paykit/analytics.toml`) placed under the
/// `[analytics]` table. A missing file is skipped; an unreadable one is
/// skipped with a warning.
fn user_analytics_source(path: &Path) -> Option<File<FileSourceString, FileFormat>> {
    if !path.exists() {
        return None;
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| toml::from_str::<toml::Table>(&content).map_err(|e| e.to_string()))
        .and_then(|table| {
            let mut root = toml::Table::new();
            root.insert("analytics".to_string(), toml::Value::Table(table));
            toml::to_string(&root).map_err(|e| e.to_string())
        });

    match content {
        Ok(content) => Some(File::from_str(&content, FileFormat::Toml)),
        Err(e) => {
            warn!("Ignoring analytics config {}: {}", path.display(), e);
            None
        }
    }
}

/// `user_file` and `env` are injectable; `None` env reads the process environment.
fn load_config_with(
    user_file: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    // 2. Per-user analytics settings (optional)
    if let Some(source) = user_file.and_then(user_analytics_source) {
        builder = builder.add_source(source);
    }

    let config = builder
        // 3. External overrides (optional)
        .add_source(File::with_name("config/local").required(false))
        // 4. Environment variables (highest priority), e.g. PAYKIT_ANALYTICS__ENDPOINT.
        // Values stay strings so versions like "1.10" survive; typed fields
        // are converted on deserialize.
        .add_source(
            Environment::with_prefix("PAYKIT")
                .prefix_separator("_")
                .separator("__")
                .source(env),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

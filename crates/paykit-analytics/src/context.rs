//! Environment facts attached to every payload
//!
//! The client pulls these synchronously at payload-build time through the
//! [`AnalyticsContext`] trait. Host integrations implement the trait
//! directly; [`EnvironmentInfo`] is a plain value implementation.

use serde::{Deserialize, Serialize};

/// Replacement emitted instead of a secret or restricted key
pub const REDACTED_KEY: &str = "[REDACTED_LIVE_KEY]";

/// Key prefixes that must never leave the process
const SECRET_KEY_PREFIXES: &[&str] = &["sk_", "rk_"];

/// Source of environment facts for a payload
pub trait AnalyticsContext: Send + Sync {
    /// SDK version string
    fn sdk_version(&self) -> Option<String>;
    /// Operating system version
    fn os_version(&self) -> Option<String>;
    /// Device model or type
    fn device_type(&self) -> Option<String>;
    /// Host application name
    fn app_name(&self) -> Option<String>;
    /// Host application version
    fn app_version(&self) -> Option<String>;
    /// Wrapping plugin or runtime (e.g. "react-native")
    fn plugin_type(&self) -> Option<String>;
    /// Current network connection type (e.g. "wifi")
    fn network_type(&self) -> Option<String>;
    /// How the SDK was installed
    fn install_method(&self) -> Option<String>;
    /// Publishable key; secret and restricted keys are redacted by the builder
    fn publishable_key(&self) -> Option<String>;
}

/// Replace secret and restricted keys, drop empty ones
pub fn sanitize_publishable_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    if SECRET_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
        return Some(REDACTED_KEY.to_string());
    }
    Some(key.to_string())
}

/// Environment facts held as plain values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentInfo {
    /// SDK version
    pub sdk_version: Option<String>,
    /// OS version
    pub os_version: Option<String>,
    /// Device type
    pub device_type: Option<String>,
    /// Application name
    pub app_name: Option<String>,
    /// Application version
    pub app_version: Option<String>,
    /// Plugin or runtime wrapper
    pub plugin_type: Option<String>,
    /// Network connection type
    pub network_type: Option<String>,
    /// Install method
    pub install_method: Option<String>,
    /// Raw publishable key (sanitized when read)
    pub publishable_key: Option<String>,
}

impl EnvironmentInfo {
    /// Facts known from the build and the host: crate version, OS family and
    /// CPU architecture.
    pub fn detect() -> Self {
        Self {
            sdk_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            os_version: Some(std::env::consts::OS.to_string()),
            device_type: Some(std::env::consts::ARCH.to_string()),
            ..Default::default()
        }
    }

    /// Set the application name and version
    pub fn with_app(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self.app_version = Some(version.into());
        self
    }

    /// Set the plugin type
    pub fn with_plugin_type(mut self, plugin_type: impl Into<String>) -> Self {
        self.plugin_type = Some(plugin_type.into());
        self
    }

    /// Set the network type
    pub fn with_network_type(mut self, network_type: impl Into<String>) -> Self {
        self.network_type = Some(network_type.into());
        self
    }

    /// Set the install method
    pub fn with_install_method(mut self, install_method: impl Into<String>) -> Self {
        self.install_method = Some(install_method.into());
        self
    }

    /// Set the publishable key
    pub fn with_publishable_key(mut self, key: impl Into<String>) -> Self {
        self.publishable_key = Some(key.into());
        self
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl AnalyticsContext for EnvironmentInfo {
    fn sdk_version(&self) -> Option<String> {
        non_empty(&self.sdk_version)
    }

    fn os_version(&self) -> Option<String> {
        non_empty(&self.os_version)
    }

    fn device_type(&self) -> Option<String> {
        non_empty(&self.device_type)
    }

    fn app_name(&self) -> Option<String> {
        non_empty(&self.app_name)
    }

    fn app_version(&self) -> Option<String> {
        non_empty(&self.app_version)
    }

    fn plugin_type(&self) -> Option<String> {
        non_empty(&self.plugin_type)
    }

    fn network_type(&self) -> Option<String> {
        non_empty(&self.network_type)
    }

    fn install_method(&self) -> Option<String> {
        non_empty(&self.install_method)
    }

    fn publishable_key(&self) -> Option<String> {
        self.publishable_key
            .as_deref()
            .and_then(sanitize_publishable_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_publishable_keys() {
        assert_eq!(
            sanitize_publishable_key("pk_test_123").as_deref(),
            Some("pk_test_123")
        );
    }

    #[test]
    fn test_sanitize_redacts_secret_keys() {
        assert_eq!(
            sanitize_publishable_key("sk_live_abc").as_deref(),
            Some(REDACTED_KEY)
        );
        assert_eq!(
            sanitize_publishable_key("rk_live_abc").as_deref(),
            Some(REDACTED_KEY)
        );
    }

    #[test]
    fn test_sanitize_empty_is_unavailable() {
        assert_eq!(sanitize_publishable_key(""), None);
        assert_eq!(sanitize_publishable_key("   "), None);
    }

    #[test]
    fn test_detect_fills_build_facts() {
        let info = EnvironmentInfo::detect();
        assert_eq!(info.sdk_version().as_deref(), Some(env!("CARGO_PKG_VERSION")));
        assert!(info.os_version().is_some());
        assert!(info.app_name().is_none());
        assert!(info.publishable_key().is_none());
    }

    #[test]
    fn test_empty_values_are_unavailable() {
        let info = EnvironmentInfo {
            app_name: Some(String::new()),
            network_type: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(info.app_name().is_none());
        assert!(info.network_type().is_none());
    }

    #[test]
    fn test_deserializes_partial_toml() {
        let info: EnvironmentInfo = toml::from_str(
            r#"
            app_name = "Shop"
            publishable_key = "pk_test_1"
            "#,
        )
        .unwrap();
        assert_eq!(info.app_name().as_deref(), Some("Shop"));
        assert_eq!(info.publishable_key().as_deref(), Some("pk_test_1"));
        assert!(info.sdk_version().is_none());
    }
}

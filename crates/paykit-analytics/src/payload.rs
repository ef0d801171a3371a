//! Payload assembly
//!
//! A payload is built fresh for every logged analytic, in this order:
//! environment facts, `event`, `additional_info`, `product_usage`,
//! `error_dictionary` (error analytics only), then the analytic's own params.
//! Later steps overwrite earlier ones, so params always win.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::analytic::Analytic;
use crate::context::{sanitize_publishable_key, AnalyticsContext};
use crate::registry::UsageRegistry;

/// Reserved key: event wire name
pub const KEY_EVENT: &str = "event";
/// Reserved key: sorted session tags
pub const KEY_ADDITIONAL_INFO: &str = "additional_info";
/// Reserved key: sorted usage identifiers
pub const KEY_PRODUCT_USAGE: &str = "product_usage";
/// Reserved key: serialized error
pub const KEY_ERROR_DICTIONARY: &str = "error_dictionary";
/// Placeholder sent when no publishable key is available
pub const UNKNOWN_PUBLISHABLE_KEY: &str = "unknown";

/// Flat key/value mapping for one logged event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a string field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether a field is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    fn insert_optional(&mut self, key: &str, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.insert(key, value);
        }
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        Value::Object(payload.0.into_iter().collect())
    }
}

/// Builds payloads from analytics, registries and environment facts
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    analytics_ua: String,
}

impl PayloadBuilder {
    /// Create a builder that tags payloads with the given `analytics_ua`
    pub fn new(analytics_ua: impl Into<String>) -> Self {
        Self {
            analytics_ua: analytics_ua.into(),
        }
    }

    /// Environment fields shared by every payload. Empty facts are omitted
    /// and the publishable key is sanitized whatever the context returns.
    pub fn common_payload(&self, context: &dyn AnalyticsContext) -> Payload {
        let mut payload = Payload::default();

        payload.insert_optional("bindings_version", context.sdk_version());
        if !self.analytics_ua.is_empty() {
            payload.insert("analytics_ua", self.analytics_ua.as_str());
        }
        payload.insert_optional("os_version", context.os_version());
        payload.insert_optional("device_type", context.device_type());
        payload.insert_optional("app_name", context.app_name());
        payload.insert_optional("app_version", context.app_version());
        payload.insert_optional("plugin_type", context.plugin_type());
        payload.insert_optional("network_type", context.network_type());
        payload.insert_optional("install", context.install_method());
        payload.insert(
            "publishable_key",
            context
                .publishable_key()
                .as_deref()
                .and_then(sanitize_publishable_key)
                .unwrap_or_else(|| UNKNOWN_PUBLISHABLE_KEY.to_string()),
        );

        payload
    }

    /// Full payload for one analytic
    pub fn build(
        &self,
        analytic: &Analytic,
        registry: &UsageRegistry,
        context: &dyn AnalyticsContext,
    ) -> Payload {
        let mut payload = self.common_payload(context);

        payload.insert(KEY_EVENT, analytic.event().as_str());
        payload.insert(KEY_ADDITIONAL_INFO, registry.additional_info());
        payload.insert(KEY_PRODUCT_USAGE, registry.product_usage());

        if let Analytic::Error(error_analytic) = analytic {
            payload.insert(KEY_ERROR_DICTIONARY, error_analytic.error().to_value());
        }

        for (key, value) in analytic.params() {
            payload.0.insert(key.clone(), value.clone());
        }

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic::{ErrorAnalytic, EventAnalytic};
    use crate::context::EnvironmentInfo;
    use crate::error_details::ApiErrorDetails;
    use crate::event::AnalyticEvent;
    use crate::registry::UsageKey;
    use serde_json::json;

    fn fixed_context() -> EnvironmentInfo {
        EnvironmentInfo {
            sdk_version: Some("1.2.3".to_string()),
            os_version: Some("17.4".to_string()),
            device_type: Some("iPhone15,2".to_string()),
            app_name: Some("Shop".to_string()),
            app_version: Some("4.0".to_string()),
            plugin_type: None,
            network_type: Some("wifi".to_string()),
            install_method: Some("cargo".to_string()),
            publishable_key: Some("pk_test_abc".to_string()),
        }
    }

    fn builder() -> PayloadBuilder {
        PayloadBuilder::new("analytics.test-1.0")
    }

    #[test]
    fn test_common_payload_fields() {
        let payload = builder().common_payload(&fixed_context());

        assert_eq!(payload.get_str("bindings_version"), Some("1.2.3"));
        assert_eq!(payload.get_str("analytics_ua"), Some("analytics.test-1.0"));
        assert_eq!(payload.get_str("os_version"), Some("17.4"));
        assert_eq!(payload.get_str("device_type"), Some("iPhone15,2"));
        assert_eq!(payload.get_str("app_name"), Some("Shop"));
        assert_eq!(payload.get_str("app_version"), Some("4.0"));
        assert_eq!(payload.get_str("network_type"), Some("wifi"));
        assert_eq!(payload.get_str("install"), Some("cargo"));
        assert_eq!(payload.get_str("publishable_key"), Some("pk_test_abc"));
        assert!(!payload.contains_key("plugin_type"));
    }

    #[test]
    fn test_absent_facts_are_omitted_except_key() {
        let payload = builder().common_payload(&EnvironmentInfo::default());

        assert!(!payload.contains_key("os_version"));
        assert!(!payload.contains_key("app_name"));
        assert!(!payload.contains_key("bindings_version"));
        assert_eq!(
            payload.get_str("publishable_key"),
            Some(UNKNOWN_PUBLISHABLE_KEY)
        );
    }

    /// Host context that hands back raw values without filtering
    struct HostContext {
        value: &'static str,
        key: Option<&'static str>,
    }

    impl AnalyticsContext for HostContext {
        fn sdk_version(&self) -> Option<String> {
            Some("1.2.3".to_string())
        }
        fn os_version(&self) -> Option<String> {
            Some(self.value.to_string())
        }
        fn device_type(&self) -> Option<String> {
            Some(self.value.to_string())
        }
        fn app_name(&self) -> Option<String> {
            Some(self.value.to_string())
        }
        fn app_version(&self) -> Option<String> {
            Some(self.value.to_string())
        }
        fn plugin_type(&self) -> Option<String> {
            None
        }
        fn network_type(&self) -> Option<String> {
            Some(self.value.to_string())
        }
        fn install_method(&self) -> Option<String> {
            Some(self.value.to_string())
        }
        fn publishable_key(&self) -> Option<String> {
            self.key.map(str::to_string)
        }
    }

    #[test]
    fn test_empty_facts_from_any_context_are_omitted() {
        for value in ["", "   "] {
            let payload = builder().common_payload(&HostContext {
                value,
                key: Some(""),
            });

            for key in [
                "os_version",
                "device_type",
                "app_name",
                "app_version",
                "network_type",
                "install",
            ] {
                assert!(!payload.contains_key(key), "{key} should be omitted");
            }
            assert_eq!(payload.get_str("bindings_version"), Some("1.2.3"));
            assert_eq!(
                payload.get_str("publishable_key"),
                Some(UNKNOWN_PUBLISHABLE_KEY)
            );
        }
    }

    #[test]
    fn test_secret_key_from_any_context_is_redacted() {
        for key in ["sk_live_123", "rk_live_456"] {
            let payload = builder().common_payload(&HostContext {
                value: "x",
                key: Some(key),
            });
            assert_eq!(
                payload.get_str("publishable_key"),
                Some(crate::context::REDACTED_KEY)
            );
        }

        let payload = builder().common_payload(&HostContext {
            value: "x",
            key: Some("pk_live_789"),
        });
        assert_eq!(payload.get_str("publishable_key"), Some("pk_live_789"));
    }

    #[test]
    fn test_build_merges_registries_and_params() {
        let registry = UsageRegistry::new();
        registry.register_usage(UsageKey::PaymentSheet);
        registry.register_usage(UsageKey::ApiClient);
        registry.add_additional_info("link_enabled");

        let analytic: Analytic = EventAnalytic::new(AnalyticEvent::PaymentSheetInit)
            .param("a", "1")
            .unwrap()
            .into();
        let payload = builder().build(&analytic, &registry, &fixed_context());

        assert_eq!(payload.get_str(KEY_EVENT), Some("mc_init"));
        assert_eq!(
            payload.get(KEY_PRODUCT_USAGE).unwrap(),
            &json!(["PKApiClient", "PKPaymentSheet"])
        );
        assert_eq!(
            payload.get(KEY_ADDITIONAL_INFO).unwrap(),
            &json!(["link_enabled"])
        );
        assert_eq!(payload.get_str("a"), Some("1"));
        assert!(!payload.contains_key(KEY_ERROR_DICTIONARY));
    }

    #[test]
    fn test_params_win_over_reserved_keys() {
        let registry = UsageRegistry::new();
        let analytic: Analytic = EventAnalytic::new(AnalyticEvent::PaymentSheetInit)
            .param("event", "override")
            .unwrap()
            .param("publishable_key", "pk_param")
            .unwrap()
            .into();

        let payload = builder().build(&analytic, &registry, &fixed_context());

        assert_eq!(payload.get_str(KEY_EVENT), Some("override"));
        assert_eq!(payload.get_str("publishable_key"), Some("pk_param"));
    }

    #[test]
    fn test_error_analytic_sets_error_dictionary() {
        let registry = UsageRegistry::new();
        let error = ApiErrorDetails::new("card_error").with_code("card_declined");
        let first: Analytic =
            ErrorAnalytic::new(AnalyticEvent::PaymentSheetPaymentFailure, &error).into();
        let second: Analytic =
            ErrorAnalytic::new(AnalyticEvent::PaymentSheetPaymentFailure, &error.clone()).into();

        let a = builder().build(&first, &registry, &fixed_context());
        let b = builder().build(&second, &registry, &fixed_context());

        let dictionary = a.get(KEY_ERROR_DICTIONARY).unwrap();
        assert!(dictionary.as_object().is_some_and(|o| !o.is_empty()));
        assert_eq!(dictionary["code"], "card_declined");
        assert_eq!(a.get(KEY_ERROR_DICTIONARY), b.get(KEY_ERROR_DICTIONARY));
    }

    #[test]
    fn test_payload_serializes_flat() {
        let registry = UsageRegistry::new();
        let analytic: Analytic = AnalyticEvent::CardScanStart.into();
        let payload = builder().build(&analytic, &registry, &EnvironmentInfo::default());

        let value: Value = payload.clone().into();
        assert_eq!(value["event"], "paykit.card_scan.start");
        assert_eq!(serde_json::to_value(&payload).unwrap(), value);
    }
}

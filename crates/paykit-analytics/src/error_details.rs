//! Error serialization for error analytics
//!
//! An error attached to an analytic is flattened into an [`ErrorDetails`]
//! mapping and stored under the payload's `error_dictionary` key. The
//! mapping always carries a `domain` entry, is ordered (so equal errors yield
//! equal dictionaries) and never includes backtraces.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Domain used for errors with no more specific origin
pub const GENERIC_ERROR_DOMAIN: &str = "paykit.generic";

/// Domain used for errors returned by the payments API
pub const API_ERROR_DOMAIN: &str = "paykit.api";

/// Domain used for errors raised by this crate
pub const ANALYTICS_ERROR_DOMAIN: &str = "paykit.analytics";

/// Serialized, loggable form of an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorDetails(BTreeMap<String, Value>);

impl ErrorDetails {
    /// Create details for the given error domain
    pub fn new(domain: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("domain".to_string(), Value::String(domain.into()));
        Self(fields)
    }

    /// Add a diagnostic field. `domain` cannot be replaced.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "domain" {
            self.0.insert(key, value.into());
        }
        self
    }

    /// Add a field only when a value is present
    pub fn with_optional_field(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.with_field(key, value),
            None => self,
        }
    }

    /// Serialize any standard error: its short type name and its message.
    ///
    /// Only the top-level error is described; the `source()` chain is
    /// summarized as a depth count so details stay small.
    pub fn from_std_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let full_name = std::any::type_name::<E>();
        let short_name = full_name
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(full_name);

        let mut depth = 0u64;
        let mut source = error.source();
        while let Some(inner) = source {
            depth += 1;
            source = inner.source();
        }

        Self::new(GENERIC_ERROR_DOMAIN)
            .with_field("type", short_name)
            .with_field("message", error.to_string())
            .with_field("source_depth", depth)
    }

    /// Error domain
    pub fn domain(&self) -> &str {
        self.0
            .get("domain")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_ERROR_DOMAIN)
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of fields (always at least one)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: every details mapping has a domain
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into a JSON object value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

/// Errors that know how to describe themselves for analytics
pub trait LoggableError {
    /// Flatten the error into loggable diagnostic fields
    fn serialize_for_logging(&self) -> ErrorDetails;
}

impl LoggableError for ErrorDetails {
    fn serialize_for_logging(&self) -> ErrorDetails {
        self.clone()
    }
}

impl LoggableError for crate::Error {
    fn serialize_for_logging(&self) -> ErrorDetails {
        ErrorDetails::new(ANALYTICS_ERROR_DOMAIN).with_field("code", self.code())
    }
}

/// Error fields returned by the payments API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error_type}: {}", .code.as_deref().unwrap_or("unknown"))]
pub struct ApiErrorDetails {
    /// API error type (e.g. "card_error", "invalid_request_error")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Short error code (e.g. "card_declined")
    #[serde(default)]
    pub code: Option<String>,
    /// Issuer decline code for card errors
    #[serde(default)]
    pub decline_code: Option<String>,
    /// Request parameter the error relates to
    #[serde(default)]
    pub param: Option<String>,
    /// HTTP status of the failed request
    #[serde(default)]
    pub status: Option<u16>,
}

impl ApiErrorDetails {
    /// Create API error details with just a type
    pub fn new(error_type: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            code: None,
            decline_code: None,
            param: None,
            status: None,
        }
    }

    /// Set the error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the decline code
    pub fn with_decline_code(mut self, decline_code: impl Into<String>) -> Self {
        self.decline_code = Some(decline_code.into());
        self
    }

    /// Set the related request param
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Set the HTTP status
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl LoggableError for ApiErrorDetails {
    fn serialize_for_logging(&self) -> ErrorDetails {
        ErrorDetails::new(API_ERROR_DOMAIN)
            .with_field("type", self.error_type.as_str())
            .with_optional_field("code", self.code.as_deref())
            .with_optional_field("decline_code", self.decline_code.as_deref())
            .with_optional_field("param", self.param.as_deref())
            .with_optional_field("status", self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_new_always_has_domain() {
        let details = ErrorDetails::new("custom");
        assert_eq!(details.domain(), "custom");
        assert!(!details.is_empty());
    }

    #[test]
    fn test_domain_cannot_be_overwritten() {
        let details = ErrorDetails::new("custom").with_field("domain", "other");
        assert_eq!(details.domain(), "custom");
    }

    #[test]
    fn test_api_error_serialization() {
        let details = ApiErrorDetails::new("card_error")
            .with_code("card_declined")
            .with_decline_code("insufficient_funds")
            .with_status(402)
            .serialize_for_logging();

        assert_eq!(details.domain(), API_ERROR_DOMAIN);
        assert_eq!(details.get("type").unwrap(), "card_error");
        assert_eq!(details.get("code").unwrap(), "card_declined");
        assert_eq!(details.get("decline_code").unwrap(), "insufficient_funds");
        assert_eq!(details.get("status").unwrap(), 402);
        assert!(details.get("param").is_none());
    }

    #[test]
    fn test_equal_errors_serialize_equally() {
        let a = ApiErrorDetails::new("api_error").with_param("amount");
        let b = ApiErrorDetails::new("api_error").with_param("amount");
        assert_eq!(a.serialize_for_logging(), b.serialize_for_logging());
        assert_eq!(
            a.serialize_for_logging().to_value(),
            b.serialize_for_logging().to_value()
        );
    }

    #[test]
    fn test_from_std_error_counts_sources() {
        let error = Outer {
            inner: std::io::Error::other("disk gone"),
        };
        let details = ErrorDetails::from_std_error(&error);

        assert_eq!(details.domain(), GENERIC_ERROR_DOMAIN);
        assert_eq!(details.get("type").unwrap(), "Outer");
        assert_eq!(details.get("message").unwrap(), "outer failure");
        assert_eq!(details.get("source_depth").unwrap(), 1);
    }

    #[test]
    fn test_crate_error_uses_code() {
        let error = crate::Error::Config("bad".to_string());
        let details = error.serialize_for_logging();
        assert_eq!(details.domain(), ANALYTICS_ERROR_DOMAIN);
        assert_eq!(details.get("code").unwrap(), "config");
    }
}

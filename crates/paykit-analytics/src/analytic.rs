//! Loggable analytics
//!
//! An [`Analytic`] is either a plain event or an event carrying an error.
//! Param values are converted to JSON when they are attached, so a value
//! that cannot be serialized is rejected there and never reaches `log`.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::error_details::{ErrorDetails, LoggableError};
use crate::event::AnalyticEvent;

/// Event-specific params
pub type Params = BTreeMap<String, Value>;

/// Tokenization param keys, in lookup order. These are mutually exclusive
/// in practice so the first match wins.
const TOKEN_TYPE_KEYS: &[&str] = &["account", "bank_account", "card", "pii", "cvc_update"];

/// A plain analytics event
#[derive(Debug, Clone, PartialEq)]
pub struct EventAnalytic {
    event: AnalyticEvent,
    params: Params,
}

impl EventAnalytic {
    /// Create an event with no params
    pub fn new(event: AnalyticEvent) -> Self {
        Self {
            event,
            params: Params::new(),
        }
    }

    /// Attach a param, converting the value to JSON
    pub fn param(mut self, key: impl Into<String>, value: impl Serialize) -> Result<Self> {
        insert_param(&mut self.params, key.into(), value)?;
        Ok(self)
    }

    /// Attach several already-converted params
    pub fn params(mut self, params: Params) -> Result<Self> {
        for (key, value) in params {
            insert_param(&mut self.params, key, value)?;
        }
        Ok(self)
    }

    /// Attach an error, turning this into an error analytic
    pub fn with_error(self, error: &dyn LoggableError) -> ErrorAnalytic {
        ErrorAnalytic {
            event: self.event,
            error: error.serialize_for_logging(),
            params: self.params,
        }
    }
}

/// An analytics event carrying a serialized error
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAnalytic {
    event: AnalyticEvent,
    error: ErrorDetails,
    params: Params,
}

impl ErrorAnalytic {
    /// Create an error analytic from any loggable error
    pub fn new(event: AnalyticEvent, error: &dyn LoggableError) -> Self {
        EventAnalytic::new(event).with_error(error)
    }

    /// Attach a param, converting the value to JSON
    pub fn param(mut self, key: impl Into<String>, value: impl Serialize) -> Result<Self> {
        insert_param(&mut self.params, key.into(), value)?;
        Ok(self)
    }

    /// Serialized error
    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}

/// Anything that can be logged
#[derive(Debug, Clone, PartialEq)]
pub enum Analytic {
    /// Plain event
    Event(EventAnalytic),
    /// Event with an attached error
    Error(ErrorAnalytic),
}

impl Analytic {
    /// Event kind
    pub fn event(&self) -> AnalyticEvent {
        match self {
            Analytic::Event(a) => a.event,
            Analytic::Error(a) => a.event,
        }
    }

    /// Event-specific params
    pub fn params(&self) -> &Params {
        match self {
            Analytic::Event(a) => &a.params,
            Analytic::Error(a) => &a.params,
        }
    }

    /// Serialized error, for error analytics
    pub fn error_details(&self) -> Option<&ErrorDetails> {
        match self {
            Analytic::Event(_) => None,
            Analytic::Error(a) => Some(&a.error),
        }
    }
}

impl From<EventAnalytic> for Analytic {
    fn from(analytic: EventAnalytic) -> Self {
        Analytic::Event(analytic)
    }
}

impl From<ErrorAnalytic> for Analytic {
    fn from(analytic: ErrorAnalytic) -> Self {
        Analytic::Error(analytic)
    }
}

impl From<AnalyticEvent> for Analytic {
    fn from(event: AnalyticEvent) -> Self {
        Analytic::Event(EventAnalytic::new(event))
    }
}

fn insert_param(params: &mut Params, key: String, value: impl Serialize) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidParam {
            key,
            message: "param keys must not be empty".to_string(),
        });
    }
    let value = serde_json::to_value(value)?;
    params.insert(key, value);
    Ok(())
}

/// Classify tokenization params by the kind of token they create.
///
/// Apple Pay payloads carry a `pk_token` and are reported as `apple_pay`;
/// otherwise the first present key among account, bank account, card, PII
/// and CVC update wins.
pub fn token_type_from_params(params: &Params) -> Option<&'static str> {
    if params.contains_key("pk_token") {
        return Some("apple_pay");
    }
    TOKEN_TYPE_KEYS
        .iter()
        .copied()
        .find(|key| params.contains_key(*key))
}

//! Paykit Analytics - SDK Usage and Error Telemetry
//!
//! This crate provides the analytics client used by the Paykit payments SDK.
//!
//! ## What It Does
//!
//! - Records which SDK feature modules participated in the session (product usage)
//! - Records free-form session tags (additional info)
//! - Builds one flat key/value payload per logged event
//! - Fires the payload at the collection endpoint as a GET query (fire-and-forget)
//!
//! Under a test harness payloads are captured in memory instead of being sent.
//!
//! ## Configuration
//!
//! ```toml
//! enabled = true                          # PAYKIT_ANALYTICS_ENABLED=false opts out
//! endpoint = "https://q.stripe.com"
//! analytics_ua = "analytics.paykit-rust-1.0"
//! request_timeout_secs = 10
//! disabled_policy = "drop"                # or "debug_log"
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use paykit_analytics::{
//!     AnalyticEvent, AnalyticsClient, AnalyticsConfig, EnvironmentInfo, EventAnalytic, UsageKey,
//! };
//!
//! let client = AnalyticsClient::new(AnalyticsConfig::default())?;
//! client.register_usage(UsageKey::PaymentSheet);
//!
//! let context = EnvironmentInfo::detect().with_publishable_key("pk_test_123");
//! let analytic = EventAnalytic::new(AnalyticEvent::PaymentSheetInit)
//!     .param("mode", "payment")?;
//! client.log(&analytic.into(), &context);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analytic;
pub mod client;
pub mod config;
pub mod context;
pub mod detector;
pub mod error;
pub mod error_details;
pub mod event;
pub mod payload;
pub mod query;
pub mod registry;
pub mod transport;

pub use analytic::{token_type_from_params, Analytic, ErrorAnalytic, EventAnalytic, Params};
pub use client::{AnalyticsClient, AnalyticsLogger};
pub use config::{AnalyticsConfig, DisabledPolicy};
pub use context::{sanitize_publishable_key, AnalyticsContext, EnvironmentInfo};
pub use detector::{CollectionMode, EnvDetector, EnvLookup, FixedDetector, RuntimeDetector};
pub use error::{Error, Result};
pub use error_details::{ApiErrorDetails, ErrorDetails, LoggableError};
pub use event::AnalyticEvent;
pub use payload::{Payload, PayloadBuilder};
pub use registry::{ProductUsage, UsageKey, UsageRegistry};
pub use transport::{HttpTransport, Transport};

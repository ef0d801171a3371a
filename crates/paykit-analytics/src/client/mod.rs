//! Analytics client
//!
//! The client owns the usage registries and decides, per `log` call, whether
//! a payload is sent, captured for tests, or dropped. It is built once by the
//! application and shared as `Arc<AnalyticsClient>`; there is no global
//! instance.

use reqwest::Url;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::analytic::Analytic;
use crate::config::{AnalyticsConfig, DisabledPolicy, ENV_ANALYTICS_ENABLED};
use crate::context::AnalyticsContext;
use crate::detector::{CollectionMode, EnvDetector, RuntimeDetector};
use crate::error::{Error, Result};
use crate::payload::{Payload, PayloadBuilder};
use crate::query;
use crate::registry::{ProductUsage, UsageKey, UsageRegistry};
use crate::transport::{HttpTransport, Transport};

/// What feature modules depend on to report usage and events
pub trait AnalyticsLogger: Send + Sync {
    /// Record a feature module as used in this session
    fn register_usage(&self, key: UsageKey);

    /// Log an analytic. Never fails and never blocks on the network.
    fn log(&self, analytic: &Analytic, context: &dyn AnalyticsContext);
}

/// Analytics client
pub struct AnalyticsClient {
    config: AnalyticsConfig,
    endpoint: Url,
    builder: PayloadBuilder,
    registry: UsageRegistry,
    detector: Box<dyn RuntimeDetector>,
    transport: Box<dyn Transport>,
    test_log_history: Mutex<Vec<Payload>>,
}

impl AnalyticsClient {
    /// Create a client that detects its mode from the environment and sends
    /// over HTTP
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Self::with_parts(config, Box::new(EnvDetector::new()), Box::new(transport))
    }

    /// Create a client with an explicit detector and transport
    pub fn with_parts(
        config: AnalyticsConfig,
        detector: Box<dyn RuntimeDetector>,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| Error::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            message: e.to_string(),
        })?;

        if config.enabled {
            info!(
                endpoint = %endpoint,
                "Analytics enabled (opt-out via {}=false)",
                ENV_ANALYTICS_ENABLED
            );
        } else {
            info!("Analytics disabled");
        }

        Ok(Self {
            builder: PayloadBuilder::new(config.analytics_ua.clone()),
            config,
            endpoint,
            registry: UsageRegistry::new(),
            detector,
            transport,
            test_log_history: Mutex::new(Vec::new()),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Parsed collection endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // Registries

    /// Record a feature module as used
    pub fn register_usage(&self, key: UsageKey) {
        self.registry.register_usage(key);
    }

    /// Record the feature module a type belongs to
    pub fn register_usage_of<T: ProductUsage>(&self) {
        self.registry.register_usage(T::USAGE_KEY);
    }

    /// Add a session tag
    pub fn add_additional_info(&self, tag: impl Into<String>) {
        self.registry.add_additional_info(tag);
    }

    /// Remove every session tag
    pub fn clear_additional_info(&self) {
        self.registry.clear_additional_info();
    }

    /// Sorted session tags
    pub fn additional_info(&self) -> Vec<String> {
        self.registry.additional_info()
    }

    /// Sorted usage identifiers
    pub fn product_usage(&self) -> Vec<String> {
        self.registry.product_usage()
    }

    // Dispatch

    /// Payload that `log` would produce for this analytic right now
    pub fn payload(&self, analytic: &Analytic, context: &dyn AnalyticsContext) -> Payload {
        self.builder.build(analytic, &self.registry, context)
    }

    /// Collection mode for the next `log` call. Test-harness detection wins
    /// over the configuration opt-out.
    pub fn collection_mode(&self) -> CollectionMode {
        match self.detector.collection_mode() {
            CollectionMode::Enabled if !self.config.enabled => CollectionMode::OptedOut,
            mode => mode,
        }
    }

    /// Build the payload for an analytic and dispatch it
    pub fn log(&self, analytic: &Analytic, context: &dyn AnalyticsContext) {
        let payload = self.payload(analytic, context);
        trace!(event = %analytic.event(), payload = ?payload, "LOG ANALYTICS");

        match self.collection_mode() {
            CollectionMode::Enabled => {
                let url = query::url_with_payload(&self.endpoint, &payload);
                self.transport.send(url);
            }
            CollectionMode::TestHarness => {
                self.history().push(payload);
            }
            mode @ (CollectionMode::Virtualized | CollectionMode::OptedOut) => {
                if self.config.disabled_policy == DisabledPolicy::DebugLog {
                    debug!(
                        ?mode,
                        event = %analytic.event(),
                        payload = ?payload,
                        "Analytics: collection disabled, payload dropped"
                    );
                }
            }
        }
    }

    /// Payloads captured under a test harness, in call order
    pub fn test_log_history(&self) -> Vec<Payload> {
        self.history().clone()
    }

    fn history(&self) -> MutexGuard<'_, Vec<Payload>> {
        self.test_log_history.lock().unwrap_or_else(|poisoned| {
            warn!("Analytics test log lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

impl AnalyticsLogger for AnalyticsClient {
    fn register_usage(&self, key: UsageKey) {
        AnalyticsClient::register_usage(self, key);
    }

    fn log(&self, analytic: &Analytic, context: &dyn AnalyticsContext) {
        AnalyticsClient::log(self, analytic, context);
    }
}

//! Collection mode detection
//!
//! The dispatcher asks a [`RuntimeDetector`] on every `log` call whether it
//! may send. Detection is never cached: a test run can flip between
//! contexts.

/// Marks the process as running under an automated test harness
pub const ENV_TEST_HARNESS: &str = "PAYKIT_ANALYTICS_TEST_HARNESS";

/// Marks the process as running in an emulator or virtualized device
pub const ENV_VIRTUALIZED: &str = "PAYKIT_ANALYTICS_VIRTUALIZED";

/// Whether payloads may leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    /// Send payloads to the collection endpoint
    Enabled,
    /// Capture payloads in the test log history; send nothing
    TestHarness,
    /// Emulated or virtualized environment; send nothing, keep nothing
    Virtualized,
    /// Turned off by configuration; send nothing, keep nothing
    OptedOut,
}

impl CollectionMode {
    /// True only for [`CollectionMode::Enabled`]
    pub fn should_collect(&self) -> bool {
        matches!(self, CollectionMode::Enabled)
    }
}

/// Decides the collection mode for a single `log` call
pub trait RuntimeDetector: Send + Sync {
    /// Current mode. Must be side-effect free.
    fn collection_mode(&self) -> CollectionMode;
}

/// Looks up one environment variable
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Detector driven by environment variables, read on every call.
///
/// The test-harness flag takes precedence over the virtualized flag.
pub struct EnvDetector {
    lookup: EnvLookup,
}

impl EnvDetector {
    /// Detector reading the process environment
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Detector reading variables through `lookup`
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn flag_set(&self, name: &str) -> bool {
        (self.lookup)(name)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}

impl Default for EnvDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnvDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvDetector").finish_non_exhaustive()
    }
}

impl RuntimeDetector for EnvDetector {
    fn collection_mode(&self) -> CollectionMode {
        if self.flag_set(ENV_TEST_HARNESS) {
            CollectionMode::TestHarness
        } else if self.flag_set(ENV_VIRTUALIZED) {
            CollectionMode::Virtualized
        } else {
            CollectionMode::Enabled
        }
    }
}

/// Detector that always reports the same mode
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub CollectionMode);

impl RuntimeDetector for FixedDetector {
    fn collection_mode(&self) -> CollectionMode {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fixed_detector() {
        assert_eq!(
            FixedDetector(CollectionMode::Virtualized).collection_mode(),
            CollectionMode::Virtualized
        );
    }

    #[test]
    fn test_only_enabled_collects() {
        assert!(CollectionMode::Enabled.should_collect());
        assert!(!CollectionMode::TestHarness.should_collect());
        assert!(!CollectionMode::Virtualized.should_collect());
        assert!(!CollectionMode::OptedOut.should_collect());
    }

    #[test]
    fn test_env_detector_reads_flags_each_call() {
        let vars: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let detector = EnvDetector::with_lookup({
            let vars = Arc::clone(&vars);
            move |name| vars.lock().unwrap().get(name).cloned()
        });
        let set = |name: &str, value: &str| {
            vars.lock().unwrap().insert(name.to_string(), value.to_string());
        };

        assert_eq!(detector.collection_mode(), CollectionMode::Enabled);

        set(ENV_VIRTUALIZED, "1");
        assert_eq!(detector.collection_mode(), CollectionMode::Virtualized);

        set(ENV_TEST_HARNESS, "TRUE");
        assert_eq!(detector.collection_mode(), CollectionMode::TestHarness);

        set(ENV_TEST_HARNESS, "no");
        set(ENV_VIRTUALIZED, "0");
        assert_eq!(detector.collection_mode(), CollectionMode::Enabled);

        vars.lock().unwrap().clear();
        assert_eq!(detector.collection_mode(), CollectionMode::Enabled);
    }
}

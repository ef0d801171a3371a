//! Product usage and additional info registries
//!
//! Both sets live behind one mutex. Snapshots are taken under the lock, and
//! `BTreeSet` keeps them lexicographically sorted regardless of insertion
//! order.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::error::{Error, Result};

/// Identifier a feature module registers when it participates in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UsageKey {
    /// Low-level API client
    ApiClient,
    /// Card form
    CardForm,
    /// Card scanner
    CardScanner,
    /// Customer sheet
    CustomerSheet,
    /// Embedded payment element
    EmbeddedPaymentElement,
    /// Financial connections flow
    FinancialConnections,
    /// Identity verification sheet
    IdentityVerification,
    /// Link authentication
    LinkAuthentication,
    /// Payment sheet
    PaymentSheet,
    /// Payment sheet with a custom flow controller
    PaymentSheetFlowController,
}

impl UsageKey {
    /// Every known key
    pub const ALL: &'static [UsageKey] = &[
        UsageKey::ApiClient,
        UsageKey::CardForm,
        UsageKey::CardScanner,
        UsageKey::CustomerSheet,
        UsageKey::EmbeddedPaymentElement,
        UsageKey::FinancialConnections,
        UsageKey::IdentityVerification,
        UsageKey::LinkAuthentication,
        UsageKey::PaymentSheet,
        UsageKey::PaymentSheetFlowController,
    ];

    /// Identifier recorded in `product_usage`
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKey::ApiClient => "PKApiClient",
            UsageKey::CardForm => "PKCardForm",
            UsageKey::CardScanner => "PKCardScanner",
            UsageKey::CustomerSheet => "PKCustomerSheet",
            UsageKey::EmbeddedPaymentElement => "PKEmbeddedPaymentElement",
            UsageKey::FinancialConnections => "PKFinancialConnections",
            UsageKey::IdentityVerification => "PKIdentityVerificationSheet",
            UsageKey::LinkAuthentication => "PKLinkAuthentication",
            UsageKey::PaymentSheet => "PKPaymentSheet",
            UsageKey::PaymentSheetFlowController => "PKPaymentSheet.FlowController",
        }
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UsageKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::InvalidParam {
                key: "usage".to_string(),
                message: format!("unknown usage key '{}'", s),
            })
    }
}

/// Implemented by feature types that report themselves in `product_usage`
pub trait ProductUsage {
    /// Key registered for this type
    const USAGE_KEY: UsageKey;
}

#[derive(Debug, Default)]
struct Sets {
    product_usage: BTreeSet<String>,
    additional_info: BTreeSet<String>,
}

/// Thread-safe product usage and additional info sets
#[derive(Debug, Default)]
pub struct UsageRegistry {
    sets: Mutex<Sets>,
}

impl UsageRegistry {
    /// Create empty registries
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Sets> {
        self.sets.lock().unwrap_or_else(|poisoned| {
            warn!("Analytics registry lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Record a feature module as used. Idempotent.
    pub fn register_usage(&self, key: UsageKey) {
        self.register_usage_identifier(key.as_str());
    }

    /// Record a raw usage identifier. Idempotent.
    pub fn register_usage_identifier(&self, identifier: &str) {
        let mut sets = self.lock();
        if !sets.product_usage.contains(identifier) {
            sets.product_usage.insert(identifier.to_string());
        }
    }

    /// Add a session tag. Idempotent.
    pub fn add_additional_info(&self, tag: impl Into<String>) {
        let tag = tag.into();
        self.lock().additional_info.insert(tag);
    }

    /// Remove every session tag
    pub fn clear_additional_info(&self) {
        self.lock().additional_info.clear();
    }

    /// Sorted session tags
    pub fn additional_info(&self) -> Vec<String> {
        self.lock().additional_info.iter().cloned().collect()
    }

    /// Sorted usage identifiers
    pub fn product_usage(&self) -> Vec<String> {
        self.lock().product_usage.iter().cloned().collect()
    }
}

//! Event catalog
//!
//! Every loggable event has a fixed wire name. New events are added here so
//! that the collection backend sees a closed, reviewable set of names.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Analytics event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalyticEvent {
    // API client
    /// Token creation request sent
    TokenCreation,
    /// Payment method creation request sent
    PaymentMethodCreation,
    /// Payment intent confirmation request sent
    PaymentIntentConfirmation,
    /// Setup intent confirmation request sent
    SetupIntentConfirmation,

    // Payment sheet
    /// Payment sheet initialized
    PaymentSheetInit,
    /// Payment sheet presented
    PaymentSheetShow,
    /// Payment completed successfully from the sheet
    PaymentSheetPaymentSuccess,
    /// Payment from the sheet failed
    PaymentSheetPaymentFailure,
    /// Sheet dismissed by the customer
    PaymentSheetDismiss,
    /// Payment sheet failed to load
    PaymentSheetLoadFailed,

    // Customer sheet
    /// Customer sheet initialized
    CustomerSheetInit,
    /// Saved payment method removed from the customer sheet
    CustomerSheetRemovePaymentMethod,

    // Card scanning
    /// Card scan started
    CardScanStart,
    /// Card scan finished with a result
    CardScanSuccess,
    /// Card scan cancelled
    CardScanCancel,

    // Identity
    /// Identity verification sheet presented
    IdentitySheetPresented,
    /// Identity verification sheet closed
    IdentitySheetClosed,
    /// Identity verification failed
    IdentitySheetFailed,

    // Link
    /// Link account lookup completed
    LinkAccountLookupComplete,
    /// Link signup completed
    LinkSignupComplete,
}

impl AnalyticEvent {
    /// Every known event, in declaration order
    pub const ALL: &'static [AnalyticEvent] = &[
        AnalyticEvent::TokenCreation,
        AnalyticEvent::PaymentMethodCreation,
        AnalyticEvent::PaymentIntentConfirmation,
        AnalyticEvent::SetupIntentConfirmation,
        AnalyticEvent::PaymentSheetInit,
        AnalyticEvent::PaymentSheetShow,
        AnalyticEvent::PaymentSheetPaymentSuccess,
        AnalyticEvent::PaymentSheetPaymentFailure,
        AnalyticEvent::PaymentSheetDismiss,
        AnalyticEvent::PaymentSheetLoadFailed,
        AnalyticEvent::CustomerSheetInit,
        AnalyticEvent::CustomerSheetRemovePaymentMethod,
        AnalyticEvent::CardScanStart,
        AnalyticEvent::CardScanSuccess,
        AnalyticEvent::CardScanCancel,
        AnalyticEvent::IdentitySheetPresented,
        AnalyticEvent::IdentitySheetClosed,
        AnalyticEvent::IdentitySheetFailed,
        AnalyticEvent::LinkAccountLookupComplete,
        AnalyticEvent::LinkSignupComplete,
    ];

    /// Wire name sent as the `event` field
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticEvent::TokenCreation => "paykit.token_creation",
            AnalyticEvent::PaymentMethodCreation => "paykit.payment_method_creation",
            AnalyticEvent::PaymentIntentConfirmation => "paykit.payment_intent_confirmation",
            AnalyticEvent::SetupIntentConfirmation => "paykit.setup_intent_confirmation",
            AnalyticEvent::PaymentSheetInit => "mc_init",
            AnalyticEvent::PaymentSheetShow => "mc_sheet_show",
            AnalyticEvent::PaymentSheetPaymentSuccess => "mc_payment_success",
            AnalyticEvent::PaymentSheetPaymentFailure => "mc_payment_failure",
            AnalyticEvent::PaymentSheetDismiss => "mc_dismiss",
            AnalyticEvent::PaymentSheetLoadFailed => "mc_load_failed",
            AnalyticEvent::CustomerSheetInit => "cs_init",
            AnalyticEvent::CustomerSheetRemovePaymentMethod => "cs_remove_payment_method",
            AnalyticEvent::CardScanStart => "paykit.card_scan.start",
            AnalyticEvent::CardScanSuccess => "paykit.card_scan.success",
            AnalyticEvent::CardScanCancel => "paykit.card_scan.cancel",
            AnalyticEvent::IdentitySheetPresented => "identity.sheet_presented",
            AnalyticEvent::IdentitySheetClosed => "identity.sheet_closed",
            AnalyticEvent::IdentitySheetFailed => "identity.sheet_failed",
            AnalyticEvent::LinkAccountLookupComplete => "link.account_lookup.complete",
            AnalyticEvent::LinkSignupComplete => "link.signup.complete",
        }
    }
}

impl fmt::Display for AnalyticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AnalyticEvent::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| Error::InvalidParam {
                key: "event".to_string(),
                message: format!("unknown event name '{}'", s),
            })
    }
}

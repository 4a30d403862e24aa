//! Payment provider vocabulary shared by the orchestrator and the gateway.
//!
//! Result codes follow the COPYandPAY convention: a dotted code whose prefix
//! says whether the transaction went through.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BookingId, Money, Profile};

/// Result code prefixes that mean the payment succeeded.
const SUCCESS_PREFIXES: [&str; 6] = [
    "000.000.",
    "000.100.1",
    "000.3",
    "000.6",
    "000.400.110",
    "000.400.120",
];

/// Whether a provider result code denotes a successful payment.
///
/// # Examples
/// ```
/// use backend::domain::is_success_code;
///
/// assert!(is_success_code("000.100.110"));
/// assert!(!is_success_code("800.100.151"));
/// ```
pub fn is_success_code(code: &str) -> bool {
    let code = code.trim();
    SUCCESS_PREFIXES.iter().any(|prefix| code.starts_with(prefix))
}

/// Terminal outcome of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

/// Provider verdict on a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub code: String,
    pub description: String,
    /// Complete provider response, stored for audit.
    pub raw: Value,
}

impl PaymentResult {
    /// Classify the result code.
    pub fn outcome(&self) -> PaymentOutcome {
        if is_success_code(&self.code) {
            PaymentOutcome::Paid
        } else {
            PaymentOutcome::Failed
        }
    }
}

/// Billing fields sent with a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDetails {
    pub given_name: String,
    pub surname: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postcode: String,
}

impl BillingDetails {
    /// Billing fields from the profile, falling back to `defaults` per field.
    pub fn from_profile(profile: &Profile, defaults: &Self) -> Self {
        fn pick(value: Option<&str>, fallback: &str) -> String {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_owned()
        }

        Self {
            given_name: pick(Some(profile.first_name.as_str()), &defaults.given_name),
            surname: pick(Some(profile.last_name.as_str()), &defaults.surname),
            email: pick(profile.email.as_deref(), &defaults.email),
            street: pick(profile.street.as_deref(), &defaults.street),
            city: pick(profile.city.as_deref(), &defaults.city),
            state: pick(profile.state.as_deref(), &defaults.state),
            country: pick(profile.country.as_deref(), &defaults.country),
            postcode: pick(profile.postcode.as_deref(), &defaults.postcode),
        }
    }
}

impl Default for BillingDetails {
    fn default() -> Self {
        Self {
            given_name: "Customer".to_owned(),
            surname: "Customer".to_owned(),
            email: "customer@example.com".to_owned(),
            street: "N/A".to_owned(),
            city: "Riyadh".to_owned(),
            state: "Riyadh".to_owned(),
            country: "SA".to_owned(),
            postcode: "00000".to_owned(),
        }
    }
}

/// Checkout creation request handed to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub merchant_transaction_id: String,
    pub amount: Money,
    pub currency: String,
    pub billing: BillingDetails,
}

/// Provider-issued checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub checkout_id: String,
    pub raw: Value,
}

/// How to look up a checkout result at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentLookup {
    /// Resource path echoed back on the shopper redirect.
    ResourcePath(String),
    /// Checkout id for direct polling.
    CheckoutId(String),
}

/// Checkout linkage persisted once the provider accepted a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutAttachment {
    pub merchant_transaction_id: String,
    pub checkout_id: String,
    pub amount: Money,
    pub currency: String,
    pub attached_at: chrono::DateTime<chrono::Utc>,
}

/// Terminal payment update applied with a `payment_status <> 'paid'` guard.
///
/// Only lands while `checkout_id` is still the checkout attached to the
/// booking.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettlement {
    pub checkout_id: String,
    pub outcome: PaymentOutcome,
    pub result: Value,
    pub settled_at: chrono::DateTime<chrono::Utc>,
}

/// Where the provider redirect should send the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRedirect {
    Success(BookingId),
    Failure(BookingId),
    Error,
}

//! Recording test doubles for the notifier, payment gateway and clock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::{Notifier, NotifierError, PaymentGateway, PaymentGatewayError};
use crate::domain::{
    CheckoutRequest, CheckoutSession, Notification, NotificationTemplate, PaymentLookup,
    PaymentResult,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Notifier keeping every notification it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }

    /// Templates sent so far, in order.
    pub fn templates(&self) -> Vec<NotificationTemplate> {
        lock(&self.sent).iter().map(|n| n.template).collect()
    }

    /// Player ids addressed by the most recent notification.
    pub fn last_players(&self) -> Vec<String> {
        lock(&self.sent)
            .last()
            .map(|n| n.player_ids.clone())
            .unwrap_or_default()
    }

    /// Forget recorded notifications.
    pub fn clear(&self) {
        lock(&self.sent).clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        lock(&self.sent).push(notification.clone());
        Ok(())
    }
}

struct GatewayState {
    next_checkout: u32,
    result_code: String,
    checkouts: Vec<CheckoutRequest>,
    lookups: Vec<PaymentLookup>,
}

/// Payment provider stand-in issuing sequential checkout ids and answering
/// lookups with a configurable result code.
pub struct StubPaymentGateway {
    state: Mutex<GatewayState>,
}

impl Default for StubPaymentGateway {
    fn default() -> Self {
        Self {
            state: Mutex::new(GatewayState {
                next_checkout: 1,
                result_code: "000.100.110".to_owned(),
                checkouts: Vec::new(),
                lookups: Vec::new(),
            }),
        }
    }
}

impl StubPaymentGateway {
    /// Result code returned by subsequent lookups.
    pub fn answer_with(&self, code: &str) {
        lock(&self.state).result_code = code.to_owned();
    }

    /// Checkout requests received so far.
    pub fn checkouts(&self) -> Vec<CheckoutRequest> {
        lock(&self.state).checkouts.clone()
    }

    /// Number of result lookups performed.
    pub fn lookup_count(&self) -> usize {
        lock(&self.state).lookups.len()
    }

    /// Checkout id the stub issues for the `n`th checkout, starting at 1.
    pub fn checkout_id(n: u32) -> String {
        format!("stub-checkout-{n}")
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let mut state = lock(&self.state);
        let checkout_id = Self::checkout_id(state.next_checkout);
        state.next_checkout += 1;
        state.checkouts.push(request.clone());
        Ok(CheckoutSession {
            raw: json!({ "id": checkout_id, "result": { "code": "000.200.100" } }),
            checkout_id,
        })
    }

    async fn fetch_result(
        &self,
        lookup: &PaymentLookup,
    ) -> Result<PaymentResult, PaymentGatewayError> {
        let mut state = lock(&self.state);
        state.lookups.push(lookup.clone());
        let code = state.result_code.clone();
        Ok(PaymentResult {
            description: format!("stub result {code}"),
            raw: json!({ "result": { "code": code } }),
            code,
        })
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *lock(&self.0) += TimeDelta::minutes(minutes);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

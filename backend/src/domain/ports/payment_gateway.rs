//! Port for the hosted checkout provider.

use async_trait::async_trait;

use crate::domain::{CheckoutRequest, CheckoutSession, PaymentLookup, PaymentResult};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The provider could not be reached.
        Transport { message: String } =>
            "payment provider transport failed: {message}",
        /// The provider did not answer within the configured timeout.
        Timeout { message: String } =>
            "payment provider timed out: {message}",
        /// The provider answered with a non-success HTTP status.
        Status { status: u16, message: String } =>
            "payment provider returned status {status}: {message}",
        /// The provider response could not be decoded.
        Decode { message: String } =>
            "payment provider response was invalid: {message}",
        /// The lookup or checkout request was rejected before sending.
        InvalidRequest { message: String } =>
            "payment request is invalid: {message}",
    }
}

/// Hosted checkout creation and result verification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout session for the request.
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;

    /// Fetch the provider's verdict on a checkout.
    async fn fetch_result(
        &self,
        lookup: &PaymentLookup,
    ) -> Result<PaymentResult, PaymentGatewayError>;
}

//! Driving port for checkout and payment reconciliation.

use async_trait::async_trait;

use crate::domain::{Booking, BookingId, Error, Money, PaymentRedirect, PaymentResult, UserId};

/// Request to open a provider checkout for a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutRequest {
    pub user_id: UserId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub merchant_transaction_id: String,
}

/// Request to poll the provider for a checkout result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusRequest {
    pub user_id: UserId,
    pub booking_id: BookingId,
    pub checkout_id: String,
}

/// Provider verdict with the reconciled booking.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusResponse {
    pub payment_result: PaymentResult,
    pub booking: Booking,
}

/// Payment orchestration commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    /// Create a provider checkout and link it to the booking.
    async fn create_checkout(&self, request: CreateCheckoutRequest) -> Result<Booking, Error>;

    /// Reconcile the provider's shopper redirect.
    async fn handle_return(&self, resource_path: String) -> Result<PaymentRedirect, Error>;

    /// Poll the provider for the checkout attached to the booking and reconcile
    /// the result.
    async fn payment_status(
        &self,
        request: PaymentStatusRequest,
    ) -> Result<PaymentStatusResponse, Error>;
}

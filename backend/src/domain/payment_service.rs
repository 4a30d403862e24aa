//! Payment orchestrator.
//!
//! Opens hosted checkouts for bookings and reconciles provider results. The
//! browser return and the polling endpoint share one reconciliation path: a
//! conditional settlement that never moves a paid booking backwards, with
//! the `isPaid` announcement sent only by the update that changed the row.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    BookingRepository, CreateCheckoutRequest, Notifier, PaymentCommand, PaymentGateway,
    PaymentStatusRequest, PaymentStatusResponse, ProfileRepository,
};
use crate::domain::service_support::{
    map_booking_error, map_gateway_error, player_id_of, require_profile,
};
use crate::domain::{
    BillingDetails, Booking, BookingId, CheckoutAttachment, CheckoutRequest, Error, Notification,
    PartyRole, PaymentLookup, PaymentOutcome, PaymentRedirect, PaymentResult, PaymentSettlement,
    PaymentStatus, Profile, UserId, dispatch,
};

/// Path prefix every provider resource path must carry.
pub const CHECKOUT_PATH_PREFIX: &str = "/v1/checkouts/";

/// Settings for [`PaymentService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentServiceConfig {
    /// ISO 4217 currency sent with every checkout.
    pub currency: String,
    /// Billing values used where the client profile has none.
    pub billing_defaults: BillingDetails,
}

impl Default for PaymentServiceConfig {
    fn default() -> Self {
        Self {
            currency: "SAR".to_owned(),
            billing_defaults: BillingDetails::default(),
        }
    }
}

/// Ports used by [`PaymentService`].
#[derive(Clone)]
pub struct PaymentServicePorts {
    pub bookings: Arc<dyn BookingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

/// Payment service implementing [`PaymentCommand`].
#[derive(Clone)]
pub struct PaymentService {
    ports: PaymentServicePorts,
    clock: Arc<dyn Clock>,
    config: PaymentServiceConfig,
}

/// Checkout id embedded in a provider resource path.
///
/// # Examples
/// ```
/// use backend::domain::payment_service::checkout_id_from_path;
///
/// assert_eq!(
///     checkout_id_from_path("/v1/checkouts/8ac7a4a1/payment"),
///     Some("8ac7a4a1")
/// );
/// assert_eq!(checkout_id_from_path("/v1/payments/8ac7a4a1"), None);
/// ```
pub fn checkout_id_from_path(resource_path: &str) -> Option<&str> {
    resource_path
        .strip_prefix(CHECKOUT_PATH_PREFIX)?
        .split('/')
        .next()
        .filter(|id| !id.trim().is_empty())
}

impl PaymentService {
    /// Create a payment service over the given ports.
    pub fn new(
        ports: PaymentServicePorts,
        clock: Arc<dyn Clock>,
        config: PaymentServiceConfig,
    ) -> Self {
        Self {
            ports,
            clock,
            config,
        }
    }

    async fn find_booking(&self, id: &BookingId) -> Result<Booking, Error> {
        self.ports
            .bookings
            .find_by_id(id)
            .await
            .map_err(map_booking_error)?
            .ok_or_else(|| Error::not_found(format!("booking {id} not found")))
    }

    async fn owned_booking(
        &self,
        user_id: &UserId,
        booking_id: &BookingId,
    ) -> Result<(Profile, Booking), Error> {
        let client =
            require_profile(self.ports.profiles.as_ref(), user_id, PartyRole::Client).await?;
        let booking = self.find_booking(booking_id).await?;
        if booking.client_id != client.id {
            return Err(Error::forbidden(
                "booking does not belong to the current client",
            ));
        }
        Ok((client, booking))
    }

    /// Apply a provider result to the booking and announce a fresh payment.
    async fn reconcile(
        &self,
        booking: &Booking,
        checkout_id: &str,
        result: &PaymentResult,
    ) -> Result<Booking, Error> {
        let settlement = PaymentSettlement {
            checkout_id: checkout_id.to_owned(),
            outcome: result.outcome(),
            result: result.raw.clone(),
            settled_at: self.clock.utc(),
        };
        let settled = self
            .ports
            .bookings
            .settle_payment(&booking.id, &settlement)
            .await
            .map_err(map_booking_error)?
            .ok_or_else(|| Error::not_found(format!("booking {} not found", booking.id)))?;

        if !settled.changed {
            info!(
                booking_id = %booking.id,
                code = %result.code,
                "payment result already applied"
            );
            return Ok(settled.booking);
        }

        match settlement.outcome {
            PaymentOutcome::Paid => {
                info!(booking_id = %booking.id, code = %result.code, "booking paid");
                self.announce_payment(&settled.booking).await;
            }
            PaymentOutcome::Failed => {
                warn!(
                    booking_id = %booking.id,
                    code = %result.code,
                    description = %result.description,
                    "payment failed"
                );
            }
        }
        Ok(settled.booking)
    }

    async fn announce_payment(&self, booking: &Booking) {
        let recipients = booking.status.recipients();
        let mut notification = Notification::new(booking.status.template())
            .with_variable("bookingId", booking.id.to_string())
            .with_data(json!({ "bookingId": booking.id, "status": booking.status }));
        for role in [PartyRole::Client, PartyRole::Talent] {
            if recipients.includes(role) {
                let player = player_id_of(self.ports.profiles.as_ref(), &booking.party(role)).await;
                notification = notification.to_player(player.as_deref());
            }
        }
        dispatch(self.ports.notifier.as_ref(), notification).await;
    }
}

#[async_trait]
impl PaymentCommand for PaymentService {
    async fn create_checkout(&self, request: CreateCheckoutRequest) -> Result<Booking, Error> {
        let merchant_transaction_id = request.merchant_transaction_id.trim();
        if merchant_transaction_id.is_empty() {
            return Err(
                Error::invalid_request("merchantTransactionId is required").with_details(json!({
                    "field": "merchantTransactionId",
                    "code": "required",
                })),
            );
        }
        if request.amount.is_zero() {
            return Err(
                Error::invalid_request("amount must be greater than zero").with_details(json!({
                    "field": "amount",
                    "value": request.amount,
                    "code": "invalid_amount",
                })),
            );
        }

        let (client, booking) = self
            .owned_booking(&request.user_id, &request.booking_id)
            .await?;
        if booking.payment.status == PaymentStatus::Paid {
            return Err(Error::conflict("booking is already paid")
                .with_details(json!({ "bookingId": booking.id })));
        }

        let checkout = CheckoutRequest {
            merchant_transaction_id: merchant_transaction_id.to_owned(),
            amount: request.amount,
            currency: self.config.currency.clone(),
            billing: BillingDetails::from_profile(&client, &self.config.billing_defaults),
        };
        let session = self
            .ports
            .gateway
            .create_checkout(&checkout)
            .await
            .map_err(|err| {
                warn!(booking_id = %booking.id, error = %err, "checkout creation failed");
                map_gateway_error(err)
            })?;

        let attachment = CheckoutAttachment {
            merchant_transaction_id: checkout.merchant_transaction_id,
            checkout_id: session.checkout_id,
            amount: checkout.amount,
            currency: checkout.currency,
            attached_at: self.clock.utc(),
        };
        let updated = self
            .ports
            .bookings
            .attach_checkout(&booking.id, &attachment)
            .await
            .map_err(map_booking_error)?
            .ok_or_else(|| Error::not_found(format!("booking {} not found", booking.id)))?;

        info!(
            booking_id = %updated.id,
            checkout_id = %attachment.checkout_id,
            amount = %attachment.amount,
            "checkout created"
        );
        Ok(updated)
    }

    async fn handle_return(&self, resource_path: String) -> Result<PaymentRedirect, Error> {
        let checkout_id = checkout_id_from_path(&resource_path).ok_or_else(|| {
            Error::invalid_request("resourcePath must reference a checkout").with_details(json!({
                "field": "resourcePath",
                "value": resource_path,
                "code": "invalid_resource_path",
            }))
        })?;

        let result = self
            .ports
            .gateway
            .fetch_result(&PaymentLookup::ResourcePath(resource_path.clone()))
            .await
            .map_err(map_gateway_error)?;

        let Some(booking) = self
            .ports
            .bookings
            .find_by_checkout_id(checkout_id)
            .await
            .map_err(map_booking_error)?
        else {
            warn!(checkout_id, "payment return for unknown checkout");
            return Ok(PaymentRedirect::Error);
        };

        let settled = self.reconcile(&booking, checkout_id, &result).await?;
        Ok(if settled.payment.status == PaymentStatus::Paid {
            PaymentRedirect::Success(settled.id)
        } else {
            PaymentRedirect::Failure(settled.id)
        })
    }

    async fn payment_status(
        &self,
        request: PaymentStatusRequest,
    ) -> Result<PaymentStatusResponse, Error> {
        let checkout_id = request.checkout_id.trim();
        if checkout_id.is_empty() {
            return Err(Error::invalid_request("checkoutId is required")
                .with_details(json!({ "field": "checkoutId", "code": "required" })));
        }
        let (_, booking) = self
            .owned_booking(&request.user_id, &request.booking_id)
            .await?;
        if booking.payment.checkout_id.as_deref() != Some(checkout_id) {
            return Err(
                Error::invalid_request("checkout does not belong to this booking").with_details(
                    json!({ "field": "checkoutId", "value": checkout_id, "code": "mismatch" }),
                ),
            );
        }

        let payment_result = self
            .ports
            .gateway
            .fetch_result(&PaymentLookup::CheckoutId(checkout_id.to_owned()))
            .await
            .map_err(map_gateway_error)?;
        let booking = self
            .reconcile(&booking, checkout_id, &payment_result)
            .await?;
        Ok(PaymentStatusResponse {
            payment_result,
            booking,
        })
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;

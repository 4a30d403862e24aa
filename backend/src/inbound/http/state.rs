//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see driving ports, so
//! they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{BookingCommand, BookingQuery, PaymentCommand, RescheduleCommand};

/// Where the provider redirect sends the shopper after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirectUrls {
    /// Base of the success page; the booking id is appended as `bookingId`.
    pub success: String,
    /// Base of the failure page; the booking id is appended as `bookingId`.
    pub failure: String,
    /// Page shown when the checkout cannot be matched to a booking.
    pub error: String,
}

impl Default for PaymentRedirectUrls {
    fn default() -> Self {
        Self {
            success: "/payments/success".to_owned(),
            failure: "/payments/failure".to_owned(),
            error: "/payments/error".to_owned(),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub bookings: Arc<dyn BookingCommand>,
    pub booking_queries: Arc<dyn BookingQuery>,
    pub reschedules: Arc<dyn RescheduleCommand>,
    pub payments: Arc<dyn PaymentCommand>,
    pub redirects: PaymentRedirectUrls,
}

impl HttpState {
    /// Bundle the ports with the given redirect targets.
    pub fn new(
        bookings: Arc<dyn BookingCommand>,
        booking_queries: Arc<dyn BookingQuery>,
        reschedules: Arc<dyn RescheduleCommand>,
        payments: Arc<dyn PaymentCommand>,
        redirects: PaymentRedirectUrls,
    ) -> Self {
        Self {
            bookings,
            booking_queries,
            reschedules,
            payments,
            redirects,
        }
    }
}

//! Port answering whether a booking has been reviewed.

use async_trait::async_trait;

use crate::domain::BookingId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by review lookup adapters.
    pub enum ReviewLookupError {
        /// Lookup connection could not be established.
        Connection { message: String } =>
            "review lookup connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "review lookup query failed: {message}",
    }
}

/// Review existence check used by the completion guard.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewLookup: Send + Sync {
    /// Whether any review exists for the booking.
    async fn has_review(&self, booking_id: &BookingId) -> Result<bool, ReviewLookupError>;
}

/// Fixture implementation reporting no reviews.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReviewLookup;

#[async_trait]
impl ReviewLookup for FixtureReviewLookup {
    async fn has_review(&self, _booking_id: &BookingId) -> Result<bool, ReviewLookupError> {
        Ok(false)
    }
}

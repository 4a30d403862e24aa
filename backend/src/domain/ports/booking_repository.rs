//! Port for booking rows, the slot ledger and payment linkage.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;

use crate::domain::{
    Booking, BookingId, BookingSlot, BookingStatus, CheckoutAttachment, NewBooking, PartyRole,
    PaymentSettlement, ProfileId, SlotRequest,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "booking repository query failed: {message}",
        /// The slot uniqueness constraint rejected an insert or rewrite.
        SlotTaken { message: String } =>
            "slot already exists: {message}",
        /// Requested slots overlap another active booking of the talent.
        SlotsBooked { slots: Vec<SlotRequest> } =>
            "requested slots are already booked",
    }
}

/// Booking together with the slot rows inserted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub slots: Vec<BookingSlot>,
}

/// Filter for the role-scoped booking list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingListFilter {
    pub role: PartyRole,
    pub profile_id: ProfileId,
    pub status: Option<BookingStatus>,
    pub page: PageRequest,
}

/// Result of a guarded payment settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub booking: Booking,
    /// False when the booking was already paid and nothing changed.
    pub changed: bool,
}

/// Port for booking persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking and its slots atomically.
    ///
    /// Adapters serialise concurrent creations per talent and reject slots
    /// overlapping another active booking with
    /// [`BookingRepositoryError::SlotsBooked`].
    async fn create_with_slots(
        &self,
        booking: &NewBooking,
        slots: &[SlotRequest],
    ) -> Result<CreatedBooking, BookingRepositoryError>;

    /// Find a booking by id.
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Find the booking holding a provider checkout id.
    async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Slot rows of a booking ordered by date and time.
    async fn list_slots(&self, id: &BookingId) -> Result<Vec<BookingSlot>, BookingRepositoryError>;

    /// Slot rows of several bookings.
    async fn list_slots_for(
        &self,
        ids: &[BookingId],
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError>;

    /// Persist a new status, returning the updated booking.
    async fn update_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Page of bookings where the profile is the given party, newest first,
    /// with the total number of matches.
    async fn list_for_party(
        &self,
        filter: &BookingListFilter,
    ) -> Result<(Vec<Booking>, u64), BookingRepositoryError>;

    /// Slots of the talent's active bookings within an optional date window.
    async fn list_active_slots_for_talent(
        &self,
        talent_id: &ProfileId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError>;

    /// Record a provider checkout and mark the payment pending.
    async fn attach_checkout(
        &self,
        id: &BookingId,
        checkout: &CheckoutAttachment,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Apply a terminal payment result unless the booking is already paid.
    async fn settle_payment(
        &self,
        id: &BookingId,
        settlement: &PaymentSettlement,
    ) -> Result<Option<SettlementOutcome>, BookingRepositoryError>;
}

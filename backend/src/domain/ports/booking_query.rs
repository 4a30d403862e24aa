//! Driving port for booking read models.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::{Page, PageRequest};

use crate::domain::{
    Booking, BookingId, BookingStatus, Error, Money, PartyRole, ProfileId, ProfileSummary,
    Reschedule, SlotGroup, UserId,
};

/// Booking with merged slots and its computed price.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingView {
    pub booking: Booking,
    pub slots: Vec<SlotGroup>,
    pub total_price: Money,
}

/// Request for a single booking's details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingDetailsRequest {
    pub user_id: UserId,
    pub role: PartyRole,
    pub booking_id: BookingId,
}

/// Detail read model of one booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDetails {
    pub view: BookingView,
    pub latest_reschedule: Option<Reschedule>,
    pub counterparty: Option<ProfileSummary>,
}

/// Request for the caller's bookings on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListBookingsRequest {
    pub user_id: UserId,
    pub role: PartyRole,
    pub status: Option<BookingStatus>,
    pub page: PageRequest,
}

/// Request for a talent's busy calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusySlotsRequest {
    pub talent_id: ProfileId,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Booking read queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// Details of a booking the caller is party to.
    async fn booking_details(&self, request: BookingDetailsRequest)
    -> Result<BookingDetails, Error>;

    /// Page of the caller's bookings, newest first.
    async fn list_bookings(&self, request: ListBookingsRequest) -> Result<Page<BookingView>, Error>;

    /// Merged slots of the talent's active bookings per date.
    async fn busy_slots(&self, request: BusySlotsRequest) -> Result<Vec<SlotGroup>, Error>;
}

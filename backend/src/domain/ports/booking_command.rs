//! Driving port for booking creation and status transitions.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    Booking, BookingId, BookingSlot, Error, PartyRole, ProfileId, SkillId, SlotRequest, UserId,
};

/// Request to book a talent for one or more slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBookingRequest {
    /// Authenticated user acting as the client.
    pub user_id: UserId,
    pub talent_id: ProfileId,
    pub skill_id: Option<SkillId>,
    pub note: Option<String>,
    /// Raw `{ "YYYY-MM-DD": ["HH:MM - HH:MM", ...] }` mapping.
    pub slots_by_date: Value,
}

/// Created booking with inserted slots and repeated pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBookingResponse {
    pub booking: Booking,
    pub slots: Vec<BookingSlot>,
    pub duplicates: Vec<SlotRequest>,
}

/// Request to move a booking to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBookingStatusRequest {
    pub user_id: UserId,
    /// Side the user acts for.
    pub role: PartyRole,
    pub booking_id: BookingId,
    /// Requested status wire name; validated by the service.
    pub status: String,
}

/// Booking creation and lifecycle commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Create a booking and its slot rows.
    async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<CreateBookingResponse, Error>;

    /// Transition a booking, returning it with the persisted status.
    async fn set_status(&self, request: SetBookingStatusRequest) -> Result<Booking, Error>;
}

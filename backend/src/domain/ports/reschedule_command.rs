//! Driving port for the reschedule workflow.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{BookingId, Error, PartyRole, Reschedule, RescheduleId, TimeRange, UserId};

/// Proposal to move one slot of a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRescheduleRequest {
    pub user_id: UserId,
    pub role: PartyRole,
    pub booking_id: BookingId,
    /// Slot to move; the booking's first slot when absent.
    pub old_slot: Option<(NaiveDate, TimeRange)>,
    pub new_date: NaiveDate,
    pub new_time: TimeRange,
}

/// Counter-party decision on a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecideRescheduleRequest {
    pub user_id: UserId,
    pub role: PartyRole,
    pub reschedule_id: RescheduleId,
    pub remarks: Option<String>,
}

/// Reschedule workflow commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RescheduleCommand: Send + Sync {
    /// Propose a new date and time for a booking slot.
    async fn request_reschedule(
        &self,
        request: RequestRescheduleRequest,
    ) -> Result<Reschedule, Error>;

    /// Accept a pending proposal and move the slot.
    async fn approve_reschedule(&self, request: DecideRescheduleRequest)
    -> Result<Reschedule, Error>;

    /// Reject a pending proposal.
    async fn reject_reschedule(
        &self,
        request: DecideRescheduleRequest,
    ) -> Result<Reschedule, Error>;
}

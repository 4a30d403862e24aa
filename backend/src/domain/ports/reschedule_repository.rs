//! Port for reschedule proposals.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    BookingId, Reschedule, RescheduleDecision, RescheduleId, RescheduleProposal,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reschedule repository adapters.
    pub enum RescheduleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "reschedule repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "reschedule repository query failed: {message}",
        /// The requester already has a pending proposal for the booking.
        AlreadyPending { message: String } =>
            "reschedule already pending: {message}",
        /// Rewriting the slot collided with an existing slot row.
        SlotTaken { message: String } =>
            "slot already exists: {message}",
        /// The new slot overlaps another active booking of the talent.
        SlotBooked { date: NaiveDate, time: String } =>
            "slot {date} {time} is already booked",
    }
}

/// Port for reschedule persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RescheduleRepository: Send + Sync {
    /// Insert a proposal, or revive the requester's latest rejected one.
    ///
    /// Runs in one transaction. A pending proposal from the same requester
    /// yields [`RescheduleRepositoryError::AlreadyPending`].
    async fn propose(
        &self,
        proposal: &RescheduleProposal,
    ) -> Result<Reschedule, RescheduleRepositoryError>;

    /// Find a proposal by id.
    async fn find_by_id(
        &self,
        id: &RescheduleId,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError>;

    /// Most recently updated proposal of a booking.
    async fn latest_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError>;

    /// Accept a pending proposal and move the matching slot row in place.
    ///
    /// The talent's calendar is checked under the same lock as booking
    /// creation; an overlap yields [`RescheduleRepositoryError::SlotBooked`]
    /// and leaves the proposal pending. Returns `None` when the proposal is
    /// no longer pending.
    async fn approve(
        &self,
        id: &RescheduleId,
        decision: &RescheduleDecision,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError>;

    /// Reject a pending proposal. Returns `None` when it is no longer pending.
    async fn reject(
        &self,
        id: &RescheduleId,
        decision: &RescheduleDecision,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError>;
}

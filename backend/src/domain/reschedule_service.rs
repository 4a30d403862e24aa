//! Reschedule workflow service.
//!
//! Proposals capture the slot being moved and the requested replacement,
//! which must not overlap another active slot on the talent's calendar.
//! Only the counter-party may decide; approval re-checks the calendar and
//! rewrites the ledger row in the same transaction that marks the proposal
//! accepted.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    BookingRepository, DecideRescheduleRequest, Notifier, ProfileRepository,
    RequestRescheduleRequest, RescheduleCommand, RescheduleRepository,
};
use crate::domain::service_support::{
    authorize_party, map_booking_error, map_reschedule_error, player_id_of, slots_booked,
};
use crate::domain::{
    Booking, BookingId, BookingSlot, Error, Notification, NotificationTemplate, Reschedule,
    RescheduleDecision, RescheduleId, RescheduleProposal, dispatch, overlaps_booked,
};

/// Ports used by [`RescheduleService`].
#[derive(Clone)]
pub struct RescheduleServicePorts {
    pub bookings: Arc<dyn BookingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub reschedules: Arc<dyn RescheduleRepository>,
    pub notifier: Arc<dyn Notifier>,
}

/// Reschedule service implementing [`RescheduleCommand`].
#[derive(Clone)]
pub struct RescheduleService {
    ports: RescheduleServicePorts,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    fn template(self) -> NotificationTemplate {
        match self {
            Self::Approve => NotificationTemplate::RescheduleApproved,
            Self::Reject => NotificationTemplate::RescheduleRejected,
        }
    }
}

impl RescheduleService {
    /// Create a reschedule service over the given ports.
    pub fn new(ports: RescheduleServicePorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    async fn find_booking(&self, id: &BookingId) -> Result<Booking, Error> {
        self.ports
            .bookings
            .find_by_id(id)
            .await
            .map_err(map_booking_error)?
            .ok_or_else(|| Error::not_found(format!("booking {id} not found")))
    }

    async fn find_reschedule(&self, id: &RescheduleId) -> Result<Reschedule, Error> {
        self.ports
            .reschedules
            .find_by_id(id)
            .await
            .map_err(map_reschedule_error)?
            .ok_or_else(|| Error::not_found(format!("reschedule {id} not found")))
    }

    fn already_processed(reschedule: &Reschedule) -> Error {
        Error::invalid_request("reschedule already processed").with_details(json!({
            "rescheduleId": reschedule.id,
            "status": reschedule.status,
        }))
    }

    async fn decide(
        &self,
        request: DecideRescheduleRequest,
        verdict: Verdict,
    ) -> Result<Reschedule, Error> {
        let reschedule = self.find_reschedule(&request.reschedule_id).await?;
        let booking = self.find_booking(&reschedule.booking_id).await?;
        if request.role != reschedule.requested_by_role.counterparty() {
            return Err(Error::forbidden(
                "only the other party may decide on a reschedule",
            ));
        }
        let approver = authorize_party(
            self.ports.profiles.as_ref(),
            &booking,
            &request.user_id,
            request.role,
        )
        .await?;
        if !reschedule.is_pending() {
            return Err(Self::already_processed(&reschedule));
        }

        let decision = RescheduleDecision {
            decided_by: approver.id,
            remarks: request
                .remarks
                .map(|remarks| remarks.trim().to_owned())
                .filter(|remarks| !remarks.is_empty()),
            decided_at: self.clock.utc(),
        };
        let reschedules = self.ports.reschedules.as_ref();
        let decided = match verdict {
            Verdict::Approve => reschedules.approve(&reschedule.id, &decision).await,
            Verdict::Reject => reschedules.reject(&reschedule.id, &decision).await,
        }
        .map_err(map_reschedule_error)?
        .ok_or_else(|| Self::already_processed(&reschedule))?;

        info!(
            reschedule_id = %decided.id,
            booking_id = %booking.id,
            status = %decided.status,
            "reschedule decided"
        );

        let player = player_id_of(self.ports.profiles.as_ref(), &decided.requested_by).await;
        let notification = Notification::new(verdict.template())
            .to_player(player.as_deref())
            .with_variable("date", decided.new_date.to_string())
            .with_variable("time", decided.new_time.clone())
            .with_data(json!({
                "bookingId": booking.id,
                "rescheduleId": decided.id,
            }));
        dispatch(self.ports.notifier.as_ref(), notification).await;
        Ok(decided)
    }
}

#[async_trait]
impl RescheduleCommand for RescheduleService {
    async fn request_reschedule(
        &self,
        request: RequestRescheduleRequest,
    ) -> Result<Reschedule, Error> {
        let booking = self.find_booking(&request.booking_id).await?;
        let requester = authorize_party(
            self.ports.profiles.as_ref(),
            &booking,
            &request.user_id,
            request.role,
        )
        .await?;
        if !booking.status.is_active() {
            return Err(Error::conflict(format!(
                "booking is {} and cannot be rescheduled",
                booking.status
            ))
            .with_details(json!({ "status": booking.status })));
        }

        let slots = self
            .ports
            .bookings
            .list_slots(&booking.id)
            .await
            .map_err(map_booking_error)?;
        let old_slot = match request.old_slot {
            Some((date, time)) => slots
                .iter()
                .find(|slot| slot.matches(date, &time.to_string())),
            None => slots.first(),
        }
        .ok_or_else(|| Error::not_found("booking slot not found"))?;

        let new_time = request.new_time.to_string();
        if slots
            .iter()
            .any(|slot| slot.matches(request.new_date, &new_time))
        {
            return Err(Error::invalid_request("slot already exists").with_details(json!({
                "field": "newTime",
                "value": new_time,
                "code": "slot_exists",
            })));
        }

        let calendar: Vec<BookingSlot> = self
            .ports
            .bookings
            .list_active_slots_for_talent(
                &booking.talent_id,
                Some(request.new_date),
                Some(request.new_date),
            )
            .await
            .map_err(map_booking_error)?
            .into_iter()
            .filter(|slot| slot.id != old_slot.id)
            .collect();
        if overlaps_booked(request.new_date, &new_time, &calendar) {
            return Err(slots_booked(vec![(request.new_date, new_time)]));
        }

        let proposal = RescheduleProposal {
            booking_id: booking.id,
            requested_by_role: request.role,
            requested_by: requester.id,
            old_date: old_slot.date,
            old_time: old_slot.time.clone(),
            new_date: request.new_date,
            new_time,
            proposed_at: self.clock.utc(),
        };
        let reschedule = self
            .ports
            .reschedules
            .propose(&proposal)
            .await
            .map_err(map_reschedule_error)?;

        info!(
            reschedule_id = %reschedule.id,
            booking_id = %booking.id,
            requested_by = %request.role,
            "reschedule requested"
        );

        let counterparty = booking.party(request.role.counterparty());
        let player = player_id_of(self.ports.profiles.as_ref(), &counterparty).await;
        let notification = Notification::new(NotificationTemplate::Rescheduled)
            .to_player(player.as_deref())
            .with_variable("requesterName", requester.display_name())
            .with_variable("oldDate", reschedule.old_date.to_string())
            .with_variable("oldTime", reschedule.old_time.clone())
            .with_variable("date", reschedule.new_date.to_string())
            .with_variable("time", reschedule.new_time.clone())
            .with_data(json!({
                "bookingId": booking.id,
                "rescheduleId": reschedule.id,
            }));
        dispatch(self.ports.notifier.as_ref(), notification).await;
        Ok(reschedule)
    }

    async fn approve_reschedule(
        &self,
        request: DecideRescheduleRequest,
    ) -> Result<Reschedule, Error> {
        self.decide(request, Verdict::Approve).await
    }

    async fn reject_reschedule(
        &self,
        request: DecideRescheduleRequest,
    ) -> Result<Reschedule, Error> {
        self.decide(request, Verdict::Reject).await
    }
}

#[cfg(test)]
#[path = "reschedule_service_tests.rs"]
mod tests;

//! Booking lifecycle service.
//!
//! Implements [`BookingCommand`] and [`BookingQuery`]: slot staging and
//! insertion, the transition guard with its review-pending substitution,
//! notification fan-out, and the priced read models.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use pagination::Page;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    AvailabilityRepository, BookingCommand, BookingDetails, BookingDetailsRequest,
    BookingListFilter, BookingQuery, BookingRepository, BookingView, BusySlotsRequest,
    CreateBookingRequest, CreateBookingResponse, ListBookingsRequest, Notifier,
    ProfileRepository, RescheduleRepository, ReviewLookup, SetBookingStatusRequest,
};
use crate::domain::service_support::{
    authorize_party, map_availability_error, map_booking_error, map_profile_error,
    map_reschedule_error, map_review_error, player_id_of, require_profile,
};
use crate::domain::{
    AvailabilityEntry, Booking, BookingId, BookingSlot, BookingStatus, Error, NewBooking,
    Notification, NotificationTemplate, PartyRole, ProfileId, ProfileSummary, SlotGroup, dispatch,
    group_and_merge, parse_slots_by_date, stage_slots, total_price, transition_allowed,
};

/// Behaviour switches for [`BookingService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingServiceConfig {
    /// Reject status changes the transition table does not allow.
    pub enforce_transitions: bool,
}

impl Default for BookingServiceConfig {
    fn default() -> Self {
        Self {
            enforce_transitions: true,
        }
    }
}

/// Ports used by [`BookingService`].
#[derive(Clone)]
pub struct BookingServicePorts {
    pub bookings: Arc<dyn BookingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub reviews: Arc<dyn ReviewLookup>,
    pub reschedules: Arc<dyn RescheduleRepository>,
    pub notifier: Arc<dyn Notifier>,
}

/// Booking service implementing the booking driving ports.
#[derive(Clone)]
pub struct BookingService {
    ports: BookingServicePorts,
    clock: Arc<dyn Clock>,
    config: BookingServiceConfig,
}

impl BookingService {
    /// Create a booking service over the given ports.
    pub fn new(
        ports: BookingServicePorts,
        clock: Arc<dyn Clock>,
        config: BookingServiceConfig,
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

    async fn availability_for(
        &self,
        talent_id: &ProfileId,
        dates: &[NaiveDate],
    ) -> Result<Vec<AvailabilityEntry>, Error> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        self.ports
            .availability
            .list_for_talent(talent_id, dates)
            .await
            .map_err(map_availability_error)
    }

    fn view_of(
        booking: Booking,
        slots: &[BookingSlot],
        availability: &[AvailabilityEntry],
    ) -> BookingView {
        let groups = group_and_merge(slots);
        let total = total_price(&groups, availability);
        BookingView {
            booking,
            slots: groups,
            total_price: total,
        }
    }

    async fn resolve_status(
        &self,
        booking: &Booking,
        requested: BookingStatus,
    ) -> Result<BookingStatus, Error> {
        if requested != BookingStatus::Completed {
            return Ok(requested);
        }
        let reviewed = self
            .ports
            .reviews
            .has_review(&booking.id)
            .await
            .map_err(map_review_error)?;
        Ok(if reviewed {
            BookingStatus::Completed
        } else {
            BookingStatus::ReviewPending
        })
    }

    async fn announce_status(&self, booking: &Booking) {
        let recipients = booking.status.recipients();
        let mut notification = Notification::new(booking.status.template())
            .with_variable("bookingId", booking.id.to_string())
            .with_variable("status", booking.status.as_str())
            .with_data(json!({
                "bookingId": booking.id,
                "status": booking.status,
            }));
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
impl BookingCommand for BookingService {
    async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<CreateBookingResponse, Error> {
        let client = require_profile(
            self.ports.profiles.as_ref(),
            &request.user_id,
            PartyRole::Client,
        )
        .await?;
        let talent = self
            .ports
            .profiles
            .find_by_id(&request.talent_id)
            .await
            .map_err(map_profile_error)?
            .filter(|profile| profile.role == PartyRole::Talent)
            .ok_or_else(|| Error::not_found(format!("talent {} not found", request.talent_id)))?;

        let requested = parse_slots_by_date(&request.slots_by_date).map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "field": "slotsByDate",
                "code": "invalid_slots",
            }))
        })?;
        let staged = stage_slots(&requested);

        let new_booking = NewBooking {
            id: BookingId::random(),
            client_id: client.id,
            talent_id: talent.id,
            note: request
                .note
                .map(|note| note.trim().to_owned())
                .filter(|note| !note.is_empty()),
            skill_id: request.skill_id,
            created_at: self.clock.utc(),
        };
        let created = self
            .ports
            .bookings
            .create_with_slots(&new_booking, &staged.staged)
            .await
            .map_err(map_booking_error)?;

        info!(
            booking_id = %created.booking.id,
            talent_id = %talent.id,
            slots = created.slots.len(),
            duplicates = staged.duplicates.len(),
            "booking created"
        );

        if let Some(first) = staged.staged.first() {
            let notification = Notification::new(NotificationTemplate::NewRequest)
                .to_player(talent.player_id())
                .with_variable("clientName", client.display_name())
                .with_variable("date", first.date.to_string())
                .with_variable("time", first.time.to_string())
                .with_data(json!({ "bookingId": created.booking.id }));
            dispatch(self.ports.notifier.as_ref(), notification).await;
        }

        Ok(CreateBookingResponse {
            booking: created.booking,
            slots: created.slots,
            duplicates: staged.duplicates,
        })
    }

    async fn set_status(&self, request: SetBookingStatusRequest) -> Result<Booking, Error> {
        let requested: BookingStatus = request.status.parse().map_err(|_| {
            Error::invalid_request(format!("unknown booking status: {}", request.status))
                .with_details(json!({
                    "field": "status",
                    "value": request.status,
                    "code": "invalid_status",
                }))
        })?;
        let booking = self.find_booking(&request.booking_id).await?;
        authorize_party(
            self.ports.profiles.as_ref(),
            &booking,
            &request.user_id,
            request.role,
        )
        .await?;

        if self.config.enforce_transitions
            && !transition_allowed(booking.status, requested, request.role)
        {
            return Err(Error::conflict(format!(
                "{} cannot move booking from {} to {}",
                request.role, booking.status, requested
            ))
            .with_details(json!({
                "current": booking.status,
                "requested": requested,
            })));
        }

        let target = self.resolve_status(&booking, requested).await?;
        let updated = self
            .ports
            .bookings
            .update_status(&booking.id, target, self.clock.utc())
            .await
            .map_err(map_booking_error)?
            .ok_or_else(|| Error::not_found(format!("booking {} not found", booking.id)))?;

        info!(
            booking_id = %updated.id,
            from = %booking.status,
            requested = %requested,
            persisted = %updated.status,
            "booking status changed"
        );
        self.announce_status(&updated).await;
        Ok(updated)
    }
}

#[async_trait]
impl BookingQuery for BookingService {
    async fn booking_details(
        &self,
        request: BookingDetailsRequest,
    ) -> Result<BookingDetails, Error> {
        let booking = self.find_booking(&request.booking_id).await?;
        authorize_party(
            self.ports.profiles.as_ref(),
            &booking,
            &request.user_id,
            request.role,
        )
        .await?;

        let slots = self
            .ports
            .bookings
            .list_slots(&booking.id)
            .await
            .map_err(map_booking_error)?;
        let dates: Vec<NaiveDate> = slots
            .iter()
            .map(|slot| slot.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let availability = self.availability_for(&booking.talent_id, &dates).await?;

        let latest_reschedule = self
            .ports
            .reschedules
            .latest_for_booking(&booking.id)
            .await
            .map_err(map_reschedule_error)?;
        let counterparty = self
            .ports
            .profiles
            .find_by_id(&booking.party(request.role.counterparty()))
            .await
            .map_err(map_profile_error)?
            .as_ref()
            .map(ProfileSummary::from);

        Ok(BookingDetails {
            view: Self::view_of(booking, &slots, &availability),
            latest_reschedule,
            counterparty,
        })
    }

    async fn list_bookings(
        &self,
        request: ListBookingsRequest,
    ) -> Result<Page<BookingView>, Error> {
        let profile =
            require_profile(self.ports.profiles.as_ref(), &request.user_id, request.role).await?;
        let filter = BookingListFilter {
            role: request.role,
            profile_id: profile.id,
            status: request.status,
            page: request.page,
        };
        let (bookings, total) = self
            .ports
            .bookings
            .list_for_party(&filter)
            .await
            .map_err(map_booking_error)?;

        let ids: Vec<BookingId> = bookings.iter().map(|booking| booking.id).collect();
        let mut slots_by_booking: HashMap<BookingId, Vec<BookingSlot>> = HashMap::new();
        if !ids.is_empty() {
            for slot in self
                .ports
                .bookings
                .list_slots_for(&ids)
                .await
                .map_err(map_booking_error)?
            {
                slots_by_booking.entry(slot.booking_id).or_default().push(slot);
            }
        }

        let mut dates_by_talent: HashMap<ProfileId, BTreeSet<NaiveDate>> = HashMap::new();
        for booking in &bookings {
            let dates = dates_by_talent.entry(booking.talent_id).or_default();
            if let Some(slots) = slots_by_booking.get(&booking.id) {
                dates.extend(slots.iter().map(|slot| slot.date));
            }
        }
        let mut availability_by_talent = HashMap::new();
        for (talent_id, dates) in dates_by_talent {
            let dates: Vec<NaiveDate> = dates.into_iter().collect();
            let entries = self.availability_for(&talent_id, &dates).await?;
            availability_by_talent.insert(talent_id, entries);
        }

        let views = bookings
            .into_iter()
            .map(|booking| {
                let slots = slots_by_booking.remove(&booking.id).unwrap_or_default();
                let availability = availability_by_talent
                    .get(&booking.talent_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                Self::view_of(booking, &slots, availability)
            })
            .collect();
        Ok(Page::new(views, total, request.page))
    }

    async fn busy_slots(&self, request: BusySlotsRequest) -> Result<Vec<SlotGroup>, Error> {
        if let (Some(from), Some(to)) = (request.from, request.to) {
            if from > to {
                return Err(Error::invalid_request("from must not be after to")
                    .with_details(json!({ "field": "from", "code": "invalid_range" })));
            }
        }
        self.ports
            .profiles
            .find_by_id(&request.talent_id)
            .await
            .map_err(map_profile_error)?
            .filter(|profile| profile.role == PartyRole::Talent)
            .ok_or_else(|| Error::not_found(format!("talent {} not found", request.talent_id)))?;

        let slots = self
            .ports
            .bookings
            .list_active_slots_for_talent(&request.talent_id, request.from, request.to)
            .await
            .map_err(map_booking_error)?;
        Ok(group_and_merge(&slots))
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;

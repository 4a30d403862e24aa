//! In-memory implementations of the persistence ports.
//!
//! [`InMemoryMarketplace`] holds profiles, bookings, the slot ledger and
//! reschedule proposals behind one mutex so multi-row operations (booking
//! creation, reschedule approval) stay atomic, like their transactional
//! PostgreSQL counterparts.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, BookingListFilter, BookingRepository,
    BookingRepositoryError, CreatedBooking, ProfileRepository, ProfileRepositoryError,
    RescheduleRepository, RescheduleRepositoryError, ReviewLookup, ReviewLookupError,
    SettlementOutcome,
};
use crate::domain::{
    AvailabilityEntry, Booking, BookingId, BookingSlot, BookingStatus, CheckoutAttachment,
    NewBooking, PartyRole, PaymentDetails, PaymentOutcome, PaymentSettlement, PaymentStatus,
    Profile, ProfileId, Reschedule, RescheduleDecision, RescheduleId, RescheduleProposal,
    RescheduleStatus, SlotId, SlotRequest, UserId, find_conflicts, overlaps_booked,
};

#[derive(Default)]
struct State {
    profiles: Vec<Profile>,
    bookings: HashMap<BookingId, Booking>,
    slots: Vec<BookingSlot>,
    availability: HashMap<ProfileId, Vec<AvailabilityEntry>>,
    reviewed: HashSet<BookingId>,
    reschedules: Vec<Reschedule>,
}

impl State {
    fn slots_of(&self, id: &BookingId) -> Vec<BookingSlot> {
        let mut slots: Vec<BookingSlot> = self
            .slots
            .iter()
            .filter(|slot| slot.booking_id == *id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        slots
    }

    fn active_slots_of_talent(&self, talent_id: &ProfileId) -> impl Iterator<Item = &BookingSlot> {
        self.slots.iter().filter(move |slot| {
            self.bookings.get(&slot.booking_id).is_some_and(|booking| {
                booking.talent_id == *talent_id && booking.status.is_active()
            })
        })
    }

    fn slot_taken(&self, booking_id: BookingId, date: NaiveDate, time: &str) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.booking_id == booking_id && slot.matches(date, time))
    }
}

/// Shared in-memory store implementing every persistence port.
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: Mutex<State>,
}

impl InMemoryMarketplace {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a profile.
    pub fn add_profile(&self, profile: Profile) {
        self.lock().profiles.push(profile);
    }

    /// Publish priced availability for a talent.
    pub fn add_availability(&self, talent_id: ProfileId, entries: Vec<AvailabilityEntry>) {
        self.lock()
            .availability
            .entry(talent_id)
            .or_default()
            .extend(entries);
    }

    /// Record that the booking has been reviewed.
    pub fn mark_reviewed(&self, booking_id: BookingId) {
        self.lock().reviewed.insert(booking_id);
    }

    /// Insert a booking and its slot rows directly, bypassing conflict checks.
    pub fn seed_booking(&self, booking: Booking, slots: Vec<BookingSlot>) {
        let mut state = self.lock();
        state.slots.extend(slots);
        state.bookings.insert(booking.id, booking);
    }

    /// Current copy of a booking.
    pub fn booking(&self, id: &BookingId) -> Option<Booking> {
        self.lock().bookings.get(id).cloned()
    }

    /// Slot rows of a booking ordered by date and time.
    pub fn slots(&self, id: &BookingId) -> Vec<BookingSlot> {
        self.lock().slots_of(id)
    }

    /// Every proposal stored for a booking, oldest first.
    pub fn reschedules(&self, booking_id: &BookingId) -> Vec<Reschedule> {
        self.lock()
            .reschedules
            .iter()
            .filter(|reschedule| reschedule.booking_id == *booking_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryMarketplace {
    async fn find_by_user(
        &self,
        user_id: &UserId,
        role: PartyRole,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|profile| profile.user_id == *user_id && profile.role == role)
            .cloned())
    }

    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|profile| profile.id == *id)
            .cloned())
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryMarketplace {
    async fn list_for_talent(
        &self,
        talent_id: &ProfileId,
        dates: &[NaiveDate],
    ) -> Result<Vec<AvailabilityEntry>, AvailabilityRepositoryError> {
        Ok(self
            .lock()
            .availability
            .get(talent_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| dates.contains(&entry.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReviewLookup for InMemoryMarketplace {
    async fn has_review(&self, booking_id: &BookingId) -> Result<bool, ReviewLookupError> {
        Ok(self.lock().reviewed.contains(booking_id))
    }
}

#[async_trait]
impl BookingRepository for InMemoryMarketplace {
    async fn create_with_slots(
        &self,
        booking: &NewBooking,
        slots: &[SlotRequest],
    ) -> Result<CreatedBooking, BookingRepositoryError> {
        let mut state = self.lock();
        let dates: BTreeSet<NaiveDate> = slots.iter().map(|slot| slot.date).collect();
        let booked: Vec<BookingSlot> = state
            .active_slots_of_talent(&booking.talent_id)
            .filter(|slot| dates.contains(&slot.date))
            .cloned()
            .collect();
        let conflicts = find_conflicts(slots, &booked);
        if !conflicts.is_empty() {
            return Err(BookingRepositoryError::slots_booked(conflicts));
        }

        let created = Booking {
            id: booking.id,
            client_id: booking.client_id,
            talent_id: booking.talent_id,
            note: booking.note.clone(),
            status: BookingStatus::Pending,
            skill_id: booking.skill_id,
            created_at: booking.created_at,
            updated_at: booking.created_at,
            payment: PaymentDetails::default(),
        };
        let rows: Vec<BookingSlot> = slots
            .iter()
            .map(|slot| BookingSlot {
                id: SlotId::random(),
                booking_id: booking.id,
                date: slot.date,
                time: slot.time.to_string(),
            })
            .collect();
        state.bookings.insert(created.id, created.clone());
        state.slots.extend(rows.iter().cloned());
        Ok(CreatedBooking {
            booking: created,
            slots: rows,
        })
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(self.lock().bookings.get(id).cloned())
    }

    async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(self
            .lock()
            .bookings
            .values()
            .find(|booking| booking.payment.checkout_id.as_deref() == Some(checkout_id))
            .cloned())
    }

    async fn list_slots(&self, id: &BookingId) -> Result<Vec<BookingSlot>, BookingRepositoryError> {
        Ok(self.lock().slots_of(id))
    }

    async fn list_slots_for(
        &self,
        ids: &[BookingId],
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError> {
        let state = self.lock();
        Ok(ids.iter().flat_map(|id| state.slots_of(id)).collect())
    }

    async fn update_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut state = self.lock();
        Ok(state.bookings.get_mut(id).map(|booking| {
            booking.status = status;
            booking.updated_at = at;
            booking.clone()
        }))
    }

    async fn list_for_party(
        &self,
        filter: &BookingListFilter,
    ) -> Result<(Vec<Booking>, u64), BookingRepositoryError> {
        let state = self.lock();
        let mut matches: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|booking| booking.is_party(filter.role, filter.profile_id))
            .filter(|booking| filter.status.is_none_or(|status| booking.status == status))
            .collect();
        matches.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let total = u64::try_from(matches.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(filter.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.page.limit()).unwrap_or(usize::MAX);
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn list_active_slots_for_talent(
        &self,
        talent_id: &ProfileId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError> {
        let state = self.lock();
        let mut slots: Vec<BookingSlot> = state
            .active_slots_of_talent(talent_id)
            .filter(|slot| from.is_none_or(|from| slot.date >= from))
            .filter(|slot| to.is_none_or(|to| slot.date <= to))
            .cloned()
            .collect();
        slots.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        Ok(slots)
    }

    async fn attach_checkout(
        &self,
        id: &BookingId,
        checkout: &CheckoutAttachment,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut state = self.lock();
        let Some(booking) = state.bookings.get_mut(id) else {
            return Ok(None);
        };
        if booking.payment.status == PaymentStatus::Paid {
            return Ok(None);
        }
        booking.payment.merchant_transaction_id = Some(checkout.merchant_transaction_id.clone());
        booking.payment.checkout_id = Some(checkout.checkout_id.clone());
        booking.payment.amount = Some(checkout.amount);
        booking.payment.currency = Some(checkout.currency.clone());
        booking.payment.status = PaymentStatus::Pending;
        booking.updated_at = checkout.attached_at;
        Ok(Some(booking.clone()))
    }

    async fn settle_payment(
        &self,
        id: &BookingId,
        settlement: &PaymentSettlement,
    ) -> Result<Option<SettlementOutcome>, BookingRepositoryError> {
        let mut state = self.lock();
        let Some(booking) = state.bookings.get_mut(id) else {
            return Ok(None);
        };
        if booking.payment.status == PaymentStatus::Paid
            || booking.payment.checkout_id.as_deref() != Some(settlement.checkout_id.as_str())
        {
            return Ok(Some(SettlementOutcome {
                booking: booking.clone(),
                changed: false,
            }));
        }
        match settlement.outcome {
            PaymentOutcome::Paid => {
                booking.payment.status = PaymentStatus::Paid;
                booking.status = BookingStatus::IsPaid;
            }
            PaymentOutcome::Failed => {
                booking.payment.status = PaymentStatus::Failed;
                booking.payment.checkout_id = None;
            }
        }
        booking.payment.result = Some(settlement.result.clone());
        booking.updated_at = settlement.settled_at;
        Ok(Some(SettlementOutcome {
            booking: booking.clone(),
            changed: true,
        }))
    }
}

#[async_trait]
impl RescheduleRepository for InMemoryMarketplace {
    async fn propose(
        &self,
        proposal: &RescheduleProposal,
    ) -> Result<Reschedule, RescheduleRepositoryError> {
        let mut state = self.lock();
        let latest = state
            .reschedules
            .iter_mut()
            .filter(|r| {
                r.booking_id == proposal.booking_id
                    && r.requested_by_role == proposal.requested_by_role
            })
            .max_by_key(|r| r.created_at);

        match latest {
            Some(existing) if existing.status == RescheduleStatus::Pending => Err(
                RescheduleRepositoryError::already_pending(format!("reschedule {}", existing.id)),
            ),
            Some(existing) if existing.status == RescheduleStatus::Rejected => {
                existing.old_date = proposal.old_date;
                existing.old_time.clone_from(&proposal.old_time);
                existing.new_date = proposal.new_date;
                existing.new_time.clone_from(&proposal.new_time);
                existing.status = RescheduleStatus::Pending;
                existing.remarks = None;
                existing.decided_by = None;
                existing.updated_at = proposal.proposed_at;
                Ok(existing.clone())
            }
            _ => {
                let inserted = Reschedule {
                    id: RescheduleId::random(),
                    booking_id: proposal.booking_id,
                    requested_by_role: proposal.requested_by_role,
                    requested_by: proposal.requested_by,
                    old_date: proposal.old_date,
                    old_time: proposal.old_time.clone(),
                    new_date: proposal.new_date,
                    new_time: proposal.new_time.clone(),
                    status: RescheduleStatus::Pending,
                    remarks: None,
                    decided_by: None,
                    created_at: proposal.proposed_at,
                    updated_at: proposal.proposed_at,
                };
                state.reschedules.push(inserted.clone());
                Ok(inserted)
            }
        }
    }

    async fn find_by_id(
        &self,
        id: &RescheduleId,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        Ok(self.lock().reschedules.iter().find(|r| r.id == *id).cloned())
    }

    async fn latest_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        // Later entries win ties, matching insertion order.
        Ok(self
            .lock()
            .reschedules
            .iter()
            .filter(|r| r.booking_id == *booking_id)
            .max_by_key(|r| (r.updated_at, r.created_at))
            .cloned())
    }

    async fn approve(
        &self,
        id: &RescheduleId,
        decision: &RescheduleDecision,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        let mut state = self.lock();
        let Some(target) = state
            .reschedules
            .iter()
            .find(|r| r.id == *id && r.is_pending())
            .cloned()
        else {
            return Ok(None);
        };
        if state.slot_taken(target.booking_id, target.new_date, &target.new_time) {
            return Err(RescheduleRepositoryError::slot_taken(format!(
                "{} {}",
                target.new_date, target.new_time
            )));
        }
        let talent_id = state
            .bookings
            .get(&target.booking_id)
            .map(|booking| booking.talent_id);
        if let Some(talent_id) = talent_id {
            let others: Vec<BookingSlot> = state
                .active_slots_of_talent(&talent_id)
                .filter(|slot| slot.date == target.new_date)
                .filter(|slot| {
                    !(slot.booking_id == target.booking_id
                        && slot.matches(target.old_date, &target.old_time))
                })
                .cloned()
                .collect();
            if overlaps_booked(target.new_date, &target.new_time, &others) {
                return Err(RescheduleRepositoryError::slot_booked(
                    target.new_date,
                    target.new_time,
                ));
            }
        }

        for slot in state
            .slots
            .iter_mut()
            .filter(|slot| slot.booking_id == target.booking_id)
            .filter(|slot| slot.matches(target.old_date, &target.old_time))
        {
            slot.date = target.new_date;
            slot.time.clone_from(&target.new_time);
        }

        Ok(state
            .reschedules
            .iter_mut()
            .find(|r| r.id == target.id)
            .map(|accepted| {
                accepted.status = RescheduleStatus::Accepted;
                accepted.remarks.clone_from(&decision.remarks);
                accepted.decided_by = Some(decision.decided_by);
                accepted.updated_at = decision.decided_at;
                accepted.clone()
            }))
    }

    async fn reject(
        &self,
        id: &RescheduleId,
        decision: &RescheduleDecision,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        let mut state = self.lock();
        Ok(state
            .reschedules
            .iter_mut()
            .find(|r| r.id == *id && r.is_pending())
            .map(|rejected| {
                rejected.status = RescheduleStatus::Rejected;
                rejected.remarks.clone_from(&decision.remarks);
                rejected.decided_by = Some(decision.decided_by);
                rejected.updated_at = decision.decided_at;
                rejected.clone()
            }))
    }
}

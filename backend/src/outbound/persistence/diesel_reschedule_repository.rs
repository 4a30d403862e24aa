//! PostgreSQL-backed `RescheduleRepository` implementation using Diesel ORM.
//!
//! Proposals are created or revived under a row lock on the requester's
//! latest proposal. Decisions are conditional on the row still being
//! pending; approval takes the talent's calendar lock, re-checks the new
//! slot against the talent's active bookings and rewrites the ledger slot in
//! the same transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{RescheduleRepository, RescheduleRepositoryError};
use crate::domain::{
    BookingId, BookingSlot, PartyRole, ProfileId, Reschedule, RescheduleDecision, RescheduleId,
    RescheduleProposal, RescheduleStatus, UnknownPartyRole, overlaps_booked,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::diesel_booking_repository::{active_talent_slots, lock_talent_calendar};
use super::models::{
    NewRescheduleRow, RescheduleDecisionUpdate, RescheduleRevival, RescheduleRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{booking_reschedules, booking_slots, bookings};

/// Diesel-backed implementation of the reschedule repository port.
#[derive(Clone)]
pub struct DieselRescheduleRepository {
    pool: DbPool,
}

impl DieselRescheduleRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RescheduleRepositoryError {
    map_basic_pool_error(error, RescheduleRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> RescheduleRepositoryError {
    map_basic_diesel_error(
        error,
        RescheduleRepositoryError::query,
        RescheduleRepositoryError::connection,
    )
}

/// Failure inside the propose transaction.
enum ProposeError {
    Diesel(diesel::result::Error),
    AlreadyPending,
}

impl From<diesel::result::Error> for ProposeError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_propose_error(error: ProposeError) -> RescheduleRepositoryError {
    match error {
        ProposeError::AlreadyPending => {
            RescheduleRepositoryError::already_pending("latest proposal is still pending")
        }
        ProposeError::Diesel(error) => match unique_violation(&error) {
            Some(constraint) => RescheduleRepositoryError::already_pending(constraint),
            None => map_diesel_error(error),
        },
    }
}

/// Failure inside the approve transaction; every variant rolls it back.
enum ApproveError {
    Diesel(diesel::result::Error),
    Taken { date: NaiveDate, time: String },
    Booked { date: NaiveDate, time: String },
}

impl From<diesel::result::Error> for ApproveError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_approve_error(error: ApproveError) -> RescheduleRepositoryError {
    match error {
        ApproveError::Taken { date, time } => {
            RescheduleRepositoryError::slot_taken(format!("{date} {time}"))
        }
        ApproveError::Booked { date, time } => RescheduleRepositoryError::slot_booked(date, time),
        ApproveError::Diesel(error) => match unique_violation(&error) {
            Some(constraint) => RescheduleRepositoryError::slot_taken(constraint),
            None => map_diesel_error(error),
        },
    }
}

/// Reject a move onto the booking's own rows or onto time another active
/// booking of the talent holds. The row being moved is ignored.
fn check_calendar(
    accepted: &RescheduleRow,
    calendar: Vec<BookingSlot>,
) -> Result<(), ApproveError> {
    let booking_id = BookingId::from_uuid(accepted.booking_id);
    let others: Vec<BookingSlot> = calendar
        .into_iter()
        .filter(|slot| {
            !(slot.booking_id == booking_id && slot.matches(accepted.old_date, &accepted.old_time))
        })
        .collect();
    let (date, time) = (accepted.new_date, accepted.new_time.clone());
    if others
        .iter()
        .any(|slot| slot.booking_id == booking_id && slot.matches(date, &time))
    {
        return Err(ApproveError::Taken { date, time });
    }
    if overlaps_booked(date, &time, &others) {
        return Err(ApproveError::Booked { date, time });
    }
    Ok(())
}

/// Convert a database row into a domain reschedule.
fn row_to_reschedule(row: RescheduleRow) -> Result<Reschedule, RescheduleRepositoryError> {
    let RescheduleRow {
        id,
        booking_id,
        requested_by_role,
        requested_by,
        old_date,
        old_time,
        new_date,
        new_time,
        status,
        remarks,
        decided_by,
        created_at,
        updated_at,
    } = row;

    let requested_by_role: PartyRole = requested_by_role
        .parse()
        .map_err(|err: UnknownPartyRole| RescheduleRepositoryError::query(err.to_string()))?;
    let status: RescheduleStatus = status.parse().map_err(RescheduleRepositoryError::query)?;

    Ok(Reschedule {
        id: RescheduleId::from_uuid(id),
        booking_id: BookingId::from_uuid(booking_id),
        requested_by_role,
        requested_by: ProfileId::from_uuid(requested_by),
        old_date,
        old_time,
        new_date,
        new_time,
        status,
        remarks,
        decided_by: decided_by.map(ProfileId::from_uuid),
        created_at,
        updated_at,
    })
}

#[async_trait]
impl RescheduleRepository for DieselRescheduleRepository {
    async fn propose(
        &self,
        proposal: &RescheduleProposal,
    ) -> Result<Reschedule, RescheduleRepositoryError> {
        let booking_id = *proposal.booking_id.as_uuid();
        let role = proposal.requested_by_role.as_str();
        let pending = RescheduleStatus::Pending.as_str();
        let new_row = NewRescheduleRow {
            id: Uuid::new_v4(),
            booking_id,
            requested_by_role: role,
            requested_by: *proposal.requested_by.as_uuid(),
            old_date: proposal.old_date,
            old_time: &proposal.old_time,
            new_date: proposal.new_date,
            new_time: &proposal.new_time,
            status: pending,
            created_at: proposal.proposed_at,
            updated_at: proposal.proposed_at,
        };
        let revival = RescheduleRevival {
            old_date: proposal.old_date,
            old_time: &proposal.old_time,
            new_date: proposal.new_date,
            new_time: &proposal.new_time,
            status: pending,
            remarks: None,
            decided_by: None,
            updated_at: proposal.proposed_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction::<_, ProposeError, _>(|conn| {
                async move {
                    let latest: Option<RescheduleRow> = booking_reschedules::table
                        .filter(booking_reschedules::booking_id.eq(booking_id))
                        .filter(booking_reschedules::requested_by_role.eq(role))
                        .order(booking_reschedules::created_at.desc())
                        .select(RescheduleRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;

                    match latest {
                        Some(row) if row.status == pending => Err(ProposeError::AlreadyPending),
                        Some(row) if row.status == RescheduleStatus::Rejected.as_str() => {
                            let revived = diesel::update(booking_reschedules::table.find(row.id))
                                .set(&revival)
                                .returning(RescheduleRow::as_returning())
                                .get_result(conn)
                                .await?;
                            Ok(revived)
                        }
                        _ => {
                            let inserted = diesel::insert_into(booking_reschedules::table)
                                .values(&new_row)
                                .returning(RescheduleRow::as_returning())
                                .get_result(conn)
                                .await?;
                            Ok(inserted)
                        }
                    }
                }
                .scope_boxed()
            })
            .await
            .map_err(map_propose_error)?;

        row_to_reschedule(row)
    }

    async fn find_by_id(
        &self,
        id: &RescheduleId,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        booking_reschedules::table
            .find(id.as_uuid())
            .select(RescheduleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_reschedule)
            .transpose()
    }

    async fn latest_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        booking_reschedules::table
            .filter(booking_reschedules::booking_id.eq(booking_id.as_uuid()))
            .order((
                booking_reschedules::updated_at.desc(),
                booking_reschedules::created_at.desc(),
            ))
            .select(RescheduleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_reschedule)
            .transpose()
    }

    async fn approve(
        &self,
        id: &RescheduleId,
        decision: &RescheduleDecision,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        let reschedule_id = *id.as_uuid();
        let changes = RescheduleDecisionUpdate {
            status: RescheduleStatus::Accepted.as_str(),
            remarks: decision.remarks.as_deref(),
            decided_by: Some(*decision.decided_by.as_uuid()),
            updated_at: decision.decided_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction::<_, ApproveError, _>(|conn| {
                async move {
                    let accepted: Option<RescheduleRow> = diesel::update(
                        booking_reschedules::table.find(reschedule_id).filter(
                            booking_reschedules::status.eq(RescheduleStatus::Pending.as_str()),
                        ),
                    )
                    .set(&changes)
                    .returning(RescheduleRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some(accepted) = accepted else {
                        return Ok(None);
                    };

                    let talent_id: Uuid = bookings::table
                        .find(accepted.booking_id)
                        .select(bookings::talent_id)
                        .first(conn)
                        .await?;
                    lock_talent_calendar(conn, talent_id).await?;
                    let calendar =
                        active_talent_slots(conn, talent_id, vec![accepted.new_date]).await?;
                    check_calendar(&accepted, calendar)?;

                    let moved = diesel::update(
                        booking_slots::table
                            .filter(booking_slots::booking_id.eq(accepted.booking_id))
                            .filter(booking_slots::slot_date.eq(accepted.old_date))
                            .filter(booking_slots::slot_time.eq(&accepted.old_time)),
                    )
                    .set((
                        booking_slots::slot_date.eq(accepted.new_date),
                        booking_slots::slot_time.eq(&accepted.new_time),
                    ))
                    .execute(conn)
                    .await?;
                    if moved == 0 {
                        warn!(
                            reschedule_id = %accepted.id,
                            booking_id = %accepted.booking_id,
                            "approved reschedule matched no ledger slot"
                        );
                    }
                    Ok(Some(accepted))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_approve_error)?;

        row.map(row_to_reschedule).transpose()
    }

    async fn reject(
        &self,
        id: &RescheduleId,
        decision: &RescheduleDecision,
    ) -> Result<Option<Reschedule>, RescheduleRepositoryError> {
        let changes = RescheduleDecisionUpdate {
            status: RescheduleStatus::Rejected.as_str(),
            remarks: decision.remarks.as_deref(),
            decided_by: Some(*decision.decided_by.as_uuid()),
            updated_at: decision.decided_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            booking_reschedules::table
                .find(id.as_uuid())
                .filter(booking_reschedules::status.eq(RescheduleStatus::Pending.as_str())),
        )
        .set(&changes)
        .returning(RescheduleRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?
        .map(row_to_reschedule)
        .transpose()
    }
}

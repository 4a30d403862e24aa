//! PostgreSQL-backed `BookingRepository` implementation using Diesel ORM.
//!
//! Booking creation serialises per talent with a transaction-scoped advisory
//! lock so the overlap check and the slot inserts observe a stable calendar.
//! Reschedule approval takes the same lock through [`lock_talent_calendar`].
//! Payment settlement is a conditional update that never touches a row whose
//! payment is already `paid`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    BookingListFilter, BookingRepository, BookingRepositoryError, CreatedBooking,
    SettlementOutcome,
};
use crate::domain::{
    Booking, BookingId, BookingSlot, BookingStatus, CheckoutAttachment, Money, NewBooking,
    PartyRole, PaymentDetails, PaymentOutcome, PaymentSettlement, PaymentStatus, ProfileId,
    SkillId, SlotId, SlotRequest, UnknownBookingStatus, find_conflicts,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{BookingRow, BookingSlotRow, CheckoutUpdate, NewBookingRow, NewBookingSlotRow};
use super::pool::{DbPool, PoolError};
use super::schema::{booking_slots, bookings};

/// Serialises calendar writes for one talent until the transaction ends.
const TALENT_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

/// Diesel-backed implementation of the booking repository port.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BookingRepositoryError {
    map_basic_pool_error(error, BookingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BookingRepositoryError {
    if let Some(constraint) = unique_violation(&error) {
        return BookingRepositoryError::slot_taken(constraint);
    }
    map_basic_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

/// Failure inside the create transaction.
enum CreateError {
    Diesel(diesel::result::Error),
    Booked(Vec<SlotRequest>),
}

impl From<diesel::result::Error> for CreateError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_create_error(error: CreateError) -> BookingRepositoryError {
    match error {
        CreateError::Diesel(error) => map_diesel_error(error),
        CreateError::Booked(slots) => BookingRepositoryError::slots_booked(slots),
    }
}

fn inactive_statuses() -> Vec<&'static str> {
    BookingStatus::INACTIVE
        .iter()
        .map(|status| status.as_str())
        .collect()
}

fn money(value: i64, column: &str) -> Result<Money, BookingRepositoryError> {
    Money::from_minor_units(value)
        .ok_or_else(|| BookingRepositoryError::query(format!("negative {column} in database")))
}

/// Convert a database row into a domain booking.
fn row_to_booking(row: BookingRow) -> Result<Booking, BookingRepositoryError> {
    let BookingRow {
        id,
        client_id,
        talent_id,
        note,
        status,
        skill_id,
        merchant_transaction_id,
        checkout_id,
        amount_minor,
        currency,
        payment_status,
        payment_result,
        created_at,
        updated_at,
    } = row;

    let status: BookingStatus = status
        .parse()
        .map_err(|err: UnknownBookingStatus| BookingRepositoryError::query(err.to_string()))?;
    let payment_status: PaymentStatus = payment_status
        .parse()
        .map_err(BookingRepositoryError::query)?;
    let amount = amount_minor
        .map(|value| money(value, "amount_minor"))
        .transpose()?;

    Ok(Booking {
        id: BookingId::from_uuid(id),
        client_id: ProfileId::from_uuid(client_id),
        talent_id: ProfileId::from_uuid(talent_id),
        note,
        status,
        skill_id: skill_id.map(SkillId::from_uuid),
        created_at,
        updated_at,
        payment: PaymentDetails {
            merchant_transaction_id,
            checkout_id,
            amount,
            currency,
            status: payment_status,
            result: payment_result,
        },
    })
}

fn row_to_slot(row: BookingSlotRow) -> BookingSlot {
    BookingSlot {
        id: SlotId::from_uuid(row.id),
        booking_id: BookingId::from_uuid(row.booking_id),
        date: row.slot_date,
        time: row.slot_time,
    }
}

/// Take the talent's calendar lock for the rest of the transaction.
pub(super) async fn lock_talent_calendar(
    conn: &mut AsyncPgConnection,
    talent_id: Uuid,
) -> QueryResult<()> {
    sql_query(TALENT_LOCK_SQL)
        .bind::<Text, _>(talent_id.to_string())
        .execute(conn)
        .await
        .map(|_| ())
}

/// Slots of the talent's active bookings on the given dates.
pub(super) async fn active_talent_slots(
    conn: &mut AsyncPgConnection,
    talent_id: Uuid,
    dates: Vec<NaiveDate>,
) -> QueryResult<Vec<BookingSlot>> {
    let rows: Vec<BookingSlotRow> = booking_slots::table
        .inner_join(bookings::table)
        .filter(bookings::talent_id.eq(talent_id))
        .filter(bookings::status.ne_all(inactive_statuses()))
        .filter(booking_slots::slot_date.eq_any(dates))
        .select(BookingSlotRow::as_select())
        .load(conn)
        .await?;
    Ok(rows.into_iter().map(row_to_slot).collect())
}

fn party_filter(filter: &BookingListFilter) -> bookings::BoxedQuery<'static, Pg> {
    let profile_id = *filter.profile_id.as_uuid();
    let mut query = match filter.role {
        PartyRole::Client => bookings::table
            .filter(bookings::client_id.eq(profile_id))
            .into_boxed(),
        PartyRole::Talent => bookings::table
            .filter(bookings::talent_id.eq(profile_id))
            .into_boxed(),
    };
    if let Some(status) = filter.status {
        query = query.filter(bookings::status.eq(status.as_str()));
    }
    query
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn create_with_slots(
        &self,
        booking: &NewBooking,
        slots: &[SlotRequest],
    ) -> Result<CreatedBooking, BookingRepositoryError> {
        let talent_id = *booking.talent_id.as_uuid();
        let dates: Vec<NaiveDate> = slots
            .iter()
            .map(|slot| slot.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let new_row = NewBookingRow {
            id: *booking.id.as_uuid(),
            client_id: *booking.client_id.as_uuid(),
            talent_id,
            note: booking.note.as_deref(),
            status: BookingStatus::Pending.as_str(),
            skill_id: booking.skill_id.map(|id| *id.as_uuid()),
            created_at: booking.created_at,
            updated_at: booking.created_at,
        };
        let slot_rows: Vec<NewBookingSlotRow> = slots
            .iter()
            .map(|slot| NewBookingSlotRow {
                id: Uuid::new_v4(),
                booking_id: new_row.id,
                slot_date: slot.date,
                slot_time: slot.time.to_string(),
            })
            .collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (booking_row, inserted) = conn
            .transaction::<_, CreateError, _>(|conn| {
                async move {
                    lock_talent_calendar(conn, talent_id).await?;
                    let booked = active_talent_slots(conn, talent_id, dates).await?;
                    let conflicts = find_conflicts(slots, &booked);
                    if !conflicts.is_empty() {
                        return Err(CreateError::Booked(conflicts));
                    }

                    let booking_row = diesel::insert_into(bookings::table)
                        .values(&new_row)
                        .returning(BookingRow::as_returning())
                        .get_result(conn)
                        .await?;
                    let inserted: Vec<BookingSlotRow> = diesel::insert_into(booking_slots::table)
                        .values(&slot_rows)
                        .returning(BookingSlotRow::as_returning())
                        .get_results(conn)
                        .await?;
                    Ok((booking_row, inserted))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_create_error)?;

        Ok(CreatedBooking {
            booking: row_to_booking(booking_row)?,
            slots: inserted.into_iter().map(row_to_slot).collect(),
        })
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        bookings::table
            .find(id.as_uuid())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_booking)
            .transpose()
    }

    async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        bookings::table
            .filter(bookings::checkout_id.eq(checkout_id))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_booking)
            .transpose()
    }

    async fn list_slots(
        &self,
        booking_id: &BookingId,
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookingSlotRow> = booking_slots::table
            .filter(booking_slots::booking_id.eq(booking_id.as_uuid()))
            .order((booking_slots::slot_date.asc(), booking_slots::created_at.asc()))
            .select(BookingSlotRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_slot).collect())
    }

    async fn list_slots_for(
        &self,
        booking_ids: &[BookingId],
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError> {
        let ids: Vec<Uuid> = booking_ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookingSlotRow> = booking_slots::table
            .filter(booking_slots::booking_id.eq_any(ids))
            .order((booking_slots::slot_date.asc(), booking_slots::created_at.asc()))
            .select(BookingSlotRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_slot).collect())
    }

    async fn update_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(bookings::table.find(id.as_uuid()))
            .set((
                bookings::status.eq(status.as_str()),
                bookings::updated_at.eq(at),
            ))
            .returning(BookingRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_booking)
            .transpose()
    }

    async fn list_for_party(
        &self,
        filter: &BookingListFilter,
    ) -> Result<(Vec<Booking>, u64), BookingRepositoryError> {
        let limit = i64::from(filter.page.limit());
        let offset = i64::try_from(filter.page.offset())
            .map_err(|_| BookingRepositoryError::query("page offset out of range"))?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = party_filter(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<BookingRow> = party_filter(filter)
            .order((bookings::created_at.desc(), bookings::id.desc()))
            .limit(limit)
            .offset(offset)
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let bookings = rows
            .into_iter()
            .map(row_to_booking)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((bookings, u64::try_from(total).unwrap_or_default()))
    }

    async fn list_active_slots_for_talent(
        &self,
        talent_id: &ProfileId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BookingSlot>, BookingRepositoryError> {
        let mut query = booking_slots::table
            .inner_join(bookings::table)
            .filter(bookings::talent_id.eq(*talent_id.as_uuid()))
            .filter(bookings::status.ne_all(inactive_statuses()))
            .select(BookingSlotRow::as_select())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(booking_slots::slot_date.ge(from));
        }
        if let Some(to) = to {
            query = query.filter(booking_slots::slot_date.le(to));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookingSlotRow> = query
            .order((booking_slots::slot_date.asc(), booking_slots::slot_time.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_slot).collect())
    }

    async fn attach_checkout(
        &self,
        id: &BookingId,
        attachment: &CheckoutAttachment,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let changes = CheckoutUpdate {
            merchant_transaction_id: &attachment.merchant_transaction_id,
            checkout_id: &attachment.checkout_id,
            amount_minor: attachment.amount.minor_units(),
            currency: &attachment.currency,
            payment_status: PaymentStatus::Pending.as_str(),
            updated_at: attachment.attached_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            bookings::table
                .find(id.as_uuid())
                .filter(bookings::payment_status.ne(PaymentStatus::Paid.as_str())),
        )
        .set(&changes)
        .returning(BookingRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?
        .map(row_to_booking)
        .transpose()
    }

    async fn settle_payment(
        &self,
        id: &BookingId,
        settlement: &PaymentSettlement,
    ) -> Result<Option<SettlementOutcome>, BookingRepositoryError> {
        let unpaid = bookings::table
            .find(*id.as_uuid())
            .filter(bookings::payment_status.ne(PaymentStatus::Paid.as_str()))
            .filter(bookings::checkout_id.eq(&settlement.checkout_id));
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = match settlement.outcome {
            PaymentOutcome::Paid => diesel::update(unpaid)
                .set((
                    bookings::payment_status.eq(PaymentStatus::Paid.as_str()),
                    bookings::status.eq(BookingStatus::IsPaid.as_str()),
                    bookings::payment_result.eq(Some(&settlement.result)),
                    bookings::updated_at.eq(settlement.settled_at),
                ))
                .returning(BookingRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional(),
            PaymentOutcome::Failed => diesel::update(unpaid)
                .set((
                    bookings::payment_status.eq(PaymentStatus::Failed.as_str()),
                    bookings::checkout_id.eq(None::<String>),
                    bookings::payment_result.eq(Some(&settlement.result)),
                    bookings::updated_at.eq(settlement.settled_at),
                ))
                .returning(BookingRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional(),
        }
        .map_err(map_diesel_error)?;

        if let Some(row) = updated {
            return Ok(Some(SettlementOutcome {
                booking: row_to_booking(row)?,
                changed: true,
            }));
        }

        bookings::table
            .find(id.as_uuid())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(|row| {
                row_to_booking(row).map(|booking| SettlementOutcome {
                    booking,
                    changed: false,
                })
            })
            .transpose()
    }
}

//! PostgreSQL-backed availability and review lookups.
//!
//! Both tables are written by other services; this adapter only reads them.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, ReviewLookup, ReviewLookupError,
};
use crate::domain::{AvailabilityEntry, BookingId, Money, ProfileId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::AvailabilityRow;
use super::pool::DbPool;
use super::schema::{booking_reviews, talent_availability};

/// Diesel-backed implementation of the availability port.
#[derive(Clone)]
pub struct DieselAvailabilityRepository {
    pool: DbPool,
}

impl DieselAvailabilityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: AvailabilityRow) -> Result<AvailabilityEntry, AvailabilityRepositoryError> {
    let negative = || AvailabilityRepositoryError::query("negative price in database");
    Ok(AvailabilityEntry {
        date: row.available_date,
        slot: row.slot,
        price: Money::from_minor_units(row.price_minor).ok_or_else(negative)?,
        discount: row
            .discount_minor
            .map(|value| Money::from_minor_units(value).ok_or_else(negative))
            .transpose()?,
    })
}

#[async_trait]
impl AvailabilityRepository for DieselAvailabilityRepository {
    async fn list_for_talent(
        &self,
        talent_id: &ProfileId,
        dates: &[NaiveDate],
    ) -> Result<Vec<AvailabilityEntry>, AvailabilityRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, AvailabilityRepositoryError::connection))?;
        let rows: Vec<AvailabilityRow> = talent_availability::table
            .filter(talent_availability::talent_id.eq(talent_id.as_uuid()))
            .filter(talent_availability::available_date.eq_any(dates.to_vec()))
            .order((
                talent_availability::available_date.asc(),
                talent_availability::created_at.asc(),
            ))
            .select(AvailabilityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    AvailabilityRepositoryError::query,
                    AvailabilityRepositoryError::connection,
                )
            })?;
        rows.into_iter().map(row_to_entry).collect()
    }
}

/// Diesel-backed implementation of the review lookup port.
#[derive(Clone)]
pub struct DieselReviewLookup {
    pool: DbPool,
}

impl DieselReviewLookup {
    /// Create a new lookup with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewLookup for DieselReviewLookup {
    async fn has_review(&self, booking_id: &BookingId) -> Result<bool, ReviewLookupError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, ReviewLookupError::connection))?;
        diesel::select(diesel::dsl::exists(
            booking_reviews::table.filter(booking_reviews::booking_id.eq(booking_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(|err| {
            map_basic_diesel_error(
                err,
                ReviewLookupError::query,
                ReviewLookupError::connection,
            )
        })
    }
}

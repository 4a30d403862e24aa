//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    booking_reschedules, booking_slots, bookings, profiles, talent_availability,
};

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    pub push_player_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = talent_availability)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AvailabilityRow {
    pub available_date: NaiveDate,
    pub slot: String,
    pub price_minor: i64,
    pub discount_minor: Option<i64>,
}

// ---------------------------------------------------------------------------
// Bookings and the slot ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub talent_id: Uuid,
    pub note: Option<String>,
    pub status: String,
    pub skill_id: Option<Uuid>,
    pub merchant_transaction_id: Option<String>,
    pub checkout_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub payment_status: String,
    pub payment_result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub id: Uuid,
    pub client_id: Uuid,
    pub talent_id: Uuid,
    pub note: Option<&'a str>,
    pub status: &'a str,
    pub skill_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = bookings)]
pub(crate) struct CheckoutUpdate<'a> {
    pub merchant_transaction_id: &'a str,
    pub checkout_id: &'a str,
    pub amount_minor: i64,
    pub currency: &'a str,
    pub payment_status: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = booking_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingSlotRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_time: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booking_slots)]
pub(crate) struct NewBookingSlotRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_time: String,
}

// ---------------------------------------------------------------------------
// Reschedules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = booking_reschedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RescheduleRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub requested_by_role: String,
    pub requested_by: Uuid,
    pub old_date: NaiveDate,
    pub old_time: String,
    pub new_date: NaiveDate,
    pub new_time: String,
    pub status: String,
    pub remarks: Option<String>,
    pub decided_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booking_reschedules)]
pub(crate) struct NewRescheduleRow<'a> {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub requested_by_role: &'a str,
    pub requested_by: Uuid,
    pub old_date: NaiveDate,
    pub old_time: &'a str,
    pub new_date: NaiveDate,
    pub new_time: &'a str,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields rewritten when a rejected proposal is revived.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = booking_reschedules)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RescheduleRevival<'a> {
    pub old_date: NaiveDate,
    pub old_time: &'a str,
    pub new_date: NaiveDate,
    pub new_time: &'a str,
    pub status: &'a str,
    pub remarks: Option<&'a str>,
    pub decided_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = booking_reschedules)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RescheduleDecisionUpdate<'a> {
    pub status: &'a str,
    pub remarks: Option<&'a str>,
    pub decided_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

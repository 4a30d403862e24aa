//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Client and talent profiles, one per (user, role).
    profiles (id) {
        id -> Uuid,
        user_id -> Uuid,
        /// `client` or `talent`.
        role -> Text,
        first_name -> Text,
        last_name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        street -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        country -> Nullable<Text>,
        postcode -> Nullable<Text>,
        /// Push notification device id.
        push_player_id -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Priced calendar blocks published by talents.
    talent_availability (id) {
        id -> Uuid,
        talent_id -> Uuid,
        available_date -> Date,
        /// Comma-separated time blocks.
        slot -> Text,
        price_minor -> Int8,
        discount_minor -> Nullable<Int8>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Booking rows with their payment linkage.
    bookings (id) {
        id -> Uuid,
        client_id -> Uuid,
        talent_id -> Uuid,
        note -> Nullable<Text>,
        status -> Text,
        skill_id -> Nullable<Uuid>,
        merchant_transaction_id -> Nullable<Text>,
        checkout_id -> Nullable<Text>,
        amount_minor -> Nullable<Int8>,
        currency -> Nullable<Text>,
        payment_status -> Text,
        payment_result -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Slot ledger. Unique on `(booking_id, slot_date, slot_time)`.
    booking_slots (id) {
        id -> Uuid,
        booking_id -> Uuid,
        slot_date -> Date,
        slot_time -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reschedule proposals; at most one pending row per (booking, role).
    booking_reschedules (id) {
        id -> Uuid,
        booking_id -> Uuid,
        requested_by_role -> Text,
        requested_by -> Uuid,
        old_date -> Date,
        old_time -> Text,
        new_date -> Date,
        new_time -> Text,
        status -> Text,
        remarks -> Nullable<Text>,
        decided_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    booking_reviews (id) {
        id -> Uuid,
        booking_id -> Uuid,
        reviewer_id -> Uuid,
        rating -> Int2,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(talent_availability -> profiles (talent_id));
diesel::joinable!(booking_slots -> bookings (booking_id));
diesel::joinable!(booking_reschedules -> bookings (booking_id));
diesel::joinable!(booking_reviews -> bookings (booking_id));

diesel::allow_tables_to_appear_in_same_query!(
    profiles,
    talent_availability,
    bookings,
    booking_slots,
    booking_reschedules,
    booking_reviews,
);

//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one domain port over a shared [`DbPool`].
//! Diesel row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private to this module; adapters translate rows into domain types and map
//! Diesel failures onto the port's error enum.
//!
//! Cross-row invariants live in SQL: a per-talent advisory lock around slot
//! creation, the `(booking_id, slot_date, slot_time)` unique constraint, the
//! partial unique index on pending reschedules and the
//! `payment_status <> 'paid'` guard on settlement.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselBookingRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/bookings")).await?;
//! let bookings = DieselBookingRepository::new(pool.clone());
//! ```

mod diesel_availability_repository;
mod diesel_basic_error_mapping;
mod diesel_booking_repository;
mod diesel_profile_repository;
mod diesel_reschedule_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_availability_repository::{DieselAvailabilityRepository, DieselReviewLookup};
pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_reschedule_repository::DieselRescheduleRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

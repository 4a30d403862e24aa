//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every endpoint answers with the `{status, message, data}` envelope from
//! [`envelope`]; failures go through [`error`] so clients always see the same
//! shape and a `trace-id` header.

pub mod booking_dto;
pub mod bookings;
pub mod envelope;
pub mod error;
pub mod health;
pub mod payments;
pub mod reschedules;
pub mod schemas;
pub mod session;
pub mod state;
pub mod talents;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod validation;

#[cfg(test)]
mod handler_test_support;

pub use error::ApiResult;

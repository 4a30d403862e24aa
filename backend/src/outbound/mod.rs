//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM
//! - **hyperpay**: hosted checkout gateway over reqwest
//! - **notifier**: push dispatcher client and a logging stand-in
//!
//! Adapters translate between domain types and wire or row formats; they
//! carry no booking rules.

pub mod hyperpay;
pub mod notifier;
pub mod persistence;

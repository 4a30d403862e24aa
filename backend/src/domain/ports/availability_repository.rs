//! Port for reading a talent's priced availability.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{AvailabilityEntry, ProfileId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by availability adapters.
    pub enum AvailabilityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "availability repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "availability repository query failed: {message}",
    }
}

/// Read-only access to availability entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Entries of the talent on any of `dates`.
    async fn list_for_talent(
        &self,
        talent_id: &ProfileId,
        dates: &[NaiveDate],
    ) -> Result<Vec<AvailabilityEntry>, AvailabilityRepositoryError>;
}

/// Fixture implementation with no availability.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAvailabilityRepository;

#[async_trait]
impl AvailabilityRepository for FixtureAvailabilityRepository {
    async fn list_for_talent(
        &self,
        _talent_id: &ProfileId,
        _dates: &[NaiveDate],
    ) -> Result<Vec<AvailabilityEntry>, AvailabilityRepositoryError> {
        Ok(Vec::new())
    }
}

//! Port for resolving client and talent profiles.

use async_trait::async_trait;

use crate::domain::{PartyRole, Profile, ProfileId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "profile repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "profile repository query failed: {message}",
    }
}

/// Read-only profile lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Profile of `user_id` on the given side, if registered.
    async fn find_by_user(
        &self,
        user_id: &UserId,
        role: PartyRole,
    ) -> Result<Option<Profile>, ProfileRepositoryError>;

    /// Profile by id.
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileRepositoryError>;
}

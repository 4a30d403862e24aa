//! PostgreSQL-backed `ProfileRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::{PartyRole, Profile, ProfileId, UnknownPartyRole, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::ProfileRow;
use super::pool::{DbPool, PoolError};
use super::schema::profiles;

/// Diesel-backed implementation of the profile repository port.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProfileRepositoryError {
    map_basic_pool_error(error, ProfileRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProfileRepositoryError {
    map_basic_diesel_error(
        error,
        ProfileRepositoryError::query,
        ProfileRepositoryError::connection,
    )
}

fn row_to_profile(row: ProfileRow) -> Result<Profile, ProfileRepositoryError> {
    let role: PartyRole = row
        .role
        .parse()
        .map_err(|err: UnknownPartyRole| ProfileRepositoryError::query(err.to_string()))?;
    Ok(Profile {
        id: ProfileId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        role,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        street: row.street,
        city: row.city,
        state: row.state,
        country: row.country,
        postcode: row.postcode,
        push_player_id: row.push_player_id,
    })
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
        role: PartyRole,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        profiles::table
            .filter(profiles::user_id.eq(user_id.as_uuid()))
            .filter(profiles::role.eq(role.as_str()))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_profile)
            .transpose()
    }

    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        profiles::table
            .find(id.as_uuid())
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_profile)
            .transpose()
    }
}

//! Client and talent profiles as seen by the booking core.
//!
//! Profiles are owned by profile management; this crate only reads them to
//! resolve ownership, billing details and push recipients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ProfileId, UserId};

/// Side of a booking an actor speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    /// The party requesting and paying for a service.
    #[serde(alias = "user")]
    Client,
    /// The party offering the service.
    #[serde(alias = "provider")]
    Talent,
}

impl PartyRole {
    /// Stable storage and wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Talent => "talent",
        }
    }

    /// The other side of the booking.
    pub const fn counterparty(self) -> Self {
        match self {
            Self::Client => Self::Talent,
            Self::Talent => Self::Client,
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown party role: {0}")]
pub struct UnknownPartyRole(pub String);

impl FromStr for PartyRole {
    type Err = UnknownPartyRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "client" | "user" => Ok(Self::Client),
            "talent" | "provider" => Ok(Self::Talent),
            other => Err(UnknownPartyRole(other.to_owned())),
        }
    }
}

/// Profile record used for ownership checks, billing and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub role: PartyRole,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    /// Push-capable device id; profiles without one receive no notifications.
    pub push_player_id: Option<String>,
}

impl Profile {
    /// `first last`, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Registered push id, ignoring blank values.
    pub fn player_id(&self) -> Option<&str> {
        self.push_player_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Public summary of the other party shown on booking details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Profile identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: ProfileId,
    /// Side of the booking the profile is on.
    pub role: PartyRole,
    /// Display name.
    pub name: String,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            name: profile.display_name(),
        }
    }
}

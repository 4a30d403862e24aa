//! Reschedule proposals layered on top of a booking.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingId, PartyRole, ProfileId, RescheduleId};

/// Reschedule proposal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RescheduleStatus {
    /// Stable storage and wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RescheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RescheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown reschedule status: {other}")),
        }
    }
}

/// Persisted proposal to move one slot of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
    pub id: RescheduleId,
    pub booking_id: BookingId,
    pub requested_by_role: PartyRole,
    pub requested_by: ProfileId,
    pub old_date: NaiveDate,
    pub old_time: String,
    pub new_date: NaiveDate,
    pub new_time: String,
    pub status: RescheduleStatus,
    pub remarks: Option<String>,
    pub decided_by: Option<ProfileId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reschedule {
    /// Whether the proposal still awaits a decision.
    pub fn is_pending(&self) -> bool {
        self.status == RescheduleStatus::Pending
    }
}

/// A new or revived proposal.
///
/// Persisting it either inserts a fresh row or, when the requester's latest
/// proposal for the booking was rejected, revives that row to pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleProposal {
    pub booking_id: BookingId,
    pub requested_by_role: PartyRole,
    pub requested_by: ProfileId,
    pub old_date: NaiveDate,
    pub old_time: String,
    pub new_date: NaiveDate,
    pub new_time: String,
    pub proposed_at: DateTime<Utc>,
}

/// Counter-party decision on a pending proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleDecision {
    pub decided_by: ProfileId,
    pub remarks: Option<String>,
    pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RescheduleStatus::Pending)]
    #[case(RescheduleStatus::Accepted)]
    #[case(RescheduleStatus::Rejected)]
    fn status_names_match_storage(#[case] status: RescheduleStatus) {
        assert_eq!(status.as_str().parse::<RescheduleStatus>(), Ok(status));
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        assert!("approved".parse::<RescheduleStatus>().is_err());
    }
}

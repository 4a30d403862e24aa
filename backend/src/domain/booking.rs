//! Booking aggregate and its lifecycle state machine.
//!
//! The lifecycle is table driven. [`TRANSITIONS`] lists which side may move a
//! booking from which states into each target, and two parallel lookups map a
//! persisted status onto its notification recipients and template.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{BookingId, Money, NotificationTemplate, PartyRole, ProfileId, SkillId};

/// Booking lifecycle states with their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    PaymentPending,
    Rejected,
    InProgress,
    Completed,
    ReviewPending,
    RequestedForRescheduleByUser,
    RequestedForRescheduleByTalent,
    TalentReviewPending,
    ClientReviewPending,
    CanceledByUser,
    CanceledByTalent,
    IsPaid,
    Confirm,
}

impl BookingStatus {
    /// Every state, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Pending,
        Self::Accepted,
        Self::PaymentPending,
        Self::Rejected,
        Self::InProgress,
        Self::Completed,
        Self::ReviewPending,
        Self::RequestedForRescheduleByUser,
        Self::RequestedForRescheduleByTalent,
        Self::TalentReviewPending,
        Self::ClientReviewPending,
        Self::CanceledByUser,
        Self::CanceledByTalent,
        Self::IsPaid,
        Self::Confirm,
    ];

    /// States that release the talent's calendar.
    pub const INACTIVE: [Self; 3] = [Self::Rejected, Self::CanceledByUser, Self::CanceledByTalent];

    /// Stable storage and wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::PaymentPending => "paymentPending",
            Self::Rejected => "rejected",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::ReviewPending => "reviewPending",
            Self::RequestedForRescheduleByUser => "requestedForRescheduleByUser",
            Self::RequestedForRescheduleByTalent => "requestedForRescheduleByTalent",
            Self::TalentReviewPending => "talentReviewPending",
            Self::ClientReviewPending => "clientReviewPending",
            Self::CanceledByUser => "canceledByUser",
            Self::CanceledByTalent => "canceledByTalent",
            Self::IsPaid => "isPaid",
            Self::Confirm => "confirm",
        }
    }

    /// Whether the booking still occupies its slots.
    pub fn is_active(self) -> bool {
        !Self::INACTIVE.contains(&self)
    }

    /// Parties notified when a booking enters this state.
    pub const fn recipients(self) -> Recipients {
        match self {
            Self::Pending
            | Self::IsPaid
            | Self::TalentReviewPending
            | Self::CanceledByUser
            | Self::RequestedForRescheduleByUser => Recipients::Talent,
            Self::Rejected
            | Self::PaymentPending
            | Self::ClientReviewPending
            | Self::CanceledByTalent
            | Self::RequestedForRescheduleByTalent => Recipients::Client,
            Self::Accepted
            | Self::InProgress
            | Self::Completed
            | Self::Confirm
            | Self::ReviewPending => Recipients::Both,
        }
    }

    /// Template announcing entry into this state.
    pub const fn template(self) -> NotificationTemplate {
        match self {
            Self::Pending => NotificationTemplate::BookingPending,
            Self::Accepted => NotificationTemplate::BookingAccepted,
            Self::PaymentPending => NotificationTemplate::PaymentPending,
            Self::Rejected => NotificationTemplate::BookingRejected,
            Self::InProgress => NotificationTemplate::BookingInProgress,
            Self::Completed => NotificationTemplate::BookingCompleted,
            Self::ReviewPending => NotificationTemplate::ReviewPending,
            Self::RequestedForRescheduleByUser => NotificationTemplate::RescheduleRequestedByUser,
            Self::RequestedForRescheduleByTalent => {
                NotificationTemplate::RescheduleRequestedByTalent
            }
            Self::TalentReviewPending => NotificationTemplate::TalentReviewPending,
            Self::ClientReviewPending => NotificationTemplate::ClientReviewPending,
            Self::CanceledByUser => NotificationTemplate::BookingCanceledByUser,
            Self::CanceledByTalent => NotificationTemplate::BookingCanceledByTalent,
            Self::IsPaid => NotificationTemplate::PaymentReceived,
            Self::Confirm => NotificationTemplate::BookingConfirmed,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownBookingStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownBookingStatus(raw.to_owned()))
    }
}

/// Which parties a status change is announced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    Client,
    Talent,
    Both,
}

impl Recipients {
    /// Whether `role` is among the recipients.
    pub const fn includes(self, role: PartyRole) -> bool {
        matches!(
            (self, role),
            (Self::Both, _) | (Self::Client, PartyRole::Client) | (Self::Talent, PartyRole::Talent)
        )
    }
}

/// Who may request a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Client,
    Talent,
    Either,
}

impl Actor {
    const fn permits(self, role: PartyRole) -> bool {
        matches!(
            (self, role),
            (Self::Either, _)
                | (Self::Client, PartyRole::Client)
                | (Self::Talent, PartyRole::Talent)
        )
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: &'static [BookingStatus],
    pub to: BookingStatus,
    pub by: Actor,
}

use BookingStatus as S;

const ACTIVE_PRE_SERVICE: &[BookingStatus] = &[
    S::Pending,
    S::Accepted,
    S::PaymentPending,
    S::IsPaid,
    S::Confirm,
    S::RequestedForRescheduleByUser,
    S::RequestedForRescheduleByTalent,
];

const RESCHEDULABLE: &[BookingStatus] = &[S::Accepted, S::PaymentPending, S::IsPaid, S::Confirm];

const REVIEW_STATES: &[BookingStatus] = &[
    S::ReviewPending,
    S::TalentReviewPending,
    S::ClientReviewPending,
];

/// Allowed `(current, requested, acting side)` transitions.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        from: &[S::Pending],
        to: S::Accepted,
        by: Actor::Talent,
    },
    Transition {
        from: &[S::Pending],
        to: S::Rejected,
        by: Actor::Talent,
    },
    Transition {
        from: &[S::Pending, S::Accepted],
        to: S::PaymentPending,
        by: Actor::Either,
    },
    Transition {
        from: ACTIVE_PRE_SERVICE,
        to: S::CanceledByUser,
        by: Actor::Client,
    },
    Transition {
        from: ACTIVE_PRE_SERVICE,
        to: S::CanceledByTalent,
        by: Actor::Talent,
    },
    Transition {
        from: RESCHEDULABLE,
        to: S::RequestedForRescheduleByUser,
        by: Actor::Client,
    },
    Transition {
        from: RESCHEDULABLE,
        to: S::RequestedForRescheduleByTalent,
        by: Actor::Talent,
    },
    Transition {
        from: &[S::RequestedForRescheduleByUser, S::RequestedForRescheduleByTalent],
        to: S::Accepted,
        by: Actor::Either,
    },
    Transition {
        from: &[S::Accepted, S::PaymentPending],
        to: S::IsPaid,
        by: Actor::Client,
    },
    Transition {
        from: &[S::Accepted, S::IsPaid],
        to: S::Confirm,
        by: Actor::Either,
    },
    Transition {
        from: &[S::Accepted, S::IsPaid, S::Confirm],
        to: S::InProgress,
        by: Actor::Either,
    },
    Transition {
        from: &[S::InProgress],
        to: S::Completed,
        by: Actor::Either,
    },
    Transition {
        from: REVIEW_STATES,
        to: S::Completed,
        by: Actor::Either,
    },
    Transition {
        from: &[S::InProgress, S::ReviewPending],
        to: S::ReviewPending,
        by: Actor::Either,
    },
    Transition {
        from: &[S::InProgress, S::ReviewPending],
        to: S::TalentReviewPending,
        by: Actor::Either,
    },
    Transition {
        from: &[S::InProgress, S::ReviewPending],
        to: S::ClientReviewPending,
        by: Actor::Either,
    },
];

/// Whether `role` may move a booking from `current` to `requested`.
///
/// Re-requesting the current status is always allowed.
///
/// # Examples
/// ```
/// use backend::domain::{BookingStatus, PartyRole, transition_allowed};
///
/// use BookingStatus::{Accepted, Pending};
///
/// assert!(transition_allowed(Pending, Accepted, PartyRole::Talent));
/// assert!(!transition_allowed(Pending, Accepted, PartyRole::Client));
/// ```
pub fn transition_allowed(
    current: BookingStatus,
    requested: BookingStatus,
    role: PartyRole,
) -> bool {
    current == requested
        || TRANSITIONS.iter().any(|transition| {
            transition.to == requested
                && transition.by.permits(role)
                && transition.from.contains(&current)
        })
}

/// Payment state stored alongside the booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Stable storage and wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Checkout linkage of a booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub merchant_transaction_id: Option<String>,
    pub checkout_id: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub status: PaymentStatus,
    /// Last raw provider result, kept for audit.
    pub result: Option<Value>,
}

/// A single engagement between one client and one talent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub client_id: ProfileId,
    pub talent_id: ProfileId,
    pub note: Option<String>,
    pub status: BookingStatus,
    pub skill_id: Option<SkillId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment: PaymentDetails,
}

impl Booking {
    /// Profile on the given side of the booking.
    pub const fn party(&self, role: PartyRole) -> ProfileId {
        match role {
            PartyRole::Client => self.client_id,
            PartyRole::Talent => self.talent_id,
        }
    }

    /// Whether `profile` is the booking's party for `role`.
    pub fn is_party(&self, role: PartyRole, profile: ProfileId) -> bool {
        self.party(role) == profile
    }
}

/// Fields needed to insert a new booking row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub id: BookingId,
    pub client_id: ProfileId,
    pub talent_id: ProfileId,
    pub note: Option<String>,
    pub skill_id: Option<SkillId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn status_names_round_trip_through_from_str() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
            let json = serde_json::to_value(status).expect("serialise");
            assert_eq!(json, serde_json::json!(status.as_str()));
        }
    }

    #[rstest]
    #[case("done")]
    #[case("Completed")]
    #[case("")]
    fn rejects_unknown_statuses(#[case] raw: &str) {
        assert!(raw.parse::<BookingStatus>().is_err());
    }

    #[rstest]
    #[case(S::Pending, S::Accepted, PartyRole::Talent, true)]
    #[case(S::Pending, S::Accepted, PartyRole::Client, false)]
    #[case(S::Pending, S::CanceledByUser, PartyRole::Client, true)]
    #[case(S::Pending, S::CanceledByUser, PartyRole::Talent, false)]
    #[case(S::Accepted, S::InProgress, PartyRole::Client, true)]
    #[case(S::InProgress, S::Completed, PartyRole::Talent, true)]
    #[case(S::ReviewPending, S::Completed, PartyRole::Client, true)]
    #[case(S::Completed, S::Pending, PartyRole::Client, false)]
    #[case(S::Rejected, S::Accepted, PartyRole::Talent, false)]
    #[case(S::CanceledByTalent, S::CanceledByTalent, PartyRole::Talent, true)]
    #[case(S::PaymentPending, S::IsPaid, PartyRole::Client, true)]
    #[case(S::PaymentPending, S::IsPaid, PartyRole::Talent, false)]
    fn transition_table_decides_by_role(
        #[case] current: BookingStatus,
        #[case] requested: BookingStatus,
        #[case] role: PartyRole,
        #[case] expected: bool,
    ) {
        assert_eq!(transition_allowed(current, requested, role), expected);
    }

    #[rstest]
    #[case(S::Pending, PartyRole::Talent, true)]
    #[case(S::Pending, PartyRole::Client, false)]
    #[case(S::Accepted, PartyRole::Client, true)]
    #[case(S::Accepted, PartyRole::Talent, true)]
    #[case(S::Rejected, PartyRole::Client, true)]
    #[case(S::IsPaid, PartyRole::Talent, true)]
    #[case(S::ClientReviewPending, PartyRole::Talent, false)]
    #[case(S::CanceledByTalent, PartyRole::Client, true)]
    fn recipients_follow_status(
        #[case] status: BookingStatus,
        #[case] role: PartyRole,
        #[case] expected: bool,
    ) {
        assert_eq!(status.recipients().includes(role), expected);
    }

    #[rstest]
    fn canceled_and_rejected_bookings_are_inactive() {
        assert!(!S::Rejected.is_active());
        assert!(!S::CanceledByUser.is_active());
        assert!(S::Pending.is_active());
        assert!(S::Completed.is_active());
    }

    #[rstest]
    fn templates_use_expected_keys() {
        assert_eq!(S::IsPaid.template().as_str(), "paymentReceived");
        assert_eq!(S::Confirm.template().as_str(), "bookingConfirmed");
        assert_eq!(S::CanceledByUser.template().as_str(), "bookingCanceledByUser");
    }
}

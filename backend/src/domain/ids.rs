//! Strongly typed identifiers.
//!
//! Every entity id is a UUID newtype so a booking id can never be passed where
//! a reschedule id is expected. All ids serialise as their hyphenated string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the inner UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id! {
    /// Authenticated account identifier issued by the auth service.
    UserId
}

define_id! {
    /// Client or talent profile identifier.
    ProfileId
}

define_id! {
    /// Booking identifier.
    BookingId
}

define_id! {
    /// Booking slot row identifier.
    SlotId
}

define_id! {
    /// Reschedule proposal identifier.
    RescheduleId
}

define_id! {
    /// Skill reference data identifier.
    SkillId
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn parses_and_displays_hyphenated_uuid() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let id: BookingId = raw.parse().expect("valid uuid");
        assert_eq!(id.to_string(), raw);
    }

    #[rstest]
    fn rejects_non_uuid_input() {
        assert!("booking-1".parse::<RescheduleId>().is_err());
    }

    #[rstest]
    fn serialises_transparently() {
        let id = ProfileId::from_uuid(Uuid::nil());
        let json = serde_json::to_value(id).expect("serialise");
        assert_eq!(json, serde_json::json!("00000000-0000-0000-0000-000000000000"));
    }
}

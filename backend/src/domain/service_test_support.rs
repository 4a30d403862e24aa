//! Builders shared by the domain service unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Booking, BookingId, BookingSlot, BookingStatus, PartyRole, PaymentDetails, Profile, ProfileId,
    SlotId, UserId,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn profile(role: PartyRole, player_id: Option<&str>) -> Profile {
    Profile {
        id: ProfileId::random(),
        user_id: UserId::random(),
        role,
        first_name: match role {
            PartyRole::Client => "Sara".to_owned(),
            PartyRole::Talent => "Omar".to_owned(),
        },
        last_name: "Haddad".to_owned(),
        email: None,
        phone: None,
        street: None,
        city: None,
        state: None,
        country: None,
        postcode: None,
        push_player_id: player_id.map(str::to_owned),
    }
}

pub(crate) fn booking(client: &Profile, talent: &Profile, status: BookingStatus) -> Booking {
    Booking {
        id: BookingId::random(),
        client_id: client.id,
        talent_id: talent.id,
        note: None,
        status,
        skill_id: None,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
        payment: PaymentDetails::default(),
    }
}

pub(crate) fn slot(booking_id: BookingId, date: &str, time: &str) -> BookingSlot {
    BookingSlot {
        id: SlotId::random(),
        booking_id,
        date: date.parse().expect("valid date"),
        time: time.to_owned(),
    }
}

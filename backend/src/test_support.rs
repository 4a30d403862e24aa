//! Test utilities for the backend crate.
//!
//! In-memory adapters and recording doubles shared by unit tests (in `src/`)
//! and integration tests (in `tests/`). Compiled for tests and when the
//! `test-support` feature is enabled.

pub mod doubles;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{BookingCommand, BookingQuery, PaymentCommand, RescheduleCommand};
use crate::domain::{
    BookingService, BookingServiceConfig, BookingServicePorts, PartyRole, PaymentService,
    PaymentServiceConfig, PaymentServicePorts, Profile, ProfileId, RescheduleService,
    RescheduleServicePorts, UserId,
};
use crate::inbound::http::state::{HttpState, PaymentRedirectUrls};

pub use doubles::{MutableClock, RecordingNotifier, StubPaymentGateway};
pub use memory::InMemoryMarketplace;

/// Instant every [`Marketplace`] clock starts at.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Profile with a push player id derived from its first name.
pub fn profile(role: PartyRole, first_name: &str) -> Profile {
    Profile {
        id: ProfileId::random(),
        user_id: UserId::random(),
        role,
        first_name: first_name.to_owned(),
        last_name: "Haddad".to_owned(),
        email: None,
        phone: None,
        street: None,
        city: None,
        state: None,
        country: None,
        postcode: None,
        push_player_id: Some(format!("player-{}", first_name.to_lowercase())),
    }
}

/// Services wired over one in-memory store and recording doubles.
pub struct Marketplace {
    pub store: Arc<InMemoryMarketplace>,
    pub notifier: Arc<RecordingNotifier>,
    pub gateway: Arc<StubPaymentGateway>,
    pub clock: Arc<MutableClock>,
    pub bookings: Arc<BookingService>,
    pub reschedules: Arc<RescheduleService>,
    pub payments: Arc<PaymentService>,
}

impl Marketplace {
    /// Marketplace with the booking transition table enforced.
    pub fn new() -> Self {
        Self::with_config(BookingServiceConfig::default())
    }

    /// Marketplace with an explicit booking configuration.
    pub fn with_config(config: BookingServiceConfig) -> Self {
        let store = Arc::new(InMemoryMarketplace::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let gateway = Arc::new(StubPaymentGateway::default());
        let clock = Arc::new(MutableClock::new(epoch()));
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let bookings = Arc::new(BookingService::new(
            BookingServicePorts {
                bookings: store.clone(),
                profiles: store.clone(),
                availability: store.clone(),
                reviews: store.clone(),
                reschedules: store.clone(),
                notifier: notifier.clone(),
            },
            shared_clock.clone(),
            config,
        ));
        let reschedules = Arc::new(RescheduleService::new(
            RescheduleServicePorts {
                bookings: store.clone(),
                profiles: store.clone(),
                reschedules: store.clone(),
                notifier: notifier.clone(),
            },
            shared_clock.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            PaymentServicePorts {
                bookings: store.clone(),
                profiles: store.clone(),
                gateway: gateway.clone(),
                notifier: notifier.clone(),
            },
            shared_clock,
            PaymentServiceConfig::default(),
        ));

        Self {
            store,
            notifier,
            gateway,
            clock,
            bookings,
            reschedules,
            payments,
        }
    }

    /// Register a profile and return it.
    pub fn register(&self, role: PartyRole, first_name: &str) -> Profile {
        let profile = profile(role, first_name);
        self.store.add_profile(profile.clone());
        profile
    }

    /// Handler state over the wired services.
    pub fn http_state(&self, redirects: PaymentRedirectUrls) -> HttpState {
        HttpState::new(
            self.bookings.clone() as Arc<dyn BookingCommand>,
            self.bookings.clone() as Arc<dyn BookingQuery>,
            self.reschedules.clone() as Arc<dyn RescheduleCommand>,
            self.payments.clone() as Arc<dyn PaymentCommand>,
            redirects,
        )
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}

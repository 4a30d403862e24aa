//! Builders wiring repositories, adapters and services into handler state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use backend::domain::ports::{
    BookingCommand, BookingQuery, Notifier, PaymentCommand, PaymentGateway, RescheduleCommand,
};
use backend::domain::{
    BookingService, BookingServicePorts, PaymentService, PaymentServicePorts, RescheduleService,
    RescheduleServicePorts,
};
use backend::inbound::http::state::HttpState;
use backend::outbound::hyperpay::HyperPayGateway;
use backend::outbound::notifier::{HttpPushNotifier, LoggingNotifier};
use backend::outbound::persistence::{
    DbPool, DieselAvailabilityRepository, DieselBookingRepository, DieselProfileRepository,
    DieselRescheduleRepository, DieselReviewLookup,
};
use backend::settings::AppSettings;

fn config_error(error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(error.to_string())
}

/// Push notifier from settings; notifications are only logged without an
/// endpoint.
fn build_notifier(settings: &AppSettings) -> std::io::Result<Arc<dyn Notifier>> {
    match settings.notifier.push_config().map_err(config_error)? {
        Some(config) => {
            info!(endpoint = %config.endpoint, "push notifications enabled");
            let notifier = HttpPushNotifier::new(config).map_err(config_error)?;
            Ok(Arc::new(notifier))
        }
        None => {
            info!("no push endpoint configured; notifications are logged only");
            Ok(Arc::new(LoggingNotifier))
        }
    }
}

fn build_gateway(settings: &AppSettings) -> std::io::Result<Arc<dyn PaymentGateway>> {
    let config = settings.payment.hyperpay_config().map_err(config_error)?;
    let gateway = HyperPayGateway::new(config).map_err(config_error)?;
    Ok(Arc::new(gateway))
}

/// Repositories shared by every service.
struct Repositories {
    bookings: Arc<DieselBookingRepository>,
    profiles: Arc<DieselProfileRepository>,
    reschedules: Arc<DieselRescheduleRepository>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            bookings: Arc::new(DieselBookingRepository::new(pool.clone())),
            profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
            reschedules: Arc::new(DieselRescheduleRepository::new(pool.clone())),
        }
    }
}

/// Build the booking service and expose it as its command and query ports.
fn build_booking_pair(
    pool: &DbPool,
    repos: &Repositories,
    notifier: &Arc<dyn Notifier>,
    clock: &Arc<dyn Clock>,
    settings: &AppSettings,
) -> (Arc<dyn BookingCommand>, Arc<dyn BookingQuery>) {
    let service = Arc::new(BookingService::new(
        BookingServicePorts {
            bookings: repos.bookings.clone(),
            profiles: repos.profiles.clone(),
            availability: Arc::new(DieselAvailabilityRepository::new(pool.clone())),
            reviews: Arc::new(DieselReviewLookup::new(pool.clone())),
            reschedules: repos.reschedules.clone(),
            notifier: notifier.clone(),
        },
        clock.clone(),
        settings.booking.service_config(),
    ));
    (
        service.clone() as Arc<dyn BookingCommand>,
        service as Arc<dyn BookingQuery>,
    )
}

/// Assemble handler state over PostgreSQL-backed repositories.
///
/// # Errors
///
/// Returns [`std::io::Error`] when payment or notifier settings are unusable
/// or an HTTP client cannot be built.
pub(crate) fn build_http_state(
    pool: &DbPool,
    settings: &AppSettings,
) -> std::io::Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let notifier = build_notifier(settings)?;
    let gateway = build_gateway(settings)?;
    let repos = Repositories::new(pool);

    let (bookings, booking_queries) = build_booking_pair(pool, &repos, &notifier, &clock, settings);
    let reschedules: Arc<dyn RescheduleCommand> = Arc::new(RescheduleService::new(
        RescheduleServicePorts {
            bookings: repos.bookings.clone(),
            profiles: repos.profiles.clone(),
            reschedules: repos.reschedules.clone(),
            notifier: notifier.clone(),
        },
        clock.clone(),
    ));
    let payments: Arc<dyn PaymentCommand> = Arc::new(PaymentService::new(
        PaymentServicePorts {
            bookings: repos.bookings,
            profiles: repos.profiles,
            gateway,
            notifier,
        },
        clock,
        settings.payment.service_config(),
    ));

    Ok(HttpState::new(
        bookings,
        booking_queries,
        reschedules,
        payments,
        settings.payment.redirect_urls(),
    ))
}

//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, gateway, notifier) are implemented by the
//! outbound adapters; driving ports (commands and queries) are implemented by
//! the domain services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod availability_repository;
mod booking_command;
mod booking_query;
mod booking_repository;
mod notifier;
mod payment_command;
mod payment_gateway;
mod profile_repository;
mod reschedule_command;
mod reschedule_repository;
mod review_lookup;

#[cfg(test)]
pub use availability_repository::MockAvailabilityRepository;
pub use availability_repository::{
    AvailabilityRepository, AvailabilityRepositoryError, FixtureAvailabilityRepository,
};
#[cfg(test)]
pub use booking_command::MockBookingCommand;
pub use booking_command::{
    BookingCommand, CreateBookingRequest, CreateBookingResponse, SetBookingStatusRequest,
};
#[cfg(test)]
pub use booking_query::MockBookingQuery;
pub use booking_query::{
    BookingDetails, BookingDetailsRequest, BookingQuery, BookingView, BusySlotsRequest,
    ListBookingsRequest,
};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{
    BookingListFilter, BookingRepository, BookingRepositoryError, CreatedBooking,
    SettlementOutcome,
};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{FixtureNotifier, Notifier, NotifierError};
#[cfg(test)]
pub use payment_command::MockPaymentCommand;
pub use payment_command::{
    CreateCheckoutRequest, PaymentCommand, PaymentStatusRequest, PaymentStatusResponse,
};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{PaymentGateway, PaymentGatewayError};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use reschedule_command::MockRescheduleCommand;
pub use reschedule_command::{
    DecideRescheduleRequest, RequestRescheduleRequest, RescheduleCommand,
};
#[cfg(test)]
pub use reschedule_repository::MockRescheduleRepository;
pub use reschedule_repository::{RescheduleRepository, RescheduleRepositoryError};
#[cfg(test)]
pub use review_lookup::MockReviewLookup;
pub use review_lookup::{FixtureReviewLookup, ReviewLookup, ReviewLookupError};

//! Domain primitives, aggregates and services.
//!
//! Purpose: hold the booking engine independent of transport and storage.
//! Pure pieces (slot merging, pricing, the transition table) are plain
//! functions; the services orchestrate them over the ports in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure taxonomy.
//! - Booking, BookingStatus, transition_allowed: lifecycle state machine.
//! - merge_time_ranges, group_and_merge, total_price: read-path helpers.
//! - BookingService, RescheduleService, PaymentService: driving port
//!   implementations.

pub mod booking;
pub mod booking_service;
pub mod error;
pub mod ids;
pub mod money;
pub mod notification;
pub mod payment;
pub mod payment_service;
pub mod ports;
pub mod pricing;
pub mod profile;
pub mod reschedule;
pub mod reschedule_service;
pub mod slot;
pub mod slot_merger;
pub mod trace_id;

mod service_support;
#[cfg(test)]
pub(crate) mod service_test_support;

pub use self::booking::{
    Actor, Booking, BookingStatus, NewBooking, PaymentDetails, PaymentStatus, Recipients,
    TRANSITIONS, Transition, UnknownBookingStatus, transition_allowed,
};
pub use self::booking_service::{BookingService, BookingServiceConfig, BookingServicePorts};
pub use self::error::{Error, ErrorCode};
pub use self::ids::{BookingId, ProfileId, RescheduleId, SkillId, SlotId, UserId};
pub use self::money::{Money, MoneyParseError};
pub use self::notification::{Notification, NotificationTemplate, dispatch};
pub use self::payment::{
    BillingDetails, CheckoutAttachment, CheckoutRequest, CheckoutSession, PaymentLookup,
    PaymentOutcome, PaymentRedirect, PaymentResult, PaymentSettlement, is_success_code,
};
pub use self::payment_service::{PaymentService, PaymentServiceConfig, PaymentServicePorts};
pub use self::pricing::{AvailabilityEntry, total_price};
pub use self::profile::{PartyRole, Profile, ProfileSummary, UnknownPartyRole};
pub use self::reschedule::{
    Reschedule, RescheduleDecision, RescheduleProposal, RescheduleStatus,
};
pub use self::reschedule_service::{RescheduleService, RescheduleServicePorts};
pub use self::slot::{
    BookingSlot, SlotRequest, SlotValidationError, StagedSlots, TimeRange, find_conflicts,
    overlaps_booked, parse_slots_by_date, stage_slots,
};
pub use self::slot_merger::{SlotGroup, group_and_merge, merge_time_ranges};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use backend::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<u32> {
///     Err(Error::not_found("booking missing"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;

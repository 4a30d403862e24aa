//! Internal helpers shared by the booking, reschedule and payment services.

use chrono::NaiveDate;
use serde_json::json;
use tracing::warn;

use crate::domain::ports::{
    AvailabilityRepositoryError, BookingRepositoryError, PaymentGatewayError, ProfileRepository,
    ProfileRepositoryError, RescheduleRepositoryError, ReviewLookupError,
};
use crate::domain::{Booking, Error, PartyRole, Profile, ProfileId, UserId};

pub(crate) fn map_booking_error(error: BookingRepositoryError) -> Error {
    match error {
        BookingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("booking repository unavailable: {message}"))
        }
        BookingRepositoryError::Query { message } => {
            Error::internal(format!("booking repository error: {message}"))
        }
        BookingRepositoryError::SlotTaken { message } => {
            Error::conflict("slot already exists").with_details(json!({ "reason": message }))
        }
        BookingRepositoryError::SlotsBooked { slots } => slots_booked(
            slots
                .iter()
                .map(|slot| (slot.date, slot.time.to_string()))
                .collect(),
        ),
    }
}

/// 409 listing the `(date, time)` pairs already held on the talent's calendar.
pub(crate) fn slots_booked(pairs: Vec<(NaiveDate, String)>) -> Error {
    let conflicts: Vec<_> = pairs
        .into_iter()
        .map(|(date, time)| json!({ "date": date, "time": time }))
        .collect();
    Error::conflict("slot already booked").with_details(json!({ "conflicts": conflicts }))
}

pub(crate) fn map_profile_error(error: ProfileRepositoryError) -> Error {
    match error {
        ProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("profile repository unavailable: {message}"))
        }
        ProfileRepositoryError::Query { message } => {
            Error::internal(format!("profile repository error: {message}"))
        }
    }
}

pub(crate) fn map_reschedule_error(error: RescheduleRepositoryError) -> Error {
    match error {
        RescheduleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("reschedule repository unavailable: {message}"))
        }
        RescheduleRepositoryError::Query { message } => {
            Error::internal(format!("reschedule repository error: {message}"))
        }
        RescheduleRepositoryError::AlreadyPending { message } => {
            Error::conflict("a reschedule request is already pending")
                .with_details(json!({ "reason": message }))
        }
        RescheduleRepositoryError::SlotTaken { message } => {
            Error::conflict("slot already exists").with_details(json!({ "reason": message }))
        }
        RescheduleRepositoryError::SlotBooked { date, time } => slots_booked(vec![(date, time)]),
    }
}

pub(crate) fn map_availability_error(error: AvailabilityRepositoryError) -> Error {
    match error {
        AvailabilityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("availability repository unavailable: {message}"))
        }
        AvailabilityRepositoryError::Query { message } => {
            Error::internal(format!("availability repository error: {message}"))
        }
    }
}

pub(crate) fn map_review_error(error: ReviewLookupError) -> Error {
    match error {
        ReviewLookupError::Connection { message } => {
            Error::service_unavailable(format!("review lookup unavailable: {message}"))
        }
        ReviewLookupError::Query { message } => {
            Error::internal(format!("review lookup error: {message}"))
        }
    }
}

pub(crate) fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::InvalidRequest { message } => Error::invalid_request(message),
        other => Error::upstream(other.to_string()),
    }
}

/// Profile of the acting user on `role`, or 404.
pub(crate) async fn require_profile(
    profiles: &dyn ProfileRepository,
    user_id: &UserId,
    role: PartyRole,
) -> Result<Profile, Error> {
    profiles
        .find_by_user(user_id, role)
        .await
        .map_err(map_profile_error)?
        .ok_or_else(|| Error::not_found(format!("{role} profile not found")))
}

/// Profile of the acting user, which must be the booking's party for `role`.
pub(crate) async fn authorize_party(
    profiles: &dyn ProfileRepository,
    booking: &Booking,
    user_id: &UserId,
    role: PartyRole,
) -> Result<Profile, Error> {
    let profile = profiles
        .find_by_user(user_id, role)
        .await
        .map_err(map_profile_error)?
        .ok_or_else(|| Error::forbidden(format!("no {role} profile for the current user")))?;
    if !booking.is_party(role, profile.id) {
        return Err(Error::forbidden(format!(
            "booking does not belong to the current {role}"
        )));
    }
    Ok(profile)
}

/// Push id of a profile; lookup failures are logged and treated as absent.
pub(crate) async fn player_id_of(
    profiles: &dyn ProfileRepository,
    profile_id: &ProfileId,
) -> Option<String> {
    match profiles.find_by_id(profile_id).await {
        Ok(profile) => profile.and_then(|p| p.player_id().map(str::to_owned)),
        Err(error) => {
            warn!(profile_id = %profile_id, error = %error, "recipient lookup failed");
            None
        }
    }
}

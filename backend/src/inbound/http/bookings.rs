//! Booking HTTP handlers.
//!
//! ```text
//! POST /api/v1/bookings
//! GET  /api/v1/bookings?role=client&status=pending&page=1&limit=10
//! POST /api/v1/bookings/details
//! POST /api/v1/bookings/status
//! ```
//!
//! Bodies are accepted loosely (every field optional) so missing inputs
//! surface as `missing_field` validation errors rather than opaque
//! deserialisation failures.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    BookingDetailsRequest, CreateBookingRequest, ListBookingsRequest, SetBookingStatusRequest,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::booking_dto::{
    BookingDetailsDto, BookingDto, BookingEnvelopeDto, BookingPageDto, CreatedBookingDto,
};
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_page, parse_role, parse_status_filter, require, require_text,
};

/// Request payload for creating a booking.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    #[schema(format = Uuid)]
    pub talent_id: Option<String>,
    #[schema(format = Uuid)]
    pub skill_id: Option<String>,
    pub note: Option<String>,
    /// `{ "YYYY-MM-DD": ["HH:MM - HH:MM", ...] }`.
    #[schema(value_type = Object, example = json!({"2025-09-20": ["09:00 - 10:00"]}))]
    pub slots_by_date: Option<Value>,
}

/// Query parameters for listing bookings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    /// `client` or `talent`.
    pub role: Option<String>,
    /// Optional status filter.
    pub status: Option<String>,
    /// One-based page number, default 1.
    pub page: Option<u32>,
    /// Page size, default 10.
    pub limit: Option<u32>,
}

/// Request payload addressing one booking as one side.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailsBody {
    pub role: Option<String>,
    #[schema(format = Uuid)]
    pub booking_id: Option<String>,
}

/// Request payload for a status transition.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetBookingStatusBody {
    pub role: Option<String>,
    #[schema(format = Uuid)]
    pub booking_id: Option<String>,
    #[schema(example = "accepted")]
    pub status: Option<String>,
}

fn parse_create_booking(
    body: CreateBookingBody,
    user_id: UserId,
) -> Result<CreateBookingRequest, Error> {
    let talent_id = require_text(body.talent_id, FieldName::new("talentId"))?;
    let skill_id = body
        .skill_id
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_id(&raw, FieldName::new("skillId")))
        .transpose()?;
    Ok(CreateBookingRequest {
        user_id,
        talent_id: parse_id(&talent_id, FieldName::new("talentId"))?,
        skill_id,
        note: body.note.filter(|note| !note.trim().is_empty()),
        slots_by_date: require(body.slots_by_date, FieldName::new("slotsByDate"))?,
    })
}

fn parse_booking_target(
    role: Option<String>,
    booking_id: Option<String>,
) -> Result<(crate::domain::PartyRole, crate::domain::BookingId), Error> {
    let role = require_text(role, FieldName::new("role"))?;
    let booking_id = require_text(booking_id, FieldName::new("bookingId"))?;
    Ok((
        parse_role(&role, FieldName::new("role"))?,
        parse_id(&booking_id, FieldName::new("bookingId"))?,
    ))
}

fn parse_list_query(
    query: ListBookingsQuery,
    user_id: UserId,
) -> Result<ListBookingsRequest, Error> {
    let role = require_text(query.role, FieldName::new("role"))?;
    let status = query
        .status
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_status_filter(&raw, FieldName::new("status")))
        .transpose()?;
    Ok(ListBookingsRequest {
        user_id,
        role: parse_role(&role, FieldName::new("role"))?,
        status,
        page: parse_page(query.page, query.limit)?,
    })
}

/// Book a talent for one or more slots.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingBody,
    responses(
        (status = 201, description = "Booking created", body = Envelope<CreatedBookingDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (
            status = 404,
            description = "Client or talent profile missing",
            body = ErrorEnvelopeSchema
        ),
        (status = 409, description = "Slot already booked", body = ErrorEnvelopeSchema)
    ),
    tags = ["bookings"],
    operation_id = "createBooking",
    security(("SessionCookie" = []))
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateBookingBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_create_booking(payload.into_inner(), user_id)?;
    let created = state.bookings.create_booking(request).await?;
    Ok(Envelope::ok("Booking created", CreatedBookingDto::from(created))
        .respond_with(StatusCode::CREATED))
}

/// List the caller's bookings on one side, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Bookings page", body = Envelope<BookingPageDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 404, description = "Caller has no profile", body = ErrorEnvelopeSchema)
    ),
    tags = ["bookings"],
    operation_id = "listBookings",
    security(("SessionCookie" = []))
)]
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListBookingsQuery>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_list_query(query.into_inner(), user_id)?;
    let page = state.booking_queries.list_bookings(request).await?;
    Ok(Envelope::ok("Bookings fetched", BookingPageDto::from(page)).respond())
}

/// Details of one booking with merged slots, price and latest reschedule.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/details",
    request_body = BookingDetailsBody,
    responses(
        (status = 200, description = "Booking details", body = Envelope<BookingDetailsDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 403, description = "Caller is not a party", body = ErrorEnvelopeSchema),
        (status = 404, description = "Booking not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["bookings"],
    operation_id = "bookingDetails",
    security(("SessionCookie" = []))
)]
#[post("/bookings/details")]
pub async fn booking_details(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BookingDetailsBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();
    let (role, booking_id) = parse_booking_target(body.role, body.booking_id)?;
    let details = state
        .booking_queries
        .booking_details(BookingDetailsRequest {
            user_id,
            role,
            booking_id,
        })
        .await?;
    Ok(Envelope::ok("Booking details fetched", BookingDetailsDto::from(details)).respond())
}

/// Move a booking along its lifecycle.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/status",
    request_body = SetBookingStatusBody,
    responses(
        (status = 200, description = "Status updated", body = Envelope<BookingEnvelopeDto>),
        (status = 400, description = "Invalid status", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 403, description = "Caller may not set this status", body = ErrorEnvelopeSchema),
        (status = 404, description = "Booking not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Transition not allowed", body = ErrorEnvelopeSchema)
    ),
    tags = ["bookings"],
    operation_id = "setBookingStatus",
    security(("SessionCookie" = []))
)]
#[post("/bookings/status")]
pub async fn set_booking_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SetBookingStatusBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();
    let (role, booking_id) = parse_booking_target(body.role, body.booking_id)?;
    let status = require_text(body.status, FieldName::new("status"))?;
    let booking = state
        .bookings
        .set_status(SetBookingStatusRequest {
            user_id,
            role,
            booking_id,
            status,
        })
        .await?;
    let message = format!("Booking {}", booking.status);
    Ok(Envelope::ok(
        message,
        BookingEnvelopeDto {
            booking: BookingDto::from(booking),
        },
    )
    .respond())
}

#[cfg(test)]
#[path = "bookings_tests.rs"]
mod tests;

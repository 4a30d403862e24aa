//! Reschedule HTTP handlers.
//!
//! ```text
//! POST /api/v1/bookings/reschedule
//! POST /api/v1/bookings/reschedule/{id}/approve
//! POST /api/v1/bookings/reschedule/{id}/reject
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ports::{DecideRescheduleRequest, RequestRescheduleRequest};
use crate::domain::{Error, Reschedule, RescheduleId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::booking_dto::{RescheduleDto, RescheduleEnvelopeDto};
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_date, parse_id, parse_role, parse_time_range,
    require_text,
};

/// Request payload proposing a new slot.
///
/// `oldDate` and `oldTime` name the slot to move and must be sent together;
/// without them the booking's first slot moves.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestRescheduleBody {
    pub role: Option<String>,
    #[schema(format = Uuid)]
    pub booking_id: Option<String>,
    #[schema(format = Date)]
    pub old_date: Option<String>,
    #[schema(example = "09:00 - 10:00")]
    pub old_time: Option<String>,
    #[schema(format = Date)]
    pub new_date: Option<String>,
    #[schema(example = "14:00 - 15:00")]
    pub new_time: Option<String>,
}

/// Request payload for approving or rejecting a proposal.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideRescheduleBody {
    pub role: Option<String>,
    pub remarks: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_request_body(
    body: RequestRescheduleBody,
    user_id: UserId,
) -> Result<RequestRescheduleRequest, Error> {
    let role = require_text(body.role, FieldName::new("role"))?;
    let booking_id = require_text(body.booking_id, FieldName::new("bookingId"))?;
    let new_date = require_text(body.new_date, FieldName::new("newDate"))?;
    let new_time = require_text(body.new_time, FieldName::new("newTime"))?;
    let old_slot = match (non_blank(body.old_date), non_blank(body.old_time)) {
        (Some(date), Some(time)) => Some((
            parse_date(&date, FieldName::new("oldDate"))?,
            parse_time_range(&time, FieldName::new("oldTime"))?,
        )),
        (None, None) => None,
        (Some(_), None) => return Err(missing_field_error(FieldName::new("oldTime"))),
        (None, Some(_)) => return Err(missing_field_error(FieldName::new("oldDate"))),
    };
    Ok(RequestRescheduleRequest {
        user_id,
        role: parse_role(&role, FieldName::new("role"))?,
        booking_id: parse_id(&booking_id, FieldName::new("bookingId"))?,
        old_slot,
        new_date: parse_date(&new_date, FieldName::new("newDate"))?,
        new_time: parse_time_range(&new_time, FieldName::new("newTime"))?,
    })
}

fn parse_decision(
    reschedule_id: &str,
    body: DecideRescheduleBody,
    user_id: UserId,
) -> Result<DecideRescheduleRequest, Error> {
    let role = require_text(body.role, FieldName::new("role"))?;
    Ok(DecideRescheduleRequest {
        user_id,
        role: parse_role(&role, FieldName::new("role"))?,
        reschedule_id: parse_id::<RescheduleId>(reschedule_id, FieldName::new("id"))?,
        remarks: non_blank(body.remarks),
    })
}

fn reschedule_response(message: &str, status: StatusCode, reschedule: Reschedule) -> HttpResponse {
    Envelope::ok(
        message,
        RescheduleEnvelopeDto {
            reschedule: RescheduleDto::from(reschedule),
        },
    )
    .respond_with(status)
}

/// Propose moving one slot of an active booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/reschedule",
    request_body = RequestRescheduleBody,
    responses(
        (
            status = 201,
            description = "Reschedule requested",
            body = Envelope<RescheduleEnvelopeDto>
        ),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 403, description = "Caller is not a party", body = ErrorEnvelopeSchema),
        (status = 404, description = "Booking or slot not found", body = ErrorEnvelopeSchema),
        (
            status = 409,
            description = "Pending proposal exists or booking inactive",
            body = ErrorEnvelopeSchema
        )
    ),
    tags = ["reschedules"],
    operation_id = "requestReschedule",
    security(("SessionCookie" = []))
)]
#[post("/bookings/reschedule")]
pub async fn request_reschedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RequestRescheduleBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_request_body(payload.into_inner(), user_id)?;
    let reschedule = state.reschedules.request_reschedule(request).await?;
    Ok(reschedule_response(
        "Reschedule requested",
        StatusCode::CREATED,
        reschedule,
    ))
}

/// Accept a pending proposal; the booking slot moves to the new date and time.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/reschedule/{id}/approve",
    params(("id" = String, Path, description = "Reschedule identifier", format = Uuid)),
    request_body = DecideRescheduleBody,
    responses(
        (status = 200, description = "Reschedule approved", body = Envelope<RescheduleEnvelopeDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 403, description = "Caller may not decide", body = ErrorEnvelopeSchema),
        (status = 404, description = "Reschedule not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Already decided", body = ErrorEnvelopeSchema)
    ),
    tags = ["reschedules"],
    operation_id = "approveReschedule",
    security(("SessionCookie" = []))
)]
#[post("/bookings/reschedule/{id}/approve")]
pub async fn approve_reschedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DecideRescheduleBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_decision(&path.into_inner(), payload.into_inner(), user_id)?;
    let reschedule = state.reschedules.approve_reschedule(request).await?;
    Ok(reschedule_response(
        "Reschedule approved",
        StatusCode::OK,
        reschedule,
    ))
}

/// Reject a pending proposal; the booking keeps its slots.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/reschedule/{id}/reject",
    params(("id" = String, Path, description = "Reschedule identifier", format = Uuid)),
    request_body = DecideRescheduleBody,
    responses(
        (status = 200, description = "Reschedule rejected", body = Envelope<RescheduleEnvelopeDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 403, description = "Caller may not decide", body = ErrorEnvelopeSchema),
        (status = 404, description = "Reschedule not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Already decided", body = ErrorEnvelopeSchema)
    ),
    tags = ["reschedules"],
    operation_id = "rejectReschedule",
    security(("SessionCookie" = []))
)]
#[post("/bookings/reschedule/{id}/reject")]
pub async fn reject_reschedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DecideRescheduleBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_decision(&path.into_inner(), payload.into_inner(), user_id)?;
    let reschedule = state.reschedules.reject_reschedule(request).await?;
    Ok(reschedule_response(
        "Reschedule rejected",
        StatusCode::OK,
        reschedule,
    ))
}

#[cfg(test)]
mod tests {
    use actix_web::test as actix_test;
    use chrono::NaiveDate;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::service_test_support::fixture_timestamp;
    use crate::domain::{BookingId, PartyRole, ProfileId, RescheduleStatus, TimeRange};
    use crate::inbound::http::handler_test_support::{Ports, sign_in, test_app};

    fn reschedule(status: RescheduleStatus) -> Reschedule {
        Reschedule {
            id: RescheduleId::random(),
            booking_id: BookingId::random(),
            requested_by_role: PartyRole::Client,
            requested_by: ProfileId::random(),
            old_date: NaiveDate::from_ymd_opt(2025, 9, 20).expect("date"),
            old_time: "09:00 - 10:00".to_owned(),
            new_date: NaiveDate::from_ymd_opt(2025, 9, 22).expect("date"),
            new_time: "14:00 - 15:00".to_owned(),
            status,
            remarks: None,
            decided_by: None,
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        }
    }

    async fn read_json(response: actix_web::dev::ServiceResponse) -> Value {
        serde_json::from_slice(&actix_test::read_body(response).await).expect("json body")
    }

    #[actix_web::test]
    async fn request_passes_the_old_slot_through() {
        let proposal = reschedule(RescheduleStatus::Pending);
        let booking_id = proposal.booking_id;
        let expected_old = (
            NaiveDate::from_ymd_opt(2025, 9, 20).expect("date"),
            "09:00 - 10:00".parse::<TimeRange>().expect("range"),
        );

        let mut ports = Ports::default();
        ports
            .reschedules
            .expect_request_reschedule()
            .withf(move |request| {
                request.booking_id == booking_id
                    && request.role == PartyRole::Client
                    && request.old_slot.as_ref() == Some(&expected_old)
                    && request.new_time.to_string() == "14:00 - 15:00"
            })
            .times(1)
            .return_once(move |_| Ok(proposal));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/bookings/reschedule")
            .cookie(cookie)
            .set_json(json!({
                "role": "client",
                "bookingId": booking_id.to_string(),
                "oldDate": "2025-09-20",
                "oldTime": "09:00 - 10:00",
                "newDate": "2025-09-22",
                "newTime": "14:00 - 15:00",
            }))
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body = read_json(res).await;
        assert_eq!(body["message"], "Reschedule requested");
        assert_eq!(body["data"]["reschedule"]["status"], "pending");
        assert_eq!(body["data"]["reschedule"]["requestedByRole"], "client");
    }

    #[actix_web::test]
    async fn request_without_old_slot_moves_the_first_slot() {
        let proposal = reschedule(RescheduleStatus::Pending);
        let mut ports = Ports::default();
        ports
            .reschedules
            .expect_request_reschedule()
            .withf(|request| request.old_slot.is_none())
            .times(1)
            .return_once(move |_| Ok(proposal));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/bookings/reschedule")
            .cookie(cookie)
            .set_json(json!({
                "role": "talent",
                "bookingId": BookingId::random().to_string(),
                "newDate": "2025-09-22",
                "newTime": "14:00 - 15:00",
            }))
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[rstest]
    #[case(json!({ "oldDate": "2025-09-20" }), "oldTime", "missing_field")]
    #[case(json!({ "newTime": "15:00 - 14:00" }), "newTime", "invalid_time_range")]
    #[case(json!({ "newDate": "22-09-2025" }), "newDate", "invalid_date")]
    #[case(json!({ "role": "" }), "role", "missing_field")]
    #[actix_web::test]
    async fn request_validates_fields(
        #[case] overrides: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let mut payload = json!({
            "role": "client",
            "bookingId": BookingId::random().to_string(),
            "newDate": "2025-09-22",
            "newTime": "14:00 - 15:00",
        });
        if let (Some(target), Some(source)) = (payload.as_object_mut(), overrides.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }

        let app = actix_test::init_service(test_app(Ports::default())).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/bookings/reschedule")
            .cookie(cookie)
            .set_json(payload)
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["data"]["details"]["field"], field);
        assert_eq!(body["data"]["details"]["code"], code);
    }

    #[actix_web::test]
    async fn approve_forwards_remarks() {
        let mut decided = reschedule(RescheduleStatus::Accepted);
        decided.remarks = Some("see you then".to_owned());
        let reschedule_id = decided.id;

        let mut ports = Ports::default();
        ports
            .reschedules
            .expect_approve_reschedule()
            .withf(move |request| {
                request.reschedule_id == reschedule_id
                    && request.role == PartyRole::Talent
                    && request.remarks.as_deref() == Some("see you then")
            })
            .times(1)
            .return_once(move |_| Ok(decided));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::post()
            .uri(&format!("/api/v1/bookings/reschedule/{reschedule_id}/approve"))
            .cookie(cookie)
            .set_json(json!({ "role": "talent", "remarks": "see you then" }))
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body["data"]["reschedule"]["status"], "accepted");
        assert_eq!(body["data"]["reschedule"]["remarks"], "see you then");
    }

    #[actix_web::test]
    async fn reject_of_decided_proposal_is_a_conflict() {
        let mut ports = Ports::default();
        ports
            .reschedules
            .expect_reject_reschedule()
            .times(1)
            .return_once(|_| Err(Error::conflict("reschedule already decided")));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::post()
            .uri(&format!(
                "/api/v1/bookings/reschedule/{}/reject",
                RescheduleId::random()
            ))
            .cookie(cookie)
            .set_json(json!({ "role": "client" }))
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body = read_json(res).await;
        assert_eq!(body["data"]["code"], "conflict");
    }

    #[actix_web::test]
    async fn decision_rejects_malformed_ids() {
        let app = actix_test::init_service(test_app(Ports::default())).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/bookings/reschedule/not-a-uuid/approve")
            .cookie(cookie)
            .set_json(json!({ "role": "talent" }))
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["data"]["details"]["code"], "invalid_uuid");
    }
}

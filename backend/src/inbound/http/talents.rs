//! Talent calendar HTTP handler.
//!
//! ```text
//! GET /api/v1/talents/{id}/busy-slots?from=2025-09-01&to=2025-09-30
//! ```

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::BusySlotsRequest;
use crate::domain::{Error, ProfileId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::booking_dto::SlotGroupDto;
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_date, parse_id};

/// Inclusive date window for the calendar.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BusySlotsQuery {
    /// First date, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Last date, `YYYY-MM-DD`.
    pub to: Option<String>,
}

fn optional_date(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<chrono::NaiveDate>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_date(&raw, field))
        .transpose()
}

/// Merged busy time ranges of a talent's active bookings, per date.
#[utoipa::path(
    get,
    path = "/api/v1/talents/{id}/busy-slots",
    params(
        ("id" = String, Path, description = "Talent profile identifier", format = Uuid),
        BusySlotsQuery
    ),
    responses(
        (status = 200, description = "Busy slots", body = Envelope<Vec<SlotGroupDto>>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema)
    ),
    tags = ["talents"],
    operation_id = "talentBusySlots",
    security(("SessionCookie" = []))
)]
#[get("/talents/{id}/busy-slots")]
pub async fn busy_slots(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<BusySlotsQuery>,
) -> ApiResult<HttpResponse> {
    session.require_user_id()?;
    let talent_id: ProfileId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let query = query.into_inner();
    let from = optional_date(query.from, FieldName::new("from"))?;
    let to = optional_date(query.to, FieldName::new("to"))?;
    if matches!((from, to), (Some(from), Some(to)) if to < from) {
        return Err(Error::invalid_request("to must not precede from").with_details(
            serde_json::json!({ "field": "to", "code": "invalid_date" }),
        ));
    }
    let groups = state
        .booking_queries
        .busy_slots(BusySlotsRequest {
            talent_id,
            from,
            to,
        })
        .await?;
    let data: Vec<SlotGroupDto> = groups.into_iter().map(Into::into).collect();
    Ok(Envelope::ok("Busy slots fetched", data).respond())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::NaiveDate;
    use serde_json::Value;

    use super::*;
    use crate::domain::{SlotGroup, UserId};
    use crate::inbound::http::handler_test_support::{Ports, sign_in, test_app};

    #[actix_web::test]
    async fn busy_slots_forwards_the_window() {
        let talent_id = ProfileId::random();
        let from = NaiveDate::from_ymd_opt(2025, 9, 1).expect("date");
        let to = NaiveDate::from_ymd_opt(2025, 9, 30).expect("date");

        let mut ports = Ports::default();
        ports
            .queries
            .expect_busy_slots()
            .withf(move |request| {
                request.talent_id == talent_id
                    && request.from == Some(from)
                    && request.to == Some(to)
            })
            .times(1)
            .return_once(|_| {
                Ok(vec![SlotGroup {
                    booking_date: NaiveDate::from_ymd_opt(2025, 9, 20).expect("date"),
                    booking_times: vec!["09:00 - 11:00".to_owned()],
                }])
            });

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::get()
            .uri(&format!(
                "/api/v1/talents/{talent_id}/busy-slots?from=2025-09-01&to=2025-09-30"
            ))
            .cookie(cookie)
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(res).await).expect("json body");
        assert_eq!(body["data"][0]["bookingDate"], "2025-09-20");
        assert_eq!(body["data"][0]["bookingTimes"][0], "09:00 - 11:00");
    }

    #[actix_web::test]
    async fn inverted_window_is_rejected() {
        let app = actix_test::init_service(test_app(Ports::default())).await;
        let cookie = sign_in(&app, UserId::random()).await;
        let request = actix_test::TestRequest::get()
            .uri(&format!(
                "/api/v1/talents/{}/busy-slots?from=2025-09-30&to=2025-09-01",
                ProfileId::random()
            ))
            .cookie(cookie)
            .to_request();
        let res = actix_test::call_service(&app, request).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

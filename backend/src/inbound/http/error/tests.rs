//! Tests for HTTP error mapping.

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::Error;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("slot already booked"), StatusCode::CONFLICT)]
#[case(Error::upstream("provider down"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn envelope_of(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let body = serde_json::from_slice(&bytes).expect("envelope JSON");
    (status, header, body)
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(expected_trace_id: String) {
    let error = Error::internal("connection string postgres://secret")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "secret": "x" }));

    let (status, header, body) = envelope_of(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["data"]["code"], "internal_error");
    assert_eq!(body["data"]["traceId"], TRACE_ID);
    assert!(body["data"].get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn upstream_errors_keep_provider_text() {
    let error = Error::upstream("payment provider returned status 400: 200.300.404");

    let (status, _, body) = envelope_of(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["data"]["code"], "upstream_error");
    assert_eq!(
        body["message"],
        "payment provider returned status 400: 200.300.404"
    );
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_details_and_omit_missing_trace() {
    let error = Error::conflict("slot already booked")
        .with_details(json!({ "conflicts": [{ "date": "2025-09-20" }] }));

    let (status, header, body) = envelope_of(&error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(header.is_none());
    assert_eq!(body["message"], "slot already booked");
    assert_eq!(body["data"]["details"]["conflicts"][0]["date"], "2025-09-20");
    assert!(body["data"].get("traceId").is_none());
}

#[rstest]
fn from_actix_error_is_redacted_internal_error() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}

#[actix_web::test]
async fn malformed_json_bodies_become_invalid_request_envelopes() {
    use actix_web::{App, HttpResponse, test, web};

    let app = test::init_service(App::new().app_data(json_config()).route(
        "/",
        web::post().to(|_: web::Json<Value>| async { HttpResponse::Ok().finish() }),
    ))
    .await;
    let req = test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], false);
    assert_eq!(body["data"]["code"], "invalid_request");
}

//! HTTP surface over the real services and in-memory adapters.

use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use backend::Trace;
use backend::domain::{PartyRole, TRACE_ID_HEADER, UserId};
use backend::inbound::http::error::{json_config, path_config, query_config};
use backend::inbound::http::state::PaymentRedirectUrls;
use backend::inbound::http::test_utils::{
    SEED_SESSION_PATH, seed_session_route, session_cookie, test_session_middleware,
};
use backend::inbound::http::{bookings, payments, reschedules, talents};
use backend::test_support::{Marketplace, StubPaymentGateway};
use rstest::rstest;
use serde_json::{Value, json};

fn redirects() -> PaymentRedirectUrls {
    PaymentRedirectUrls {
        success: "https://app.example/pay/success".to_owned(),
        failure: "https://app.example/pay/failure".to_owned(),
        error: "https://app.example/pay/error".to_owned(),
    }
}

async fn init(
    market: &Marketplace,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(market.http_state(redirects())))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .wrap(test_session_middleware())
            .wrap(Trace)
            .route(SEED_SESSION_PATH, seed_session_route())
            .service(
                web::scope("/api/v1")
                    .service(bookings::create_booking)
                    .service(bookings::list_bookings)
                    .service(bookings::booking_details)
                    .service(bookings::set_booking_status)
                    .service(reschedules::request_reschedule)
                    .service(reschedules::approve_reschedule)
                    .service(reschedules::reject_reschedule)
                    .service(payments::create_checkout)
                    .service(payments::payment_status)
                    .service(payments::hyperpay_return)
                    .service(talents::busy_slots),
            ),
    )
    .await
}

async fn sign_in<S>(app: &S, user_id: UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let uri = SEED_SESSION_PATH.replace("{user_id}", &user_id.to_string());
    let response = test::call_service(app, test::TestRequest::get().uri(&uri).to_request()).await;
    session_cookie(&response).expect("session cookie issued")
}

async fn post_json<S>(
    app: &S,
    cookie: &Cookie<'static>,
    uri: &str,
    body: Value,
) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri(uri)
        .cookie(cookie.clone())
        .set_json(body)
        .to_request();
    let response = test::call_service(app, request).await;
    let status = response.status();
    (status, test::read_body_json(response).await)
}

#[rstest]
#[actix_rt::test]
async fn booking_round_trip_through_the_envelope() {
    let market = Marketplace::new();
    let client = market.register(PartyRole::Client, "Sara");
    let talent = market.register(PartyRole::Talent, "Omar");
    let app = init(&market).await;
    let client_cookie = sign_in(&app, client.user_id).await;
    let talent_cookie = sign_in(&app, talent.user_id).await;

    let (status, created) = post_json(
        &app,
        &client_cookie,
        "/api/v1/bookings",
        json!({
            "talentId": talent.id,
            "slotsByDate": { "2025-09-20": ["09:00-10:00", "10:00-11:00"] },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], true);
    assert_eq!(created["message"], "Booking created");
    assert_eq!(created["data"]["booking"]["status"], "pending");
    let booking_id = created["data"]["booking"]["id"].as_str().expect("id").to_owned();

    let (status, accepted) = post_json(
        &app,
        &talent_cookie,
        "/api/v1/bookings/status",
        json!({ "role": "talent", "bookingId": booking_id, "status": "accepted" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["message"], "Booking accepted");

    let request = test::TestRequest::get()
        .uri("/api/v1/bookings?role=client&status=accepted")
        .cookie(client_cookie.clone())
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(page["data"]["totalRecords"], 1);
    assert_eq!(
        page["data"]["bookings"][0]["slots"],
        json!([{ "bookingDate": "2025-09-20", "bookingTimes": ["09:00 - 11:00"] }])
    );
}

#[rstest]
#[actix_rt::test]
async fn domain_errors_use_the_error_envelope() {
    let market = Marketplace::new();
    let client = market.register(PartyRole::Client, "Sara");
    let talent = market.register(PartyRole::Talent, "Omar");
    let app = init(&market).await;
    let cookie = sign_in(&app, client.user_id).await;
    let body = json!({
        "talentId": talent.id,
        "slotsByDate": { "2025-09-20": ["09:00-10:00"] },
    });
    post_json(&app, &cookie, "/api/v1/bookings", body.clone()).await;

    let request = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .cookie(cookie)
        .set_json(body)
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let error: Value = test::read_body_json(response).await;
    assert_eq!(error["status"], false);
    assert_eq!(error["data"]["code"], "conflict");
    assert_eq!(error["data"]["message"], "slot already booked");
    assert_eq!(
        error["data"]["details"]["conflicts"],
        json!([{ "date": "2025-09-20", "time": "09:00 - 10:00" }])
    );
}

#[rstest]
#[actix_rt::test]
async fn requests_without_a_session_are_unauthorised() {
    let market = Marketplace::new();
    let app = init(&market).await;

    let request = test::TestRequest::get().uri("/api/v1/bookings").to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_rt::test]
async fn checkout_and_provider_return_redirect_to_success() {
    let market = Marketplace::new();
    let client = market.register(PartyRole::Client, "Sara");
    let talent = market.register(PartyRole::Talent, "Omar");
    let app = init(&market).await;
    let cookie = sign_in(&app, client.user_id).await;
    let (_, created) = post_json(
        &app,
        &cookie,
        "/api/v1/bookings",
        json!({
            "talentId": talent.id,
            "slotsByDate": { "2025-09-20": ["09:00-10:00"] },
        }),
    )
    .await;
    let booking_id = created["data"]["booking"]["id"].as_str().expect("id").to_owned();

    let (status, checkout) = post_json(
        &app,
        &cookie,
        "/api/v1/payments/checkout",
        json!({ "bookingId": booking_id, "amount": "150", "merchantTransactionId": "txn-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checkout["data"]["booking"]["payment"]["status"], "pending");

    let uri = format!(
        "/api/v1/payments/hyperpay/return?resourcePath=/v1/checkouts/{}/payment",
        StubPaymentGateway::checkout_id(1)
    );
    let response = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header");
    assert_eq!(
        location,
        format!("https://app.example/pay/success?bookingId={booking_id}")
    );
}

#[rstest]
#[actix_rt::test]
async fn busy_slots_merge_the_talent_calendar() {
    let market = Marketplace::new();
    let client = market.register(PartyRole::Client, "Sara");
    let talent = market.register(PartyRole::Talent, "Omar");
    let app = init(&market).await;
    let cookie = sign_in(&app, client.user_id).await;
    post_json(
        &app,
        &cookie,
        "/api/v1/bookings",
        json!({
            "talentId": talent.id,
            "slotsByDate": {
                "2025-09-20": ["13:00-14:00", "14:00-15:00"],
                "2025-09-25": ["09:00-10:00"],
            },
        }),
    )
    .await;

    let uri = format!("/api/v1/talents/{}/busy-slots?from=2025-09-19&to=2025-09-21", talent.id);
    let request = test::TestRequest::get().uri(&uri).cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(
        body["data"],
        json!([{ "bookingDate": "2025-09-20", "bookingTimes": ["13:00 - 15:00"] }])
    );
}

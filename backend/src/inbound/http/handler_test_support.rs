//! Harness for handler unit tests: mocked driving ports behind a real app.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};

use crate::domain::UserId;
use crate::domain::ports::{
    MockBookingCommand, MockBookingQuery, MockPaymentCommand, MockRescheduleCommand,
};
use crate::inbound::http::error::{json_config, path_config, query_config};
use crate::inbound::http::state::{HttpState, PaymentRedirectUrls};
use crate::inbound::http::test_utils::{
    SEED_SESSION_PATH, seed_session_route, session_cookie, test_session_middleware,
};
use crate::inbound::http::{bookings, payments, reschedules, talents};

/// Mocks for every driving port; unconfigured mocks panic when called.
#[derive(Default)]
pub(crate) struct Ports {
    pub bookings: MockBookingCommand,
    pub queries: MockBookingQuery,
    pub reschedules: MockRescheduleCommand,
    pub payments: MockPaymentCommand,
}

pub(crate) fn redirects() -> PaymentRedirectUrls {
    PaymentRedirectUrls {
        success: "https://app.example/pay/success".to_owned(),
        failure: "https://app.example/pay/failure?lang=en".to_owned(),
        error: "https://app.example/pay/error".to_owned(),
    }
}

pub(crate) fn test_app(
    ports: Ports,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(
        Arc::new(ports.bookings),
        Arc::new(ports.queries),
        Arc::new(ports.reschedules),
        Arc::new(ports.payments),
        redirects(),
    );
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(test_session_middleware())
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
        )
}

/// Sign `user_id` in and return the session cookie.
pub(crate) async fn sign_in<S>(app: &S, user_id: UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let uri = SEED_SESSION_PATH.replace("{user_id}", &user_id.to_string());
    let response = test::call_service(app, test::TestRequest::get().uri(&uri).to_request()).await;
    session_cookie(&response).expect("session cookie issued")
}

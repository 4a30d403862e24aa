//! Payment HTTP handlers.
//!
//! ```text
//! POST /api/v1/payments/checkout
//! GET  /api/v1/payments/status?checkoutId=..&bookingId=..
//! GET  /api/v1/payments/hyperpay/return?resourcePath=..
//! ```
//!
//! The return endpoint is hit by the shopper's browser after the hosted
//! payment page; it never renders JSON and always answers with a redirect.

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateCheckoutRequest, PaymentStatusRequest};
use crate::domain::{BookingId, Error, PaymentRedirect, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::booking_dto::{BookingDto, BookingEnvelopeDto, PaymentStatusDto};
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, PaymentRedirectUrls};
use crate::inbound::http::validation::{
    FieldName, parse_amount, parse_id, require, require_text,
};

/// Request payload for opening a checkout.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutBody {
    #[schema(format = Uuid)]
    pub booking_id: Option<String>,
    /// Decimal amount as a string or number, at most two decimals.
    #[schema(value_type = String, example = "150.00")]
    pub amount: Option<Value>,
    pub merchant_transaction_id: Option<String>,
}

/// Query parameters for polling a checkout.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PaymentStatusQuery {
    pub checkout_id: Option<String>,
    pub booking_id: Option<String>,
}

/// Query parameters of the provider's shopper redirect.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct HyperPayReturnQuery {
    /// Provider path such as `/v1/checkouts/{id}/payment`.
    pub resource_path: Option<String>,
}

fn amount_text(amount: Value) -> Option<String> {
    match amount {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_checkout_body(
    body: CreateCheckoutBody,
    user_id: UserId,
) -> Result<CreateCheckoutRequest, Error> {
    let booking_id = require_text(body.booking_id, FieldName::new("bookingId"))?;
    let amount = require(body.amount, FieldName::new("amount"))?;
    let merchant_transaction_id = require_text(
        body.merchant_transaction_id,
        FieldName::new("merchantTransactionId"),
    )?;
    let amount = amount_text(amount).unwrap_or_default();
    Ok(CreateCheckoutRequest {
        user_id,
        booking_id: parse_id(&booking_id, FieldName::new("bookingId"))?,
        amount: parse_amount(&amount, FieldName::new("amount"))?,
        merchant_transaction_id,
    })
}

fn with_booking_id(base: &str, booking_id: BookingId) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}bookingId={booking_id}")
}

/// Browser target for a reconciliation verdict.
pub(crate) fn redirect_location(urls: &PaymentRedirectUrls, redirect: PaymentRedirect) -> String {
    match redirect {
        PaymentRedirect::Success(booking_id) => with_booking_id(&urls.success, booking_id),
        PaymentRedirect::Failure(booking_id) => with_booking_id(&urls.failure, booking_id),
        PaymentRedirect::Error => urls.error.clone(),
    }
}

fn found(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// Open a provider checkout for a booking the caller placed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/checkout",
    request_body = CreateCheckoutBody,
    responses(
        (status = 200, description = "Checkout created", body = Envelope<BookingEnvelopeDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (
            status = 403,
            description = "Caller is not the booking's client",
            body = ErrorEnvelopeSchema
        ),
        (status = 404, description = "Booking not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Booking already paid", body = ErrorEnvelopeSchema),
        (status = 500, description = "Payment provider failure", body = ErrorEnvelopeSchema)
    ),
    tags = ["payments"],
    operation_id = "createCheckout",
    security(("SessionCookie" = []))
)]
#[post("/payments/checkout")]
pub async fn create_checkout(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCheckoutBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_checkout_body(payload.into_inner(), user_id)?;
    let booking = state.payments.create_checkout(request).await?;
    Ok(Envelope::ok(
        "Checkout created",
        BookingEnvelopeDto {
            booking: BookingDto::from(booking),
        },
    )
    .respond())
}

/// Poll the provider for a checkout result and reconcile the booking.
#[utoipa::path(
    get,
    path = "/api/v1/payments/status",
    params(PaymentStatusQuery),
    responses(
        (status = 200, description = "Payment status", body = Envelope<PaymentStatusDto>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (
            status = 403,
            description = "Caller is not the booking's client",
            body = ErrorEnvelopeSchema
        ),
        (status = 404, description = "Booking not found", body = ErrorEnvelopeSchema),
        (status = 500, description = "Payment provider failure", body = ErrorEnvelopeSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentStatus",
    security(("SessionCookie" = []))
)]
#[get("/payments/status")]
pub async fn payment_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PaymentStatusQuery>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let query = query.into_inner();
    let checkout_id = require_text(query.checkout_id, FieldName::new("checkoutId"))?;
    let booking_id = require_text(query.booking_id, FieldName::new("bookingId"))?;
    let response = state
        .payments
        .payment_status(PaymentStatusRequest {
            user_id,
            booking_id: parse_id(&booking_id, FieldName::new("bookingId"))?,
            checkout_id,
        })
        .await?;
    Ok(Envelope::ok(
        "Payment status fetched",
        PaymentStatusDto {
            payment_result: response.payment_result.into(),
            booking: response.booking.into(),
        },
    )
    .respond())
}

/// Provider shopper redirect; reconciles and forwards to the app's result page.
#[utoipa::path(
    get,
    path = "/api/v1/payments/hyperpay/return",
    params(HyperPayReturnQuery),
    responses(
        (status = 302, description = "Redirect to the success, failure or error page",
            headers(("Location" = String, description = "Result page")))
    ),
    tags = ["payments"],
    operation_id = "hyperpayReturn",
    security([])
)]
#[get("/payments/hyperpay/return")]
pub async fn hyperpay_return(
    state: web::Data<HttpState>,
    query: web::Query<HyperPayReturnQuery>,
) -> HttpResponse {
    let urls = &state.redirects;
    let Some(resource_path) = query
        .into_inner()
        .resource_path
        .filter(|path| !path.trim().is_empty())
    else {
        warn!("payment return without resourcePath");
        return found(&urls.error);
    };
    match state.payments.handle_return(resource_path).await {
        Ok(redirect) => found(&redirect_location(urls, redirect)),
        Err(error) => {
            warn!(code = ?error.code(), message = error.message(), "payment return failed");
            found(&urls.error)
        }
    }
}

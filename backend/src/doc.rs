//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: booking, reschedule, payment and talent endpoints plus the
//!   health probes
//! - **Schemas**: the error envelope wrappers ([`ErrorSchema`],
//!   [`ErrorCodeSchema`], [`ErrorEnvelopeSchema`]) and the booking DTOs
//! - **Security**: Session cookie authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::booking_dto::{
    BookingDetailsDto, BookingDto, BookingEnvelopeDto, BookingPageDto, BookingSlotDto,
    BookingSummaryDto, CreatedBookingDto, PaymentDto, PaymentResultDto, PaymentStatusDto,
    RescheduleDto, RescheduleEnvelopeDto, SlotGroupDto, SlotPairDto,
};
use crate::inbound::http::bookings::{CreateBookingBody, BookingDetailsBody, SetBookingStatusBody};
use crate::inbound::http::payments::CreateCheckoutBody;
use crate::inbound::http::reschedules::{DecideRescheduleBody, RequestRescheduleBody};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorEnvelopeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Private session cookie carrying the user id issued at sign-in.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Talent booking API",
        description = "Bookings, reschedules and HyperPay checkouts for the talent marketplace.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::list_bookings,
        crate::inbound::http::bookings::booking_details,
        crate::inbound::http::bookings::set_booking_status,
        crate::inbound::http::reschedules::request_reschedule,
        crate::inbound::http::reschedules::approve_reschedule,
        crate::inbound::http::reschedules::reject_reschedule,
        crate::inbound::http::payments::create_checkout,
        crate::inbound::http::payments::payment_status,
        crate::inbound::http::payments::hyperpay_return,
        crate::inbound::http::talents::busy_slots,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ErrorEnvelopeSchema,
        CreateBookingBody,
        BookingDetailsBody,
        SetBookingStatusBody,
        RequestRescheduleBody,
        DecideRescheduleBody,
        CreateCheckoutBody,
        BookingDto,
        PaymentDto,
        BookingSlotDto,
        SlotPairDto,
        SlotGroupDto,
        CreatedBookingDto,
        BookingSummaryDto,
        BookingDetailsDto,
        BookingPageDto,
        BookingEnvelopeDto,
        RescheduleDto,
        RescheduleEnvelopeDto,
        PaymentResultDto,
        PaymentStatusDto,
    )),
    tags(
        (name = "bookings", description = "Booking creation, listing and lifecycle"),
        (name = "reschedules", description = "Proposals to move a booked slot"),
        (name = "payments", description = "HyperPay checkout and reconciliation"),
        (name = "talents", description = "Talent calendars"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema field structure and path registration.

    use super::*;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_uses_camel_case() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn openapi_registers_booking_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/bookings",
            "/api/v1/bookings/details",
            "/api/v1/bookings/status",
            "/api/v1/bookings/reschedule",
            "/api/v1/bookings/reschedule/{id}/approve",
            "/api/v1/payments/checkout",
            "/api/v1/payments/hyperpay/return",
            "/api/v1/talents/{id}/busy-slots",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn bookings_path_carries_get_and_post() {
        let doc = ApiDoc::openapi();
        let item = doc.paths.paths.get("/api/v1/bookings").expect("bookings path");
        assert!(item.get.is_some());
        assert!(item.post.is_some());
    }
}

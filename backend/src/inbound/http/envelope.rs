//! `{status, message, data}` response envelope shared by every endpoint.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

/// Uniform JSON wrapper for success and failure responses.
///
/// # Examples
/// ```
/// use backend::inbound::http::envelope::Envelope;
/// use serde_json::json;
///
/// let body = serde_json::to_value(Envelope::ok("Booking created", json!({ "id": 1 })))
///     .expect("serialise");
/// assert_eq!(body["status"], true);
/// assert_eq!(body["data"]["id"], 1);
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    /// `true` on success, `false` on failure.
    pub status: bool,
    /// Human-readable summary.
    pub message: String,
    /// Endpoint-specific payload.
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Successful envelope around `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
        }
    }

    /// `200 OK` response carrying the envelope.
    pub fn respond(self) -> HttpResponse {
        self.respond_with(StatusCode::OK)
    }

    /// Response with an explicit status carrying the envelope.
    pub fn respond_with(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

//! HTTP adapter mapping for domain errors.
//!
//! Domain errors become `{status: false, message, data: {code, traceId,
//! details}}` envelopes. Internal errors are redacted; upstream errors keep
//! the provider text, which never contains credentials.

use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use serde::Serialize;
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::UpstreamError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        error!(message = error.message(), trace_id = ?error.trace_id(), "internal error");
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    status: bool,
    message: &'a str,
    data: &'a Error,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        let visible = redact_if_internal(self);
        builder.json(ErrorEnvelope {
            status: false,
            message: visible.message(),
            data: &visible,
        })
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

fn extractor_error(
    kind: &str,
    detail: &dyn std::fmt::Display,
    _req: &HttpRequest,
) -> actix_web::Error {
    Error::invalid_request(format!("invalid {kind}: {detail}")).into()
}

/// JSON body extractor settings answering malformed bodies with a 400 envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, req| extractor_error("request body", &err, req))
}

/// Query string extractor settings answering bad parameters with a 400 envelope.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| extractor_error("query", &err, req))
}

/// Path extractor settings answering bad segments with a 400 envelope.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| extractor_error("path", &err, req))
}

#[cfg(test)]
mod tests;

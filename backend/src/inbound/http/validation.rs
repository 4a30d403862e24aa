//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure is a `400 invalid_request` whose details name the offending
//! field and a stable code so clients can highlight the right input.

use std::str::FromStr;

use chrono::NaiveDate;
use pagination::PageRequest;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{BookingStatus, Error, PartyRole, TimeRange};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidDate,
    InvalidTimeRange,
    InvalidRole,
    InvalidStatus,
    InvalidAmount,
    InvalidPage,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidDate => "invalid_date",
            Self::InvalidTimeRange => "invalid_time_range",
            Self::InvalidRole => "invalid_role",
            Self::InvalidStatus => "invalid_status",
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidPage => "invalid_page",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

fn invalid(field: FieldName, code: ErrorCode, message: String, value: Option<&str>) -> Error {
    let mut details = json!({ "field": field.as_str(), "code": code.as_str() });
    if let Some(value) = value {
        details["value"] = json!(value);
    }
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    invalid(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {}", field.as_str()),
        None,
    )
}

/// Value of a mandatory field, treating blank strings as missing.
pub(crate) fn require_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| missing_field_error(field))
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a UUID-backed identifier.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: From<Uuid>,
{
    Uuid::parse_str(value.trim()).map(T::from).map_err(|_| {
        invalid(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            Some(value),
        )
    })
}

pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            field,
            ErrorCode::InvalidDate,
            format!("{} must be a YYYY-MM-DD date", field.as_str()),
            Some(value),
        )
    })
}

pub(crate) fn parse_time_range(value: &str, field: FieldName) -> Result<TimeRange, Error> {
    TimeRange::from_str(value.trim()).map_err(|error| {
        invalid(
            field,
            ErrorCode::InvalidTimeRange,
            error.to_string(),
            Some(value),
        )
    })
}

pub(crate) fn parse_role(value: &str, field: FieldName) -> Result<PartyRole, Error> {
    PartyRole::from_str(value).map_err(|_| {
        invalid(
            field,
            ErrorCode::InvalidRole,
            format!("{} must be client or talent", field.as_str()),
            Some(value),
        )
    })
}

pub(crate) fn parse_status_filter(value: &str, field: FieldName) -> Result<BookingStatus, Error> {
    BookingStatus::from_str(value.trim()).map_err(|error| {
        invalid(field, ErrorCode::InvalidStatus, error.to_string(), Some(value))
    })
}

pub(crate) fn parse_amount(value: &str, field: FieldName) -> Result<crate::domain::Money, Error> {
    value.parse().map_err(|error: crate::domain::MoneyParseError| {
        invalid(field, ErrorCode::InvalidAmount, error.to_string(), Some(value))
    })
}

pub(crate) fn parse_page(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::from_query(page, limit).map_err(|error| {
        invalid(
            FieldName::new("page"),
            ErrorCode::InvalidPage,
            error.to_string(),
            None,
        )
    })
}

//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request DTOs keep identifiers and dates as raw strings so failures can
//! name the offending field. These helpers turn them into domain values and
//! build `invalid_request` errors with `{ field, code, value? }` details.

use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::{Error, IdParseError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidDate,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidDate => "invalid_date",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn invalid_date_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a YYYY-MM-DD date"))
        .with_value(ErrorCode::InvalidDate, value)
}

/// Unwrap a required field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a typed identifier.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = IdParseError>,
{
    value
        .parse::<T>()
        .map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_required_id<T>(value: Option<String>, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = IdParseError>,
{
    parse_id(&require(value, field)?, field)
}

pub(crate) fn parse_optional_id<T>(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<T>, Error>
where
    T: FromStr<Err = IdParseError>,
{
    value.map(|raw| parse_id(&raw, field)).transpose()
}

pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid_date_error(field, value))
}

pub(crate) fn parse_optional_date(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<NaiveDate>, Error> {
    value.map(|raw| parse_date(&raw, field)).transpose()
}

/// Parse an optional enum whose `FromStr` already reports a domain error.
pub(crate) fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, Error>
where
    T: FromStr<Err = Error>,
{
    value.map(|raw| raw.parse::<T>()).transpose()
}

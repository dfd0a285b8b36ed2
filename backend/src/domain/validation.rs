//! Field-level validation helpers shared by domain constructors.
//!
//! Every failure becomes an `invalid_request` [`Error`] whose details name
//! the offending field (camelCase, matching the wire format) and a stable
//! snake_case code.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use super::{Error, Money};

/// Build an `invalid_request` error describing one field.
pub fn field_error(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

/// Like [`field_error`] but echoes the rejected value.
pub fn field_value_error(
    field: &str,
    code: &str,
    value: impl Into<String>,
    message: impl Into<String>,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
        "value": value.into(),
    }))
}

/// Trim `value` and require `min..=max` characters.
pub fn bounded_text(field: &str, value: &str, min: usize, max: usize) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(field_error(
            field,
            "missing_field",
            format!("{field} must not be empty"),
        ));
    }
    let length = trimmed.chars().count();
    if length < min {
        return Err(field_error(
            field,
            "too_short",
            format!("{field} must be at least {min} characters"),
        ));
    }
    if length > max {
        return Err(field_error(
            field,
            "too_long",
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Trim optional text; blank input becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => bounded_text(field, text, 1, max).map(Some),
    }
}

/// Require a strictly positive quantity.
pub fn positive_quantity(field: &str, quantity: u32) -> Result<u32, Error> {
    if quantity == 0 {
        return Err(field_error(
            field,
            "non_positive_quantity",
            format!("{field} must be greater than zero"),
        ));
    }
    Ok(quantity)
}

/// Reject negative amounts.
pub fn non_negative_amount(field: &str, amount: Money) -> Result<Money, Error> {
    if amount.is_negative() {
        return Err(field_error(
            field,
            "negative_amount",
            format!("{field} must not be negative"),
        ));
    }
    Ok(amount)
}

/// Validate a phone number: optional leading `+` then 10 to 15 digits.
pub fn phone_number(field: &str, value: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let valid = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    if !valid {
        return Err(field_value_error(
            field,
            "invalid_phone",
            trimmed,
            format!("{field} must contain 10 to 15 digits"),
        ));
    }
    Ok(trimmed.to_owned())
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validate an email address and normalise it to lowercase.
pub fn email_address(field: &str, value: &str) -> Result<String, Error> {
    let normalised = value.trim().to_lowercase();
    if normalised.len() > 254 || !email_regex().is_match(&normalised) {
        return Err(field_value_error(
            field,
            "invalid_email",
            value.trim(),
            format!("{field} must be a valid email address"),
        ));
    }
    Ok(normalised)
}

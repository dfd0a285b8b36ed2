//! Idempotency header parsing and replay-aware responses.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::HeaderMap;
use serde::Serialize;

use crate::domain::{Error, IdempotencyKey, IdempotencyKeyValidationError, Idempotent};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extract the idempotency key from request headers.
pub fn extract_idempotency_key(
    headers: &HeaderMap,
) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key_str = header_value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;

    IdempotencyKey::new(key_str).map(Some)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    match err {
        IdempotencyKeyValidationError::EmptyKey => {
            Error::invalid_request("idempotency-key header must not be empty")
        }
        IdempotencyKeyValidationError::InvalidKey => {
            Error::invalid_request("idempotency-key header must be a valid uuid")
        }
    }
}

/// Extract the key, mapping validation failures to `invalid_request`.
pub fn idempotency_key(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, Error> {
    extract_idempotency_key(headers).map_err(map_idempotency_key_error)
}

/// Entity body extended with the replay flag.
#[derive(Debug, Serialize)]
pub struct Replayable<T> {
    #[serde(flatten)]
    value: T,
    replayed: bool,
}

/// Respond with `created` for fresh results and `200 OK` for replays.
pub fn replayable_response<T: Serialize>(
    result: Idempotent<T>,
    created: StatusCode,
) -> HttpResponse {
    let status = if result.replayed {
        StatusCode::OK
    } else {
        created
    };
    HttpResponse::build(status).json(Replayable {
        value: result.value,
        replayed: result.replayed,
    })
}

//! Client-supplied idempotency keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Reasons an `Idempotency-Key` header is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdempotencyKeyValidationError {
    /// Header present but blank.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// Header is not a canonical UUID.
    #[error("idempotency key must be a valid UUID")]
    InvalidKey,
}

/// Validated idempotency key.
///
/// ```
/// # use backend::domain::idempotency::IdempotencyKey;
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").expect("uuid");
/// assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// assert!(IdempotencyKey::new(" 550e8400-e29b-41d4-a716-446655440000").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Parse a header value. Surrounding whitespace is rejected.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if raw.trim() != raw {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| IdempotencyKeyValidationError::InvalidKey)
    }

    /// Fresh random key, mostly for tests.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

//! Canonical payload hashing.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::Error;

/// Failure producing a payload hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadHashError {
    /// Raw bytes were not 32 long.
    #[error("payload hash must be 32 bytes, got {actual}")]
    InvalidLength {
        /// Observed length.
        actual: usize,
    },
    /// The canonical form could not be serialised.
    #[error("failed to serialise canonical payload: {message}")]
    Serialization {
        /// Serialiser message.
        message: String,
    },
}

/// SHA-256 digest of a canonical JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Wrap a digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Wrap a digest held in a slice.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PayloadHashError> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| PayloadHashError::InvalidLength {
                actual: bytes.len(),
            })
    }

    /// Raw digest.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a JSON value after sorting object keys recursively.
///
/// ```
/// # use backend::domain::idempotency::canonicalize_and_hash;
/// # use serde_json::json;
/// let a = canonicalize_and_hash(&json!({"b": [1, {"y": 1, "x": 2}], "a": 1})).expect("hash");
/// let b = canonicalize_and_hash(&json!({"a": 1, "b": [1, {"x": 2, "y": 1}]})).expect("hash");
/// assert_eq!(a, b);
/// ```
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let bytes = serde_json::to_vec(&canonical(value)).map_err(|err| {
        PayloadHashError::Serialization {
            message: err.to_string(),
        }
    })?;
    Ok(PayloadHash(Sha256::digest(&bytes).into()))
}

/// Serialise any request payload and hash it, mapping failures to internal
/// errors.
pub fn hash_payload<T: Serialize>(payload: &T) -> Result<PayloadHash, Error> {
    let value = serde_json::to_value(payload)
        .map_err(|err| Error::internal(format!("failed to serialise idempotency payload: {err}")))?;
    canonicalize_and_hash(&value)
        .map_err(|err| Error::internal(format!("failed to hash idempotency payload: {err}")))
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), canonical(inner)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

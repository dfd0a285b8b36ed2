//! Stored idempotency records.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{IdempotencyKey, MutationType, PayloadHash};

/// A claimed key together with the response it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    /// Client key.
    pub key: IdempotencyKey,
    /// Operation scope.
    pub mutation_type: MutationType,
    /// Hash of the canonical request payload.
    pub payload_hash: PayloadHash,
    /// Serialised response, or a state marker while the request runs.
    pub response_snapshot: Value,
    /// Claim time; drives expiry.
    pub created_at: DateTime<Utc>,
}

/// Lookup by key and scope, compared against a payload hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyLookupQuery {
    /// Client key.
    pub key: IdempotencyKey,
    /// Operation scope.
    pub mutation_type: MutationType,
    /// Hash of the incoming payload.
    pub payload_hash: PayloadHash,
}

/// Result of [`IdempotencyLookupQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum IdempotencyLookupResult {
    /// Key unused in this scope.
    NotFound,
    /// Key used with the same payload.
    MatchingPayload(IdempotencyRecord),
    /// Key used with a different payload.
    ConflictingPayload(IdempotencyRecord),
}

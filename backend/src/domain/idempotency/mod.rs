//! Idempotent replay for money-moving mutations.
//!
//! Clients may send an `Idempotency-Key` header (a UUID) with counter sale
//! creation and bill payments. The request payload is canonicalised (object
//! keys sorted recursively, compact JSON) and hashed with SHA-256:
//!
//! - same key, same payload: the stored response is replayed;
//! - same key, different payload: the request is rejected as a conflict;
//! - records older than the configured TTL are purged and no longer match.

mod config;
mod guard;
mod key;
mod mutation_type;
mod payload;
mod record;

pub use config::{IDEMPOTENCY_TTL_HOURS_ENV, IdempotencyConfig};
pub use guard::{IdempotencyGuard, Idempotent, IdempotentRequest};
pub use key::{IdempotencyKey, IdempotencyKeyValidationError};
pub use mutation_type::{MutationType, ParseMutationTypeError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash, hash_payload};
pub use record::{IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord};

#[cfg(test)]
mod tests;

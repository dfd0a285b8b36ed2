//! Port for idempotency record storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::define_port_error;
use crate::domain::idempotency::{
    IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
};

define_port_error! {
    /// Errors raised by idempotency store adapters.
    pub enum IdempotencyStoreError {
        /// Storage could not be reached.
        Connection { message: String } => "idempotency store connection failed: {message}",
        /// A query or mutation failed.
        Query { message: String } => "idempotency store query failed: {message}",
        /// The key is already claimed in this scope.
        DuplicateKey { message: String } => "idempotency key already exists: {message}",
    }
}

/// Records keyed by `(key, mutation type)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Find the record for a key and compare payload hashes.
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyStoreError>;
    /// Insert an in-progress record; `DuplicateKey` when already claimed.
    async fn claim(&self, record: &IdempotencyRecord) -> Result<(), IdempotencyStoreError>;
    /// Store the final response for a claimed key.
    async fn complete(
        &self,
        query: &IdempotencyLookupQuery,
        response: &Value,
    ) -> Result<(), IdempotencyStoreError>;
    /// Drop a claim after the operation failed.
    async fn release(&self, query: &IdempotencyLookupQuery) -> Result<(), IdempotencyStoreError>;
    /// Delete records created before `cutoff`, returning how many went.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, IdempotencyStoreError>;
}

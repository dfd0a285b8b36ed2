//! Idempotency records scoped by key and mutation type.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::idempotency::{
    IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
};
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};
use crate::domain::{IdempotencyKey, MutationType};

type Scope = (IdempotencyKey, MutationType);

/// Records held in a map keyed by `(key, mutation type)`.
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    records: RwLock<HashMap<Scope, IdempotencyRecord>>,
}

impl MemoryIdempotencyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn scope(query: &IdempotencyLookupQuery) -> Scope {
    (query.key, query.mutation_type)
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyStoreError> {
        let records = self.records.read().await;
        Ok(match records.get(&scope(query)) {
            None => IdempotencyLookupResult::NotFound,
            Some(record) if record.payload_hash == query.payload_hash => {
                IdempotencyLookupResult::MatchingPayload(record.clone())
            }
            Some(record) => IdempotencyLookupResult::ConflictingPayload(record.clone()),
        })
    }

    async fn claim(&self, record: &IdempotencyRecord) -> Result<(), IdempotencyStoreError> {
        let mut records = self.records.write().await;
        let scope = (record.key, record.mutation_type);
        if records.contains_key(&scope) {
            return Err(IdempotencyStoreError::duplicate_key(format!(
                "{} for {}",
                record.key, record.mutation_type
            )));
        }
        records.insert(scope, record.clone());
        Ok(())
    }

    async fn complete(
        &self,
        query: &IdempotencyLookupQuery,
        response: &Value,
    ) -> Result<(), IdempotencyStoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&scope(query)) {
            Some(record) if record.payload_hash == query.payload_hash => {
                record.response_snapshot = response.clone();
                Ok(())
            }
            _ => Err(IdempotencyStoreError::query(format!(
                "no claim for {} to complete",
                query.key
            ))),
        }
    }

    async fn release(&self, query: &IdempotencyLookupQuery) -> Result<(), IdempotencyStoreError> {
        let mut records = self.records.write().await;
        if records
            .get(&scope(query))
            .is_some_and(|r| r.payload_hash == query.payload_hash)
        {
            records.remove(&scope(query));
        }
        Ok(())
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, IdempotencyStoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.created_at >= cutoff);
        let purged = u64::try_from(before - records.len()).unwrap_or(u64::MAX);
        if purged > 0 {
            debug!(purged, %cutoff, "purged expired idempotency records");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    //! Scope, conflict, and expiry behaviour of the in-memory store.

    use chrono::Duration;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::idempotency::canonicalize_and_hash;

    #[fixture]
    fn record() -> IdempotencyRecord {
        IdempotencyRecord {
            key: IdempotencyKey::random(),
            mutation_type: MutationType::CounterSales,
            payload_hash: canonicalize_and_hash(&json!({ "a": 1 })).expect("hash"),
            response_snapshot: json!({ "state": "claimed" }),
            created_at: Utc::now(),
        }
    }

    fn query(record: &IdempotencyRecord) -> IdempotencyLookupQuery {
        IdempotencyLookupQuery {
            key: record.key,
            mutation_type: record.mutation_type,
            payload_hash: record.payload_hash,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn second_claim_is_a_duplicate(record: IdempotencyRecord) {
        let store = MemoryIdempotencyStore::new();
        store.claim(&record).await.expect("claim");
        let err = store.claim(&record).await.expect_err("duplicate");
        assert!(matches!(err, IdempotencyStoreError::DuplicateKey { .. }));

        let mut other_scope = record.clone();
        other_scope.mutation_type = MutationType::BillPayments;
        store.claim(&other_scope).await.expect("separate scope");
    }

    #[rstest]
    #[tokio::test]
    async fn completed_response_is_found_and_mismatch_conflicts(record: IdempotencyRecord) {
        let store = MemoryIdempotencyStore::new();
        store.claim(&record).await.expect("claim");
        store
            .complete(&query(&record), &json!({ "id": 7 }))
            .await
            .expect("complete");

        let found = store.lookup(&query(&record)).await.expect("lookup");
        let IdempotencyLookupResult::MatchingPayload(stored) = found else {
            panic!("expected a matching record");
        };
        assert_eq!(stored.response_snapshot, json!({ "id": 7 }));

        let mut different = query(&record);
        different.payload_hash = canonicalize_and_hash(&json!({ "a": 2 })).expect("hash");
        assert!(matches!(
            store.lookup(&different).await.expect("lookup"),
            IdempotencyLookupResult::ConflictingPayload(_)
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn release_and_purge_free_the_key(record: IdempotencyRecord) {
        let store = MemoryIdempotencyStore::new();
        store.claim(&record).await.expect("claim");
        store.release(&query(&record)).await.expect("release");
        assert_eq!(
            store.lookup(&query(&record)).await.expect("lookup"),
            IdempotencyLookupResult::NotFound
        );

        store.claim(&record).await.expect("reclaim");
        let purged = store
            .purge_expired(record.created_at + Duration::seconds(1))
            .await
            .expect("purge");
        assert_eq!(purged, 1);
    }
}

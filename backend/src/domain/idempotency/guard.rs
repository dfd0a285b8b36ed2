//! Claim, run, and replay orchestration around an idempotency store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{
    IdempotencyConfig, IdempotencyKey, IdempotencyLookupQuery, IdempotencyLookupResult,
    IdempotencyRecord, MutationType, PayloadHash,
};
use crate::domain::Error;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};

const STATE_KEY: &str = "__idempotency_state";
const STATE_IN_PROGRESS: &str = "in_progress";
const RACE_MAX_RETRIES: usize = 20;
const RACE_RETRY_DELAY: Duration = Duration::from_millis(25);

/// Inputs identifying one idempotent call.
#[derive(Debug, Clone, Copy)]
pub struct IdempotentRequest {
    /// Client key; `None` runs the operation without replay protection.
    pub key: Option<IdempotencyKey>,
    /// Operation scope.
    pub mutation_type: MutationType,
    /// Hash of the canonical request payload.
    pub payload_hash: PayloadHash,
}

/// Operation result tagged with whether it was replayed from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idempotent<T> {
    /// The response value.
    pub value: T,
    /// `true` when served from a stored record.
    pub replayed: bool,
}

impl<T> Idempotent<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            replayed: false,
        }
    }

    fn replay(value: T) -> Self {
        Self {
            value,
            replayed: true,
        }
    }
}

/// Runs mutations at most once per key and payload.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn IdempotencyStore>,
    clock: Arc<dyn Clock>,
    config: IdempotencyConfig,
}

impl IdempotencyGuard {
    /// Build a guard over `store`.
    pub fn new(
        store: Arc<dyn IdempotencyStore>,
        clock: Arc<dyn Clock>,
        config: IdempotencyConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run `operation` unless the key already produced a response.
    ///
    /// A failed operation releases its claim so the client may retry with
    /// the same key.
    pub async fn run<T, F, Fut>(
        &self,
        request: IdempotentRequest,
        operation: F,
    ) -> Result<Idempotent<T>, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let Some(key) = request.key else {
            return operation().await.map(Idempotent::fresh);
        };
        let now = self.clock.utc();
        self.store
            .purge_expired(self.cutoff(now))
            .await
            .map_err(map_store_error)?;

        let query = IdempotencyLookupQuery {
            key,
            mutation_type: request.mutation_type,
            payload_hash: request.payload_hash,
        };
        let claim = IdempotencyRecord {
            key,
            mutation_type: request.mutation_type,
            payload_hash: request.payload_hash,
            response_snapshot: json!({ STATE_KEY: STATE_IN_PROGRESS }),
            created_at: now,
        };
        match self.store.claim(&claim).await {
            Ok(()) => {}
            Err(IdempotencyStoreError::DuplicateKey { .. }) => return self.replay(&query).await,
            Err(err) => return Err(map_store_error(err)),
        }

        let value = match operation().await {
            Ok(value) => value,
            Err(err) => {
                if let Err(release_err) = self.store.release(&query).await {
                    warn!(%key, error = %release_err, "failed to release idempotency claim");
                }
                return Err(err);
            }
        };
        let snapshot = serde_json::to_value(&value)
            .map_err(|err| Error::internal(format!("failed to serialise response: {err}")))?;
        self.store
            .complete(&query, &snapshot)
            .await
            .map_err(map_store_error)?;
        Ok(Idempotent::fresh(value))
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.config.ttl())
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    async fn replay<T: DeserializeOwned>(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<Idempotent<T>, Error> {
        for attempt in 0..=RACE_MAX_RETRIES {
            let found = self.store.lookup(query).await.map_err(map_store_error)?;
            match found {
                IdempotencyLookupResult::ConflictingPayload(_) => {
                    warn!(
                        key = %query.key,
                        scope = %query.mutation_type,
                        "idempotency key reused with a different payload"
                    );
                    return Err(Error::conflict(
                        "idempotency key already used with a different payload",
                    ));
                }
                IdempotencyLookupResult::MatchingPayload(record)
                    if !in_progress(&record.response_snapshot) =>
                {
                    info!(
                        key = %query.key,
                        scope = %query.mutation_type,
                        "replaying idempotent response"
                    );
                    let value = serde_json::from_value(record.response_snapshot).map_err(|err| {
                        Error::internal(format!("failed to deserialise stored response: {err}"))
                    })?;
                    return Ok(Idempotent::replay(value));
                }
                IdempotencyLookupResult::MatchingPayload(_) | IdempotencyLookupResult::NotFound => {
                    if attempt == RACE_MAX_RETRIES {
                        break;
                    }
                    tokio::time::sleep(RACE_RETRY_DELAY).await;
                }
            }
        }
        Err(Error::service_unavailable(
            "idempotent request is still in progress; retry shortly",
        ))
    }
}

fn in_progress(snapshot: &Value) -> bool {
    snapshot.get(STATE_KEY).and_then(Value::as_str) == Some(STATE_IN_PROGRESS)
}

fn map_store_error(error: IdempotencyStoreError) -> Error {
    match error {
        IdempotencyStoreError::Connection { message } => {
            Error::service_unavailable(format!("idempotency store unavailable: {message}"))
        }
        IdempotencyStoreError::Query { message } => {
            Error::internal(format!("idempotency store error: {message}"))
        }
        IdempotencyStoreError::DuplicateKey { message } => {
            Error::internal(format!("unexpected idempotency key conflict: {message}"))
        }
    }
}

//! Tests for idempotency keys, hashing, configuration, and replay.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockable::{MockClock, MockEnv};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{IdempotencyStoreError, MockIdempotencyStore};

fn env_with(value: Option<&'static str>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().times(0..).returning(move |name| {
        (name == IDEMPOTENCY_TTL_HOURS_ENV)
            .then(|| value)
            .flatten()
            .map(str::to_owned)
    });
    env
}

#[rstest]
#[case(None, 24)]
#[case(Some("48"), 48)]
#[case(Some("0"), 1)]
#[case(Some("not-a-number"), 24)]
#[case(Some("999999"), 24 * 366)]
fn config_reads_and_clamps_ttl(#[case] raw: Option<&'static str>, #[case] hours: u64) {
    let config = IdempotencyConfig::from_env(&env_with(raw));
    assert_eq!(config.ttl(), Duration::from_secs(hours * 3600));
}

#[rstest]
#[case("", IdempotencyKeyValidationError::EmptyKey)]
#[case("not-a-uuid", IdempotencyKeyValidationError::InvalidKey)]
#[case(" 550e8400-e29b-41d4-a716-446655440000", IdempotencyKeyValidationError::InvalidKey)]
fn invalid_keys_are_rejected(#[case] raw: &str, #[case] expected: IdempotencyKeyValidationError) {
    assert_eq!(IdempotencyKey::new(raw), Err(expected));
}

#[rstest]
fn mutation_types_parse_their_storage_names() {
    for kind in MutationType::ALL {
        assert_eq!(kind.as_str().parse::<MutationType>(), Ok(kind));
    }
    assert!("routes".parse::<MutationType>().is_err());
}

#[rstest]
fn differing_payloads_hash_differently() {
    let a = canonicalize_and_hash(&json!({ "quantity": 1 })).expect("hash");
    let b = canonicalize_and_hash(&json!({ "quantity": 2 })).expect("hash");
    assert_ne!(a, b);
    assert_eq!(a.to_hex().len(), 64);
    assert!(PayloadHash::try_from_bytes(&[0_u8; 31]).is_err());
}

#[fixture]
fn clock() -> Arc<MockClock> {
    let mut clock = MockClock::new();
    clock
        .expect_utc()
        .returning(|| Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("time"));
    Arc::new(clock)
}

fn request(key: Option<IdempotencyKey>) -> IdempotentRequest {
    IdempotentRequest {
        key,
        mutation_type: MutationType::CounterSales,
        payload_hash: canonicalize_and_hash(&json!({ "items": [] })).expect("hash"),
    }
}

fn guard(store: MockIdempotencyStore, clock: Arc<MockClock>) -> IdempotencyGuard {
    IdempotencyGuard::new(Arc::new(store), clock, IdempotencyConfig::default())
}

#[rstest]
#[tokio::test]
async fn missing_key_runs_without_touching_the_store(clock: Arc<MockClock>) {
    let store = MockIdempotencyStore::new();
    let outcome = guard(store, clock)
        .run(request(None), || async { Ok::<_, crate::domain::Error>(7_u32) })
        .await
        .expect("runs");
    assert_eq!(outcome, Idempotent { value: 7, replayed: false });
}

#[rstest]
#[tokio::test]
async fn first_use_claims_runs_and_completes(clock: Arc<MockClock>) {
    let mut store = MockIdempotencyStore::new();
    store.expect_purge_expired().times(1).returning(|_| Ok(0));
    store.expect_claim().times(1).returning(|_| Ok(()));
    store
        .expect_complete()
        .withf(|_, snapshot| snapshot == &json!(7))
        .times(1)
        .returning(|_, _| Ok(()));

    let outcome = guard(store, clock)
        .run(request(Some(IdempotencyKey::random())), || async {
            Ok::<_, crate::domain::Error>(7_u32)
        })
        .await
        .expect("runs");
    assert!(!outcome.replayed);
}

#[rstest]
#[tokio::test]
async fn duplicate_key_with_same_payload_replays(clock: Arc<MockClock>) {
    let key = IdempotencyKey::random();
    let req = request(Some(key));
    let stored = IdempotencyRecord {
        key,
        mutation_type: req.mutation_type,
        payload_hash: req.payload_hash,
        response_snapshot: json!(42),
        created_at: Utc::now(),
    };
    let mut store = MockIdempotencyStore::new();
    store.expect_purge_expired().returning(|_| Ok(0));
    store
        .expect_claim()
        .returning(|_| Err(IdempotencyStoreError::duplicate_key("taken")));
    store
        .expect_lookup()
        .returning(move |_| Ok(IdempotencyLookupResult::MatchingPayload(stored.clone())));

    let calls = AtomicUsize::new(0);
    let outcome = guard(store, clock)
        .run(req, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, crate::domain::Error>(0_u32)
        })
        .await
        .expect("replays");
    assert_eq!(outcome, Idempotent { value: 42, replayed: true });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn duplicate_key_with_other_payload_conflicts(clock: Arc<MockClock>) {
    let key = IdempotencyKey::random();
    let req = request(Some(key));
    let stored = IdempotencyRecord {
        key,
        mutation_type: req.mutation_type,
        payload_hash: PayloadHash::from_bytes([9; 32]),
        response_snapshot: json!(1),
        created_at: Utc::now(),
    };
    let mut store = MockIdempotencyStore::new();
    store.expect_purge_expired().returning(|_| Ok(0));
    store
        .expect_claim()
        .returning(|_| Err(IdempotencyStoreError::duplicate_key("taken")));
    store
        .expect_lookup()
        .returning(move |_| Ok(IdempotencyLookupResult::ConflictingPayload(stored.clone())));

    let err = guard(store, clock)
        .run(req, || async { Ok::<_, crate::domain::Error>(0_u32) })
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn failed_operation_releases_claim(clock: Arc<MockClock>) {
    let mut store = MockIdempotencyStore::new();
    store.expect_purge_expired().returning(|_| Ok(0));
    store.expect_claim().returning(|_| Ok(()));
    store.expect_release().times(1).returning(|_| Ok(()));
    store.expect_complete().never();

    let err = guard(store, clock)
        .run(request(Some(IdempotencyKey::random())), || async {
            Err::<u32, _>(crate::domain::Error::conflict("short"))
        })
        .await
        .expect_err("propagates");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn purge_uses_ttl_cutoff(clock: Arc<MockClock>) {
    let expected = Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).single().expect("time");
    let mut store = MockIdempotencyStore::new();
    store
        .expect_purge_expired()
        .withf(move |cutoff| *cutoff == expected)
        .times(1)
        .returning(|_| Ok(3));
    store.expect_claim().returning(|_| Ok(()));
    store.expect_complete().returning(|_, _| Ok(()));

    guard(store, clock)
        .run(request(Some(IdempotencyKey::random())), || async {
            Ok::<_, crate::domain::Error>(1_u32)
        })
        .await
        .expect("runs");
}

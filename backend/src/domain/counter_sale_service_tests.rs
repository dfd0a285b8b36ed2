//! Tests for counter sale allocation, rejection, and replay.

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::fixtures::{self, batch, date, doctor, patient, product};
use crate::domain::idempotency::{IdempotencyLookupResult, IdempotencyRecord};
use crate::domain::ports::{
    IdempotencyStoreError, JobDispatchError, MockBillRepository, MockCounterSaleRepository,
    MockIdempotencyStore, MockJobQueue, MockPatientRepository, MockProductRepository,
    MockSequenceGenerator, MockStockRepository, MockVisitRepository, StockRepositoryError,
};
use crate::domain::{
    Bill, BillId, DepartmentId, ErrorCode, IdempotencyConfig, ProductId, StockBatch, Visit,
};

struct Mocks {
    sales: MockCounterSaleRepository,
    products: MockProductRepository,
    stock: MockStockRepository,
    visits: MockVisitRepository,
    patients: MockPatientRepository,
    bills: MockBillRepository,
    sequences: MockSequenceGenerator,
    jobs: MockJobQueue,
    store: MockIdempotencyStore,
}

impl Mocks {
    fn into_service(self) -> CounterSaleService {
        let clock = fixtures::clock();
        let guard = IdempotencyGuard::new(
            Arc::new(self.store),
            clock.clone(),
            IdempotencyConfig::default(),
        );
        CounterSaleService::new(
            CounterSalePorts {
                sales: Arc::new(self.sales),
                products: Arc::new(self.products),
                stock: Arc::new(self.stock),
                visits: Arc::new(self.visits),
                patients: Arc::new(self.patients),
                bills: Arc::new(self.bills),
                sequences: Arc::new(self.sequences),
                jobs: Arc::new(self.jobs),
            },
            guard,
            clock,
        )
    }

    fn shelf(&mut self, products: Vec<Product>, batches: Vec<StockBatch>) {
        self.products
            .expect_find()
            .returning(move |id| Ok(products.iter().find(|p| p.id == id).cloned()));
        self.stock.expect_batches_for().returning(move |id| {
            Ok(batches.iter().filter(|b| b.product_id == id).cloned().collect())
        });
    }

    fn numbers_sales(&mut self) {
        self.sequences
            .expect_next()
            .withf(|kind| *kind == SequenceKind::CounterSale)
            .returning(|_| Ok(9));
    }
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        sales: MockCounterSaleRepository::new(),
        products: MockProductRepository::new(),
        stock: MockStockRepository::new(),
        visits: MockVisitRepository::new(),
        patients: MockPatientRepository::new(),
        bills: MockBillRepository::new(),
        sequences: MockSequenceGenerator::new(),
        jobs: MockJobQueue::new(),
        store: MockIdempotencyStore::new(),
    }
}

fn cash_sale(lines: &[SaleLineRequest]) -> CounterSaleDraft {
    CounterSaleDraft::new(None, None, lines, Money::ZERO, PaymentMode::Cash).expect("draft")
}

fn line(product_id: ProductId, quantity: u32) -> SaleLineRequest {
    SaleLineRequest {
        product_id,
        quantity,
    }
}

fn visit_for_today() -> Visit {
    fixtures::visit(&patient(), &doctor(DepartmentId::random()), 1)
}

#[rstest]
#[tokio::test]
async fn sale_allocates_earliest_expiry_first(mut mocks: Mocks) {
    let item = product("Paracetamol 500", 5);
    let id = item.id;
    let early = batch(id, "EARLY", date(2026, 5, 1), 4, 200);
    let late = batch(id, "LATE", date(2027, 1, 1), 50, 250);
    let expired = batch(id, "GONE", date(2026, 2, 1), 90, 100);
    let (early_id, late_id) = (early.id, late.id);
    mocks.shelf(vec![item], vec![late, expired, early]);
    mocks.numbers_sales();
    mocks
        .stock
        .expect_deduct()
        .withf(move |d| {
            d == [
                StockDeduction {
                    batch_id: early_id,
                    quantity: 4,
                },
                StockDeduction {
                    batch_id: late_id,
                    quantity: 6,
                },
            ]
        })
        .times(1)
        .return_once(|_| Ok(()));
    mocks.sales.expect_create().times(1).return_once(|_| Ok(()));
    mocks.jobs.expect_enqueue().never();

    let sale = mocks
        .into_service()
        .create(cash_sale(&[line(id, 10)]), None)
        .await
        .expect("sale");
    assert!(!sale.replayed);
    let sale = sale.value;
    assert_eq!(sale.number, "CS-000009");
    assert_eq!(sale.subtotal, Money::from_minor(4 * 200 + 6 * 250));
    assert_eq!(sale.total, sale.subtotal);
    let batches: Vec<&str> = sale.items[0]
        .allocations
        .iter()
        .map(|a| a.batch_number.as_str())
        .collect();
    assert_eq!(batches, vec!["EARLY", "LATE"]);
}

#[rstest]
#[tokio::test]
async fn any_shortage_rejects_the_whole_sale(mut mocks: Mocks) {
    let plenty = product("Cetirizine 10", 0);
    let scarce = product("Azithromycin 500", 0);
    let (plenty_id, scarce_id) = (plenty.id, scarce.id);
    mocks.shelf(
        vec![plenty, scarce],
        vec![
            batch(plenty_id, "P1", date(2027, 1, 1), 100, 50),
            batch(scarce_id, "S1", date(2027, 1, 1), 2, 900),
            batch(scarce_id, "S0", date(2026, 1, 1), 40, 900),
        ],
    );
    mocks.stock.expect_deduct().never();
    mocks.sales.expect_create().never();

    let err = mocks
        .into_service()
        .create(cash_sale(&[line(plenty_id, 5), line(scarce_id, 3)]), None)
        .await
        .expect_err("short");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.details().expect("details")["shortages"],
        json!([{ "productId": scarce_id, "requested": 3, "available": 2 }])
    );
}

#[rstest]
#[tokio::test]
async fn concurrent_depletion_surfaces_as_conflict(mut mocks: Mocks) {
    let item = product("Ibuprofen 400", 0);
    let id = item.id;
    let only = batch(id, "B1", date(2027, 1, 1), 5, 300);
    let batch_id = only.id;
    mocks.shelf(vec![item], vec![only]);
    mocks.numbers_sales();
    mocks.stock.expect_deduct().return_once(move |_| {
        Err(StockRepositoryError::insufficient(batch_id, 5_u32, 1_u32))
    });
    mocks.sales.expect_create().never();

    let err = mocks
        .into_service()
        .create(cash_sale(&[line(id, 5)]), None)
        .await
        .expect_err("raced");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn sale_below_reorder_level_enqueues_low_stock(mut mocks: Mocks) {
    let item = product("Pantoprazole 40", 20);
    let id = item.id;
    mocks.shelf(vec![item], vec![batch(id, "B1", date(2027, 1, 1), 25, 100)]);
    mocks.numbers_sales();
    mocks.stock.expect_deduct().return_once(|_| Ok(()));
    mocks.sales.expect_create().return_once(|_| Ok(()));
    mocks
        .jobs
        .expect_enqueue()
        .withf(move |job| {
            *job == Job::LowStock {
                product_id: id,
                available: 15,
                reorder_level: 20,
            }
        })
        .times(1)
        .return_once(|_| Err(JobDispatchError::unavailable("queue closed")));

    let sale = mocks
        .into_service()
        .create(cash_sale(&[line(id, 10)]), None)
        .await
        .expect("queue failure does not fail the sale");
    assert_eq!(sale.value.quantity_of(id), 10);
}

#[rstest]
#[tokio::test]
async fn sale_already_below_reorder_level_does_not_realert(mut mocks: Mocks) {
    let item = product("Pantoprazole 40", 20);
    let id = item.id;
    mocks.shelf(vec![item], vec![batch(id, "B1", date(2027, 1, 1), 15, 100)]);
    mocks.numbers_sales();
    mocks.stock.expect_deduct().return_once(|_| Ok(()));
    mocks.sales.expect_create().return_once(|_| Ok(()));
    mocks.jobs.expect_enqueue().never();

    let sale = mocks
        .into_service()
        .create(cash_sale(&[line(id, 5)]), None)
        .await
        .expect("sale");
    assert_eq!(sale.value.quantity_of(id), 5);
}

#[rstest]
#[tokio::test]
async fn explicit_patient_must_match_the_visit(mut mocks: Mocks) {
    let visit = visit_for_today();
    let visit_id = visit.id;
    mocks.visits.expect_find().return_once(move |_| Ok(Some(visit)));
    mocks.stock.expect_deduct().never();
    let item = ProductId::random();

    let draft = CounterSaleDraft::new(
        Some(PatientId::random()),
        Some(visit_id),
        &[line(item, 1)],
        Money::ZERO,
        PaymentMode::Cash,
    )
    .expect("draft");
    let err = mocks.into_service().create(draft, None).await.expect_err("mismatch");
    assert_eq!(
        err.details().and_then(|d| d["code"].as_str()),
        Some("patient_mismatch")
    );
}

#[rstest]
#[tokio::test]
async fn visit_bill_sale_is_refused_once_the_bill_is_paid(mut mocks: Mocks) {
    let visit = visit_for_today();
    let (visit_id, patient_id) = (visit.id, visit.patient_id);
    mocks.visits.expect_find().return_once(move |_| Ok(Some(visit)));
    let mut bill = Bill::open(
        BillId::random(),
        "BILL-000001".to_owned(),
        visit_id,
        patient_id,
        Vec::new(),
        fixtures::now(),
    )
    .expect("bill");
    bill.status = BillStatus::Paid;
    mocks
        .bills
        .expect_find_by_visit()
        .return_once(move |_| Ok(Some(bill)));
    mocks.stock.expect_deduct().never();

    let draft = CounterSaleDraft::new(
        None,
        Some(visit_id),
        &[line(ProductId::random(), 1)],
        Money::ZERO,
        PaymentMode::VisitBill,
    )
    .expect("draft");
    let err = mocks.into_service().create(draft, None).await.expect_err("paid");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn availability_merges_lines_and_reports_shortfall(mut mocks: Mocks) {
    let item = product("Amoxicillin 250", 0);
    let id = item.id;
    mocks.shelf(vec![item], vec![batch(id, "A1", date(2026, 8, 1), 6, 120)]);
    mocks.stock.expect_deduct().never();

    let report = mocks
        .into_service()
        .check_availability(&[line(id, 4), line(id, 4)])
        .await
        .expect("report");
    assert!(!report.sufficient);
    assert_eq!(report.lines.len(), 1);
    let only = &report.lines[0];
    assert_eq!((only.requested, only.available), (8, 6));
    assert_eq!(only.allocations.iter().map(|a| a.quantity).sum::<u32>(), 6);
}

#[rstest]
#[tokio::test]
async fn keyed_retry_replays_stored_sale(mut mocks: Mocks) {
    let key = IdempotencyKey::random();
    let stored = CounterSale {
        id: CounterSaleId::random(),
        number: "CS-000003".to_owned(),
        patient_id: None,
        visit_id: None,
        items: Vec::new(),
        subtotal: Money::from_minor(500),
        discount: Money::ZERO,
        total: Money::from_minor(500),
        payment_mode: PaymentMode::Upi,
        created_at: fixtures::now(),
    };
    let snapshot = serde_json::to_value(&stored).expect("snapshot");
    mocks.store.expect_purge_expired().returning(|_| Ok(0));
    mocks
        .store
        .expect_claim()
        .returning(|_| Err(IdempotencyStoreError::duplicate_key("claimed")));
    mocks.store.expect_lookup().returning(move |query| {
        Ok(IdempotencyLookupResult::MatchingPayload(IdempotencyRecord {
            key: query.key,
            mutation_type: query.mutation_type,
            payload_hash: query.payload_hash,
            response_snapshot: snapshot.clone(),
            created_at: Utc::now(),
        }))
    });
    mocks.stock.expect_deduct().never();
    mocks.stock.expect_batches_for().never();

    let outcome = mocks
        .into_service()
        .create(cash_sale(&[line(ProductId::random(), 1)]), Some(key))
        .await
        .expect("replay");
    assert!(outcome.replayed);
    assert_eq!(outcome.value, stored);
}

//! Tests for report assembly over repository reads.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::fixtures::{
    self, batch, date, department, doctor, patient, product, today, visit,
};
use crate::domain::ports::{
    MockBillRepository, MockCounterSaleRepository, MockDepartmentRepository,
    MockProductRepository, MockStockRepository, MockVisitRepository, RepositoryError,
};
use crate::domain::{CounterSale, CounterSaleId, ErrorCode, Money, PaymentMode, VisitStatus};

struct Mocks {
    bills: MockBillRepository,
    sales: MockCounterSaleRepository,
    products: MockProductRepository,
    stock: MockStockRepository,
    visits: MockVisitRepository,
    departments: MockDepartmentRepository,
}

impl Mocks {
    fn into_service(self) -> ReportService {
        ReportService::new(
            ReportPorts {
                bills: Arc::new(self.bills),
                sales: Arc::new(self.sales),
                products: Arc::new(self.products),
                stock: Arc::new(self.stock),
                visits: Arc::new(self.visits),
                departments: Arc::new(self.departments),
            },
            fixtures::clock(),
            ReportServiceConfig::default(),
        )
    }
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        bills: MockBillRepository::new(),
        sales: MockCounterSaleRepository::new(),
        products: MockProductRepository::new(),
        stock: MockStockRepository::new(),
        visits: MockVisitRepository::new(),
        departments: MockDepartmentRepository::new(),
    }
}

fn cash_sale(total: i64, at: chrono::DateTime<Utc>) -> CounterSale {
    CounterSale {
        id: CounterSaleId::random(),
        number: "CS-000001".to_owned(),
        patient_id: None,
        visit_id: None,
        items: Vec::new(),
        subtotal: Money::from_minor(total),
        discount: Money::ZERO,
        total: Money::from_minor(total),
        payment_mode: PaymentMode::Cash,
        created_at: at,
    }
}

#[rstest]
#[tokio::test]
async fn collections_query_whole_days(mut mocks: Mocks) {
    let from = date(2026, 3, 1);
    let to = date(2026, 3, 2);
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().expect("start");
    let end = start + Duration::days(2);
    mocks
        .bills
        .expect_with_payments_between()
        .withf(move |f, t| *f == start && *t == end)
        .return_once(|_, _| Ok(Vec::new()));
    let sale_at = start + Duration::hours(30);
    mocks
        .sales
        .expect_created_between()
        .withf(move |f, t| *f == start && *t == end)
        .return_once(move |_, _| Ok(vec![cash_sale(12_000, sale_at)]));

    let report = mocks
        .into_service()
        .collections(from, to)
        .await
        .expect("report");

    assert_eq!(report.days.len(), 2);
    assert_eq!(report.grand_total, Money::from_minor(12_000));
    let second = report.days.get(1).expect("second day");
    assert_eq!(second.counter_sales.cash, Money::from_minor(12_000));
}

#[rstest]
#[tokio::test]
async fn collections_reject_reversed_range(mocks: Mocks) {
    let err = mocks
        .into_service()
        .collections(date(2026, 3, 5), date(2026, 3, 1))
        .await
        .expect_err("reversed");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn stock_alerts_use_configured_window(mut mocks: Mocks) {
    let paracetamol = product("Paracetamol 500mg", 50);
    let id = paracetamol.id;
    mocks
        .products
        .expect_all()
        .return_once(move || Ok(vec![paracetamol]));
    let soon = today() + Duration::days(10);
    let later = today() + Duration::days(90);
    let past = today() - Duration::days(1);
    mocks.stock.expect_all_batches().return_once(move || {
        Ok(vec![
            batch(id, "B-SOON", soon, 10, 200),
            batch(id, "B-LATER", later, 20, 200),
            batch(id, "B-OLD", past, 5, 200),
        ])
    });

    let alerts = mocks.into_service().stock_alerts().await.expect("alerts");

    assert_eq!(alerts.as_of, today());
    assert_eq!(alerts.near_expiry.len(), 1);
    assert_eq!(alerts.expired.len(), 1);
    assert_eq!(alerts.low_stock.len(), 1);
}

#[rstest]
#[tokio::test]
async fn visit_summary_defaults_to_today(mut mocks: Mocks) {
    let cardiology = department("Cardiology");
    let doc = doctor(cardiology.id);
    let mut seen = visit(&patient(), &doc, 1);
    seen.status = VisitStatus::Completed;
    let waiting = visit(&patient(), &doc, 2);
    mocks
        .visits
        .expect_on_date()
        .withf(|d| *d == today())
        .return_once(move |_| Ok(vec![seen, waiting]));
    mocks
        .departments
        .expect_all()
        .return_once(move || Ok(vec![cardiology]));

    let summary = mocks
        .into_service()
        .visit_summary(None)
        .await
        .expect("summary");

    assert_eq!(summary.date, today());
    assert_eq!(summary.total, 2);
    let cardiology_count = summary
        .by_department
        .first()
        .expect("department row");
    assert_eq!(cardiology_count.count, 2);
}

#[rstest]
#[tokio::test]
async fn unreachable_store_is_unavailable(mut mocks: Mocks) {
    mocks
        .visits
        .expect_on_date()
        .return_once(|_| Err(RepositoryError::connection("pool exhausted")));

    let err = mocks
        .into_service()
        .visit_summary(Some(date(2026, 2, 27)))
        .await
        .expect_err("unavailable");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

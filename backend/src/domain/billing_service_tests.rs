//! Tests for bill generation, payment, and reconciliation.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::fixtures::{self, batch, date, doctor, patient};
use crate::domain::ports::{
    MockBillRepository, MockCounterSaleRepository, MockEmployeeRepository, MockIdempotencyStore,
    MockJobQueue, MockSequenceGenerator, MockStockRepository, MockVisitRepository,
    RepositoryError,
};
use crate::domain::{
    BillItemKind, CounterSale, CounterSaleId, DepartmentId, Employee, ErrorCode,
    IdempotencyConfig, MedicineOrder, PaymentMode, ProductId, SaleLine, ServiceOrder,
};

struct Mocks {
    bills: MockBillRepository,
    visits: MockVisitRepository,
    employees: MockEmployeeRepository,
    sales: MockCounterSaleRepository,
    stock: MockStockRepository,
    sequences: MockSequenceGenerator,
    jobs: MockJobQueue,
}

impl Mocks {
    fn into_service(self) -> BillingService {
        let clock = fixtures::clock();
        let guard = IdempotencyGuard::new(
            Arc::new(MockIdempotencyStore::new()),
            clock.clone(),
            IdempotencyConfig::default(),
        );
        BillingService::new(
            BillingPorts {
                bills: Arc::new(self.bills),
                visits: Arc::new(self.visits),
                employees: Arc::new(self.employees),
                sales: Arc::new(self.sales),
                stock: Arc::new(self.stock),
                sequences: Arc::new(self.sequences),
                jobs: Arc::new(self.jobs),
            },
            guard,
            clock,
        )
    }

    fn knows_visit(&mut self, visit: &Visit) {
        let found = visit.clone();
        self.visits.expect_find().return_once(move |_| Ok(Some(found)));
    }

    fn knows_doctor(&mut self, employee: &Employee) {
        let found = employee.clone();
        self.employees
            .expect_find()
            .return_once(move |_| Ok(Some(found)));
    }

    fn visit_sales(&mut self, sales: Vec<CounterSale>) {
        self.sales.expect_for_visit().return_once(move |_| Ok(sales));
    }

    fn existing_bill(&mut self, bill: Option<Bill>) {
        self.bills
            .expect_find_by_visit()
            .return_once(move |_| Ok(bill));
    }
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        bills: MockBillRepository::new(),
        visits: MockVisitRepository::new(),
        employees: MockEmployeeRepository::new(),
        sales: MockCounterSaleRepository::new(),
        stock: MockStockRepository::new(),
        sequences: MockSequenceGenerator::new(),
        jobs: MockJobQueue::new(),
    }
}

fn sale(
    visit: &Visit,
    mode: PaymentMode,
    product_id: ProductId,
    quantity: u32,
    total: i64,
) -> CounterSale {
    CounterSale {
        id: CounterSaleId::random(),
        number: "CS-000001".to_owned(),
        patient_id: Some(visit.patient_id),
        visit_id: Some(visit.id),
        items: vec![SaleLine {
            product_id,
            quantity,
            allocations: Vec::new(),
            amount: Money::from_minor(total),
        }],
        subtotal: Money::from_minor(total),
        discount: Money::ZERO,
        total: Money::from_minor(total),
        payment_mode: mode,
        created_at: fixtures::now(),
    }
}

fn completed_visit(employee: &Employee) -> Visit {
    let mut visit = fixtures::visit(&patient(), employee, 1);
    visit.status = VisitStatus::Completed;
    visit.service_orders = vec![ServiceOrder {
        name: "ECG".to_owned(),
        charge: Money::from_minor(30_000),
    }];
    visit
}

fn open_bill(visit: &Visit, amounts: &[i64]) -> Bill {
    let items = amounts
        .iter()
        .map(|amount| crate::domain::BillItem {
            kind: BillItemKind::Service,
            description: "line".to_owned(),
            reference: None,
            amount: Money::from_minor(*amount),
        })
        .collect();
    Bill::open(
        BillId::random(),
        "BILL-000001".to_owned(),
        visit.id,
        visit.patient_id,
        items,
        fixtures::now(),
    )
    .expect("bill")
}

#[rstest]
#[tokio::test]
async fn generate_opens_bill_with_fee_services_and_visit_bill_sales(mut mocks: Mocks) {
    let employee = doctor(DepartmentId::random());
    let visit = completed_visit(&employee);
    mocks.knows_visit(&visit);
    mocks.knows_doctor(&employee);
    mocks.visit_sales(vec![
        sale(&visit, PaymentMode::VisitBill, ProductId::random(), 2, 4_000),
        sale(&visit, PaymentMode::Cash, ProductId::random(), 1, 9_999),
    ]);
    mocks.existing_bill(None);
    mocks.sequences.expect_next().return_once(|_| Ok(3));
    mocks.bills.expect_create().times(1).return_once(|_| Ok(()));

    let generated = mocks
        .into_service()
        .generate(visit.id)
        .await
        .expect("bill");
    assert!(generated.created);
    let bill = generated.bill;
    assert_eq!(bill.number, "BILL-000003");
    let kinds: Vec<BillItemKind> = bill.items.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BillItemKind::Consultation,
            BillItemKind::Service,
            BillItemKind::Pharmacy
        ]
    );
    assert_eq!(bill.gross_amount, Money::from_minor(50_000 + 30_000 + 4_000));
}

#[rstest]
#[tokio::test]
async fn cancelled_visit_cannot_be_billed(mut mocks: Mocks) {
    let mut visit = fixtures::visit(&patient(), &doctor(DepartmentId::random()), 1);
    visit.status = VisitStatus::Cancelled;
    mocks.knows_visit(&visit);
    mocks.bills.expect_create().never();

    let err = mocks
        .into_service()
        .generate(visit.id)
        .await
        .expect_err("cancelled");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn paid_bill_with_changed_charges_conflicts(mut mocks: Mocks) {
    let employee = doctor(DepartmentId::random());
    let visit = completed_visit(&employee);
    let mut bill = open_bill(&visit, &[50_000]);
    bill.record_payment(
        Money::from_minor(10_000),
        PaymentMethod::Cash,
        None,
        fixtures::now(),
    )
    .expect("payment");
    mocks.knows_visit(&visit);
    mocks.knows_doctor(&employee);
    mocks.visit_sales(Vec::new());
    mocks.existing_bill(Some(bill));
    mocks.bills.expect_update().never();

    let err = mocks
        .into_service()
        .generate(visit.id)
        .await
        .expect_err("changed");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn settling_payment_enqueues_bill_settled(mut mocks: Mocks) {
    let visit = completed_visit(&doctor(DepartmentId::random()));
    let bill = open_bill(&visit, &[20_000]);
    let (bill_id, visit_id) = (bill.id, visit.id);
    mocks.bills.expect_find().return_once(move |_| Ok(Some(bill)));
    mocks
        .bills
        .expect_update()
        .withf(|read, b| read.status == BillStatus::Unpaid && b.status == BillStatus::Paid)
        .times(1)
        .return_once(|_, _| Ok(()));
    mocks
        .jobs
        .expect_enqueue()
        .withf(move |job| *job == Job::BillSettled { bill_id, visit_id })
        .times(1)
        .return_once(|_| Ok(()));

    let paid = mocks
        .into_service()
        .record_payment(
            bill_id,
            PaymentRequest {
                amount: Money::from_minor(20_000),
                mode: PaymentMethod::Card,
                reference: Some("POS-7781".to_owned()),
            },
            None,
        )
        .await
        .expect("paid");
    assert_eq!(paid.value.due_amount, Money::ZERO);
    assert_eq!(paid.value.payments.len(), 1);
}

#[rstest]
#[tokio::test]
async fn payment_on_concurrently_changed_bill_conflicts(mut mocks: Mocks) {
    let visit = completed_visit(&doctor(DepartmentId::random()));
    let bill = open_bill(&visit, &[20_000]);
    let bill_id = bill.id;
    mocks.bills.expect_find().return_once(move |_| Ok(Some(bill)));
    mocks.bills.expect_update().times(1).return_once(|_, _| {
        Err(RepositoryError::conflict("bill was changed by another request"))
    });
    mocks.jobs.expect_enqueue().never();

    let err = mocks
        .into_service()
        .record_payment(
            bill_id,
            PaymentRequest {
                amount: Money::from_minor(20_000),
                mode: PaymentMethod::Cash,
                reference: None,
            },
            None,
        )
        .await
        .expect_err("stale bill");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn overpayment_is_rejected(mut mocks: Mocks) {
    let visit = completed_visit(&doctor(DepartmentId::random()));
    let bill = open_bill(&visit, &[20_000]);
    let bill_id = bill.id;
    mocks.bills.expect_find().return_once(move |_| Ok(Some(bill)));
    mocks.bills.expect_update().never();
    mocks.jobs.expect_enqueue().never();

    let err = mocks
        .into_service()
        .record_payment(
            bill_id,
            PaymentRequest {
                amount: Money::from_minor(20_001),
                mode: PaymentMethod::Cash,
                reference: None,
            },
            None,
        )
        .await
        .expect_err("too much");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn reconciliation_compares_orders_sales_and_bill(mut mocks: Mocks) {
    let employee = doctor(DepartmentId::random());
    let mut visit = completed_visit(&employee);
    let ordered = ProductId::random();
    let extra = ProductId::random();
    visit.medicine_orders = vec![MedicineOrder {
        product_id: ordered,
        quantity: 10,
        dosage: "1-0-1".to_owned(),
        duration_days: Some(5),
    }];
    let sales = vec![
        sale(&visit, PaymentMode::VisitBill, ordered, 6, 1_200),
        sale(&visit, PaymentMode::Cash, extra, 1, 300),
    ];
    let bill = open_bill(&visit, &[50_000]);
    mocks.knows_visit(&visit);
    mocks.visit_sales(sales);
    mocks.existing_bill(Some(bill));
    mocks.stock.expect_batches_for().returning(move |id| {
        let units = if id == ordered { 40 } else { 3 };
        Ok(vec![batch(id, "R1", date(2027, 1, 1), units, 200)])
    });

    let report = mocks
        .into_service()
        .reconcile(visit.id)
        .await
        .expect("report");
    let first = &report.lines[0];
    assert_eq!(first.product_id, ordered);
    assert_eq!(
        (first.ordered, first.dispensed, first.pending, first.available),
        (10, 6, 4, 40)
    );
    let second = &report.lines[1];
    assert_eq!((second.ordered, second.dispensed, second.pending), (0, 1, 0));
    assert_eq!(report.billing.pharmacy_charged, Money::from_minor(1_200));
    assert_eq!(report.billing.pharmacy_billed, Money::ZERO);
    assert!(!report.billing.bill_in_sync);
}

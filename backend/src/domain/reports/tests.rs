//! Tests for collection, stock alert, and visit summary reports.

use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;

use super::*;
use crate::domain::billing::{BillItem, BillItemKind};
use crate::domain::{BillId, CounterSaleId, EmployeeId, GrnId, PatientId, VisitId};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).expect("date")
}

fn at(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, hour, 0, 0).single().expect("time")
}

fn sale(mode: PaymentMode, total: i64, when: DateTime<Utc>) -> CounterSale {
    CounterSale {
        id: CounterSaleId::random(),
        number: "CS-000001".to_owned(),
        patient_id: None,
        visit_id: None,
        items: Vec::new(),
        subtotal: Money::from_minor(total),
        discount: Money::ZERO,
        total: Money::from_minor(total),
        payment_mode: mode,
        created_at: when,
    }
}

fn paid_bill(amount: i64, mode: PaymentMethod, when: DateTime<Utc>) -> Bill {
    let mut bill = Bill::open(
        BillId::random(),
        "BILL-000001".to_owned(),
        VisitId::random(),
        PatientId::random(),
        vec![BillItem {
            kind: BillItemKind::Consultation,
            description: "Consultation".to_owned(),
            reference: None,
            amount: Money::from_minor(100_000),
        }],
        when,
    )
    .expect("bill");
    bill.record_payment(Money::from_minor(amount), mode, None, when)
        .expect("payment");
    bill
}

#[rstest]
#[case(date(2), date(1))]
#[case(date(1), NaiveDate::from_ymd_opt(2026, 6, 1).expect("date"))]
fn invalid_ranges_are_rejected(#[case] from: NaiveDate, #[case] to: NaiveDate) {
    assert!(validate_range(from, to).is_err());
}

#[rstest]
fn ninety_two_days_is_the_limit() {
    let from = date(1);
    let to = from.checked_add_days(Days::new(91)).expect("date");
    assert!(validate_range(from, to).is_ok());
    assert!(validate_range(from, to.succ_opt().expect("date")).is_err());
}

#[rstest]
fn collections_group_by_day_and_mode() {
    let bills = vec![paid_bill(20_000, PaymentMethod::Card, at(1, 9))];
    let sales = vec![
        sale(PaymentMode::Cash, 1_500, at(1, 10)),
        sale(PaymentMode::Upi, 250, at(1, 11)),
        sale(PaymentMode::VisitBill, 9_999, at(1, 12)),
        sale(PaymentMode::Cash, 700, at(5, 12)),
    ];
    let report = collection_report(date(1), date(2), &bills, &sales).expect("report");

    assert_eq!(report.days.len(), 2);
    assert_eq!(report.days[1].total, Money::ZERO);
    assert_eq!(report.grand_total, Money::from_minor(21_750));
    insta::assert_json_snapshot!(report.days[0], @r#"
    {
      "date": "2026-03-01",
      "billPayments": {
        "cash": 0,
        "card": 20000,
        "upi": 0
      },
      "counterSales": {
        "cash": 1500,
        "card": 0,
        "upi": 250
      },
      "total": 21750
    }
    "#);
}

fn product(name: &str, reorder_level: u32) -> Product {
    Product {
        id: ProductId::random(),
        name: name.to_owned(),
        generic_name: None,
        manufacturer: None,
        unit: "tablet".to_owned(),
        reorder_level,
        is_active: true,
        created_at: at(1, 0),
    }
}

fn batch(product_id: ProductId, number: &str, expiry: NaiveDate, qty: u32) -> StockBatch {
    StockBatch {
        id: BatchId::random(),
        product_id,
        batch_number: number.to_owned(),
        expiry_date: expiry,
        mrp: Money::from_minor(100),
        purchase_price: Money::from_minor(80),
        quantity_available: qty,
        grn_id: GrnId::random(),
        received_at: at(1, 0),
    }
}

#[rstest]
fn stock_alerts_classify_batches() {
    let para = product("Paracetamol 500", 20);
    let amox = product("Amoxicillin 250", 5);
    let batches = vec![
        batch(para.id, "P-OLD", date(9), 40),
        batch(para.id, "P-SOON", date(20), 10),
        batch(amox.id, "A-LATE", NaiveDate::from_ymd_opt(2027, 1, 1).expect("date"), 50),
        batch(amox.id, "A-EMPTY", date(12), 0),
    ];
    let alerts = stock_alerts(&[para.clone(), amox], &batches, date(10), 30);

    assert_eq!(alerts.low_stock.len(), 1);
    assert_eq!(alerts.low_stock[0].product_id, para.id);
    assert_eq!(alerts.low_stock[0].available, 10);
    let near: Vec<_> = alerts.near_expiry.iter().map(|a| a.batch_number.as_str()).collect();
    assert_eq!(near, vec!["P-SOON"]);
    assert_eq!(alerts.expired[0].batch_number, "P-OLD");
    assert_eq!(alerts.expired[0].product_name, "Paracetamol 500");
}

#[rstest]
fn visit_summary_counts_statuses_and_departments() {
    let department = Department {
        id: DepartmentId::random(),
        name: "Cardiology".to_owned(),
        description: None,
        is_active: true,
        created_at: at(1, 0),
    };
    let visit = |status, day| Visit {
        id: VisitId::random(),
        patient_id: PatientId::random(),
        doctor_id: EmployeeId::random(),
        department_id: department.id,
        visit_date: date(day),
        token_number: 1,
        status,
        checked_in_at: at(day, 9),
        consultation_started_at: None,
        checked_out_at: None,
        vitals: None,
        assessment: None,
        medicine_orders: Vec::new(),
        service_orders: Vec::new(),
    };
    let visits = vec![
        visit(VisitStatus::Waiting, 3),
        visit(VisitStatus::Completed, 3),
        visit(VisitStatus::Completed, 3),
        visit(VisitStatus::Waiting, 4),
    ];
    let summary = visit_summary(date(3), &visits, std::slice::from_ref(&department));

    assert_eq!(summary.total, 3);
    assert_eq!(summary.by_status.len(), 4);
    assert_eq!(summary.by_status[2], StatusCount { status: VisitStatus::Completed, count: 2 });
    assert_eq!(summary.by_department[0].department_name, "Cardiology");
    assert_eq!(summary.by_department[0].count, 3);
}

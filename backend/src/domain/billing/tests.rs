//! Tests for bill arithmetic and state rules.

use chrono::TimeZone;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("time")
}

fn item(kind: BillItemKind, amount: i64) -> BillItem {
    BillItem {
        kind,
        description: "line".to_owned(),
        reference: None,
        amount: Money::from_minor(amount),
    }
}

#[fixture]
fn bill() -> Bill {
    Bill::open(
        BillId::random(),
        "BILL-000001".to_owned(),
        VisitId::random(),
        PatientId::random(),
        vec![
            item(BillItemKind::Consultation, 50_000),
            item(BillItemKind::Pharmacy, 12_000),
        ],
        now(),
    )
    .expect("bill")
}

#[rstest]
fn new_bill_is_unpaid_with_full_due(bill: Bill) {
    assert_eq!(bill.gross_amount, Money::from_minor(62_000));
    assert_eq!(bill.due_amount, Money::from_minor(62_000));
    assert_eq!(bill.status, BillStatus::Unpaid);
    assert_eq!(bill.pharmacy_total().expect("sum"), Money::from_minor(12_000));
}

#[rstest]
fn payments_progress_to_paid(mut bill: Bill) {
    bill.apply_discount(Money::from_minor(2_000), now()).expect("discount");
    bill.record_payment(Money::from_minor(10_000), PaymentMethod::Cash, None, now())
        .expect("partial");
    assert_eq!(bill.status, BillStatus::PartiallyPaid);
    bill.record_payment(Money::from_minor(50_000), PaymentMethod::Upi, Some("UPI-1"), now())
        .expect("settle");
    assert_eq!(bill.status, BillStatus::Paid);
    assert_eq!(bill.due_amount, Money::ZERO);
    assert_eq!(
        bill.record_payment(Money::from_minor(1), PaymentMethod::Cash, None, now())
            .expect_err("paid")
            .code(),
        ErrorCode::Conflict
    );
}

#[rstest]
#[case(0)]
#[case(-5)]
#[case(62_001)]
fn payment_amount_bounds(mut bill: Bill, #[case] amount: i64) {
    let err = bill
        .record_payment(Money::from_minor(amount), PaymentMethod::Card, None, now())
        .expect_err("out of bounds");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
fn discount_rules(mut bill: Bill) {
    assert!(bill.apply_discount(Money::from_minor(62_001), now()).is_err());
    bill.record_payment(Money::from_minor(100), PaymentMethod::Cash, None, now())
        .expect("pay");
    assert_eq!(
        bill.apply_discount(Money::from_minor(10), now()).expect_err("paid").code(),
        ErrorCode::Conflict
    );
}

#[rstest]
fn refresh_after_payment_only_accepts_identical_items(mut bill: Bill) {
    let same = bill.items.clone();
    bill.record_payment(Money::from_minor(100), PaymentMethod::Cash, None, now())
        .expect("pay");
    assert_eq!(bill.refresh(same, now()).expect("same"), RefreshOutcome::Unchanged);
    let changed = vec![item(BillItemKind::Consultation, 50_000)];
    assert_eq!(
        bill.refresh(changed, now()).expect_err("changed").code(),
        ErrorCode::Conflict
    );
}

#[rstest]
fn refresh_clamps_discount_to_new_gross(mut bill: Bill) {
    bill.apply_discount(Money::from_minor(60_000), now()).expect("discount");
    let outcome = bill
        .refresh(vec![item(BillItemKind::Consultation, 50_000)], now())
        .expect("refresh");
    assert_eq!(outcome, RefreshOutcome::Updated);
    assert_eq!(bill.discount, Money::from_minor(50_000));
    assert_eq!(bill.net_amount, Money::ZERO);
}

#[rstest]
fn cancel_only_when_unpaid(mut bill: Bill) {
    let mut paid = bill.clone();
    paid.record_payment(Money::from_minor(1), PaymentMethod::Cash, None, now())
        .expect("pay");
    assert!(paid.cancel(now()).is_err());
    bill.cancel(now()).expect("cancel");
    assert_eq!(bill.status, BillStatus::Cancelled);
}

//! Entity builders and a pinned clock for service tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use mockable::MockClock;

use crate::domain::{
    BatchId, Department, DepartmentId, Employee, EmployeeId, Gender, GrnId, Money, Patient,
    PatientId, Product, ProductId, RoleId, StockBatch, Visit, VisitId, VisitStatus,
};

/// 1 March 2026, 09:00 UTC.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn today() -> NaiveDate {
    now().date_naive()
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A clock that always reports [`now`].
pub(crate) fn clock() -> Arc<MockClock> {
    clock_at(now())
}

pub(crate) fn clock_at(at: DateTime<Utc>) -> Arc<MockClock> {
    let mut clock = MockClock::new();
    clock.expect_utc().returning(move || at);
    Arc::new(clock)
}

pub(crate) fn department(name: &str) -> Department {
    Department {
        id: DepartmentId::random(),
        name: name.to_owned(),
        description: None,
        is_active: true,
        created_at: now(),
    }
}

/// Active consulting doctor charging 500.00.
pub(crate) fn doctor(department_id: DepartmentId) -> Employee {
    Employee {
        id: EmployeeId::random(),
        first_name: "Asha".to_owned(),
        last_name: "Rao".to_owned(),
        email: "asha.rao@example.org".to_owned(),
        phone: "9876543210".to_owned(),
        department_id,
        role_id: RoleId::random(),
        designation: "Consultant".to_owned(),
        consultation_fee: Some(Money::from_minor(50_000)),
        is_active: true,
        joined_on: date(2020, 1, 6),
        created_at: now(),
    }
}

pub(crate) fn patient() -> Patient {
    Patient {
        id: PatientId::random(),
        uhid: "UH2026000001".to_owned(),
        first_name: "Ravi".to_owned(),
        last_name: Some("Kumar".to_owned()),
        gender: Gender::Male,
        date_of_birth: date(1990, 5, 17),
        phone: "9123456780".to_owned(),
        email: None,
        address: None,
        blood_group: None,
        emergency_contact: None,
        registered_at: now(),
    }
}

/// A waiting visit for today.
pub(crate) fn visit(patient: &Patient, doctor: &Employee, token_number: u32) -> Visit {
    Visit {
        id: VisitId::random(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        department_id: doctor.department_id,
        visit_date: today(),
        token_number,
        status: VisitStatus::Waiting,
        checked_in_at: now(),
        consultation_started_at: None,
        checked_out_at: None,
        vitals: None,
        assessment: None,
        medicine_orders: Vec::new(),
        service_orders: Vec::new(),
    }
}

pub(crate) fn product(name: &str, reorder_level: u32) -> Product {
    Product {
        id: ProductId::random(),
        name: name.to_owned(),
        generic_name: None,
        manufacturer: None,
        unit: "tablet".to_owned(),
        reorder_level,
        is_active: true,
        created_at: now(),
    }
}

/// A batch priced at `mrp` paise per unit, costing half that.
pub(crate) fn batch(
    product_id: ProductId,
    batch_number: &str,
    expiry_date: NaiveDate,
    quantity: u32,
    mrp: i64,
) -> StockBatch {
    StockBatch {
        id: BatchId::random(),
        product_id,
        batch_number: batch_number.to_owned(),
        expiry_date,
        mrp: Money::from_minor(mrp),
        purchase_price: Money::from_minor(mrp / 2),
        quantity_available: quantity,
        grn_id: GrnId::random(),
        received_at: now(),
    }
}

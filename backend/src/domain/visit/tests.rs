//! Tests for visit transitions, vitals, and queue estimates.

use chrono::TimeZone;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).single().expect("time")
}

#[fixture]
fn visit() -> Visit {
    Visit {
        id: VisitId::random(),
        patient_id: PatientId::random(),
        doctor_id: EmployeeId::random(),
        department_id: DepartmentId::random(),
        visit_date: NaiveDate::from_ymd_opt(2026, 3, 1).expect("date"),
        token_number: 4,
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

fn sibling(base: &Visit, token: u32, status: VisitStatus) -> Visit {
    Visit {
        id: VisitId::random(),
        patient_id: PatientId::random(),
        token_number: token,
        status,
        ..base.clone()
    }
}

#[rstest]
#[case(VisitStatus::Waiting, VisitStatus::InConsultation, true)]
#[case(VisitStatus::InConsultation, VisitStatus::Completed, true)]
#[case(VisitStatus::Waiting, VisitStatus::Cancelled, true)]
#[case(VisitStatus::Waiting, VisitStatus::Completed, false)]
#[case(VisitStatus::InConsultation, VisitStatus::Cancelled, false)]
#[case(VisitStatus::Completed, VisitStatus::Waiting, false)]
#[case(VisitStatus::Cancelled, VisitStatus::InConsultation, false)]
fn transition_table(#[case] from: VisitStatus, #[case] to: VisitStatus, #[case] allowed: bool) {
    assert_eq!(from.can_become(to), allowed);
}

#[rstest]
fn illegal_transition_reports_both_states(mut visit: Visit) {
    let err = visit
        .transition(VisitStatus::Completed, now())
        .expect_err("waiting cannot complete");
    assert_eq!(err.code(), ErrorCode::Conflict);
    let details = err.details().expect("details");
    assert_eq!(details["from"], "waiting");
    assert_eq!(details["to"], "completed");
}

#[rstest]
fn transitions_stamp_times(mut visit: Visit) {
    visit.transition(VisitStatus::InConsultation, now()).expect("start");
    assert_eq!(visit.consultation_started_at, Some(now()));
    visit.transition(VisitStatus::Completed, now()).expect("complete");
    assert_eq!(visit.checked_out_at, Some(now()));
}

#[rstest]
#[case(Vitals { temperature_celsius: Some(29.9), ..Vitals::default() }, "temperatureCelsius")]
#[case(Vitals { pulse_per_minute: Some(251), ..Vitals::default() }, "pulsePerMinute")]
#[case(Vitals { spo2_percent: Some(101), ..Vitals::default() }, "spo2Percent")]
#[case(Vitals { weight_kg: Some(0.0), ..Vitals::default() }, "weightKg")]
#[case(Vitals { height_cm: Some(300.5), ..Vitals::default() }, "heightCm")]
#[case(
    Vitals { systolic_mm_hg: Some(80), diastolic_mm_hg: Some(80), ..Vitals::default() },
    "systolicMmHg"
)]
#[case(Vitals::default(), "vitals")]
fn vitals_out_of_range(#[case] vitals: Vitals, #[case] field: &str) {
    let err = vitals.validate().expect_err("invalid vitals");
    assert_eq!(err.details().expect("details")["field"], field);
}

#[rstest]
fn assessment_requires_consultation(mut visit: Visit) {
    let assessment = Assessment::new("Fever for three days", None, None).expect("valid");
    assert!(visit.record_assessment(assessment.clone()).is_err());
    visit.transition(VisitStatus::InConsultation, now()).expect("start");
    visit.record_assessment(assessment).expect("recorded");
}

#[rstest]
fn vitals_rejected_after_checkout(mut visit: Visit) {
    visit.status = VisitStatus::Completed;
    let vitals = Vitals {
        pulse_per_minute: Some(72),
        ..Vitals::default()
    };
    assert_eq!(
        visit.record_vitals(vitals).expect_err("closed").code(),
        ErrorCode::Conflict
    );
}

#[rstest]
fn eta_counts_open_visits_with_lower_tokens(visit: Visit) {
    let same_day = vec![
        sibling(&visit, 1, VisitStatus::Completed),
        sibling(&visit, 2, VisitStatus::InConsultation),
        sibling(&visit, 3, VisitStatus::Cancelled),
        sibling(&visit, 5, VisitStatus::Waiting),
        visit.clone(),
    ];
    let estimate = estimate_queue(&visit, &same_day, 12, now());
    assert_eq!(estimate.patients_ahead, Some(1));
    assert_eq!(estimate.estimated_wait_minutes, Some(12));
    assert_eq!(
        estimate.estimated_start_at,
        Some(now() + TimeDelta::minutes(12))
    );
}

#[rstest]
fn non_waiting_visits_have_no_eta(mut visit: Visit) {
    visit.status = VisitStatus::InConsultation;
    let estimate = estimate_queue(&visit, &[], 10, now());
    assert_eq!(estimate.estimated_wait_minutes, None);
    assert_eq!(estimate.patients_ahead, None);
}

#[rstest]
fn orders_reject_zero_quantity() {
    let order = MedicineOrder {
        product_id: ProductId::random(),
        quantity: 0,
        dosage: "1-0-1".to_owned(),
        duration_days: Some(5),
    };
    assert!(VisitOrders::new(vec![order], Vec::new()).is_err());
}

//! Tests for patient registration.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::fixtures::{self, date, patient};
use crate::domain::ports::{MockPatientRepository, MockSequenceGenerator};
use crate::domain::{BloodGroup, ErrorCode};

fn input() -> PatientInput {
    PatientInput {
        first_name: " Lakshmi ".to_owned(),
        last_name: None,
        gender: "female".to_owned(),
        date_of_birth: Some(date(1984, 2, 29)),
        phone: "9000012345".to_owned(),
        email: None,
        address: Some("12 MG Road".to_owned()),
        blood_group: Some("b+".to_owned()),
        emergency_contact: None,
    }
}

fn service(patients: MockPatientRepository, sequences: MockSequenceGenerator) -> PatientService {
    PatientService::new(
        Arc::new(patients),
        Arc::new(sequences),
        fixtures::clock(),
        PatientServiceConfig::default(),
    )
}

#[rstest]
#[tokio::test]
async fn register_assigns_uhid_from_yearly_sequence() {
    let mut sequences = MockSequenceGenerator::new();
    sequences
        .expect_next()
        .withf(|kind| *kind == SequenceKind::Uhid { year: 2026 })
        .times(1)
        .return_once(|_| Ok(42));
    let mut patients = MockPatientRepository::new();
    patients
        .expect_create()
        .withf(|p| p.uhid == "UH2026000042")
        .times(1)
        .return_once(|_| Ok(()));

    let registered = service(patients, sequences)
        .register(input())
        .await
        .expect("registered");
    assert_eq!(registered.first_name, "Lakshmi");
    assert_eq!(registered.blood_group, Some(BloodGroup::BPositive));
    assert_eq!(registered.registered_at, fixtures::now());
}

#[rstest]
#[tokio::test]
async fn future_birth_date_is_rejected_before_allocating_uhid() {
    let mut sequences = MockSequenceGenerator::new();
    sequences.expect_next().never();
    let mut bad = input();
    bad.date_of_birth = Some(date(2026, 3, 2));

    let err = service(MockPatientRepository::new(), sequences)
        .register(bad)
        .await
        .expect_err("future");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d["code"].as_str()),
        Some("date_in_future")
    );
}

#[rstest]
#[tokio::test]
async fn update_keeps_uhid() {
    let existing = patient();
    let id = existing.id;
    let mut patients = MockPatientRepository::new();
    patients
        .expect_find()
        .return_once(move |_| Ok(Some(existing)));
    patients
        .expect_update()
        .withf(|p| p.uhid == "UH2026000001" && p.first_name == "Lakshmi")
        .times(1)
        .return_once(|_| Ok(()));

    let updated = service(patients, MockSequenceGenerator::new())
        .update(id, input())
        .await
        .expect("updated");
    assert_eq!(updated.id, id);
}

#[rstest]
#[tokio::test]
async fn unknown_uhid_is_not_found() {
    let mut patients = MockPatientRepository::new();
    patients
        .expect_find_by_uhid()
        .withf(|uhid| uhid == "UH2026999999")
        .return_once(|_| Ok(None));

    let err = service(patients, MockSequenceGenerator::new())
        .get_by_uhid(" UH2026999999 ")
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
fn age_uses_clock_date() {
    let service = service(MockPatientRepository::new(), MockSequenceGenerator::new());
    let mut subject = patient();
    subject.date_of_birth = date(2000, 3, 2);
    assert_eq!(service.age_of(&subject), 25);
    subject.date_of_birth = date(2000, 3, 1);
    assert_eq!(service.age_of(&subject), 26);
}

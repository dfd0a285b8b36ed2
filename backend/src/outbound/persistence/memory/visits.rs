//! Visit storage.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::PageRequest;

use super::table::Table;
use crate::domain::ports::{ListSlice, RepositoryError, VisitFilter, VisitRepository};
use crate::domain::{EmployeeId, Visit, VisitId};

/// Visits keyed by id. Tokens are unique per doctor and day, as are a
/// patient's open visits.
#[derive(Debug, Default)]
pub struct MemoryVisitRepository {
    rows: Table<VisitId, Visit>,
}

impl MemoryVisitRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_token(a: &Visit, b: &Visit) -> bool {
    a.doctor_id == b.doctor_id && a.visit_date == b.visit_date && a.token_number == b.token_number
}

fn both_open_for_patient(a: &Visit, b: &Visit) -> bool {
    a.patient_id == b.patient_id
        && a.doctor_id == b.doctor_id
        && a.visit_date == b.visit_date
        && a.status.is_open()
        && b.status.is_open()
}

#[async_trait]
impl VisitRepository for MemoryVisitRepository {
    async fn create(&self, visit: &Visit) -> Result<(), RepositoryError> {
        self.rows
            .insert(visit.id, visit, |v| {
                same_token(v, visit) || both_open_for_patient(v, visit)
            })
            .await
    }

    async fn update(&self, visit: &Visit) -> Result<(), RepositoryError> {
        self.rows
            .replace(visit.id, visit, |_, v| same_token(v, visit))
            .await
    }

    async fn find(&self, id: VisitId) -> Result<Option<Visit>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn list(
        &self,
        filter: &VisitFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Visit>, RepositoryError> {
        Ok(self
            .rows
            .page(
                |v| filter.matches(v),
                |a, b| b.checked_in_at.cmp(&a.checked_in_at),
                page,
            )
            .await)
    }

    async fn for_doctor_on(
        &self,
        doctor_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Vec<Visit>, RepositoryError> {
        Ok(self
            .rows
            .select(
                |v| v.doctor_id == doctor_id && v.visit_date == date,
                |a, b| a.token_number.cmp(&b.token_number),
            )
            .await)
    }

    async fn on_date(&self, date: NaiveDate) -> Result<Vec<Visit>, RepositoryError> {
        Ok(self
            .rows
            .select(
                |v| v.visit_date == date,
                |a, b| a.checked_in_at.cmp(&b.checked_in_at),
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    //! Check-in constraints enforced at insert time.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::fixtures::{self, doctor, patient};
    use crate::domain::{DepartmentId, Employee, Patient, VisitStatus};

    #[fixture]
    fn pair() -> (Patient, Employee) {
        (patient(), doctor(DepartmentId::random()))
    }

    #[rstest]
    #[tokio::test]
    async fn racing_check_ins_keep_one_open_visit(pair: (Patient, Employee)) {
        let (patient, doctor) = pair;
        let repo = MemoryVisitRepository::new();
        let first = fixtures::visit(&patient, &doctor, 1);
        let second = fixtures::visit(&patient, &doctor, 2);

        let (a, b) = tokio::join!(repo.create(&first), repo.create(&second));

        assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
        let conflict = a.err().or(b.err()).expect("one loser");
        assert!(matches!(conflict, RepositoryError::Conflict { .. }));
        let day = repo
            .for_doctor_on(doctor.id, fixtures::today())
            .await
            .expect("visits");
        assert_eq!(day.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn closed_visit_does_not_block_a_new_one(pair: (Patient, Employee)) {
        let (patient, doctor) = pair;
        let repo = MemoryVisitRepository::new();
        let mut earlier = fixtures::visit(&patient, &doctor, 1);
        earlier.status = VisitStatus::Completed;
        repo.create(&earlier).await.expect("earlier");

        repo.create(&fixtures::visit(&patient, &doctor, 2))
            .await
            .expect("new visit");
    }

    #[rstest]
    #[tokio::test]
    async fn token_clash_conflicts_across_patients(pair: (Patient, Employee)) {
        let (patient, doctor) = pair;
        let repo = MemoryVisitRepository::new();
        repo.create(&fixtures::visit(&patient, &doctor, 1))
            .await
            .expect("first patient");

        let err = repo
            .create(&fixtures::visit(&fixtures::patient(), &doctor, 1))
            .await
            .expect_err("token taken");
        assert!(matches!(err, RepositoryError::Conflict { .. }));
        repo.create(&fixtures::visit(&fixtures::patient(), &doctor, 2))
            .await
            .expect("next token");
    }
}

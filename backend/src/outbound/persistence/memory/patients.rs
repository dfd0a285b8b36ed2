//! Patient storage.

use async_trait::async_trait;
use pagination::PageRequest;

use super::table::{Table, same_text};
use crate::domain::ports::{ListSlice, PatientFilter, PatientRepository, RepositoryError};
use crate::domain::{Patient, PatientId};

/// Patients keyed by id with unique UHIDs.
#[derive(Debug, Default)]
pub struct MemoryPatientRepository {
    rows: Table<PatientId, Patient>,
}

impl MemoryPatientRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientRepository for MemoryPatientRepository {
    async fn create(&self, patient: &Patient) -> Result<(), RepositoryError> {
        self.rows
            .insert(patient.id, patient, |p| same_text(&p.uhid, &patient.uhid))
            .await
    }

    async fn update(&self, patient: &Patient) -> Result<(), RepositoryError> {
        self.rows
            .replace(patient.id, patient, |_, p| same_text(&p.uhid, &patient.uhid))
            .await
    }

    async fn find(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn find_by_uhid(&self, uhid: &str) -> Result<Option<Patient>, RepositoryError> {
        Ok(self.rows.find(|p| same_text(&p.uhid, uhid)).await)
    }

    async fn search(
        &self,
        filter: &PatientFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Patient>, RepositoryError> {
        Ok(self
            .rows
            .page(
                |p| filter.matches(p),
                |a, b| (b.registered_at, &b.uhid).cmp(&(a.registered_at, &a.uhid)),
                page,
            )
            .await)
    }
}

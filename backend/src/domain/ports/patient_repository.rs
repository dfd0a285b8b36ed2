//! Port for patient persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Patient, PatientId};

/// Patient search filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFilter {
    /// Exact UHID (ignoring case) or a name/phone substring.
    pub query: Option<String>,
}

impl PatientFilter {
    /// Whether `patient` passes the filter.
    pub fn matches(&self, patient: &Patient) -> bool {
        self.query.as_deref().is_none_or(|query| patient.matches(query))
    }
}

/// Storage for patients. UHIDs are unique.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Insert a new patient.
    async fn create(&self, patient: &Patient) -> Result<(), RepositoryError>;
    /// Replace an existing patient.
    async fn update(&self, patient: &Patient) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError>;
    /// Fetch by UHID, ignoring case.
    async fn find_by_uhid(&self, uhid: &str) -> Result<Option<Patient>, RepositoryError>;
    /// Filtered page, most recently registered first.
    async fn search(
        &self,
        filter: &PatientFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Patient>, RepositoryError>;
}

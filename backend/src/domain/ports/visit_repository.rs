//! Port for visit persistence.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{EmployeeId, PatientId, Visit, VisitId, VisitStatus};

/// Visit list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitFilter {
    /// Patient seen.
    pub patient_id: Option<PatientId>,
    /// Consulting doctor.
    pub doctor_id: Option<EmployeeId>,
    /// Visit date.
    pub date: Option<NaiveDate>,
    /// Lifecycle state.
    pub status: Option<VisitStatus>,
}

impl VisitFilter {
    /// Whether `visit` passes the filter.
    pub fn matches(&self, visit: &Visit) -> bool {
        self.patient_id.is_none_or(|id| visit.patient_id == id)
            && self.doctor_id.is_none_or(|id| visit.doctor_id == id)
            && self.date.is_none_or(|date| visit.visit_date == date)
            && self.status.is_none_or(|status| visit.status == status)
    }
}

/// Storage for visits. Tokens are unique per doctor and day, and a patient
/// holds at most one open visit per doctor and day; inserts breaking either
/// rule are a [`RepositoryError::Conflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Insert a new visit.
    async fn create(&self, visit: &Visit) -> Result<(), RepositoryError>;
    /// Replace an existing visit.
    async fn update(&self, visit: &Visit) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: VisitId) -> Result<Option<Visit>, RepositoryError>;
    /// Filtered page, newest check-in first.
    async fn list(
        &self,
        filter: &VisitFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Visit>, RepositoryError>;
    /// A doctor's visits on one day, by token.
    async fn for_doctor_on(
        &self,
        doctor_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Vec<Visit>, RepositoryError>;
    /// Every visit on one day.
    async fn on_date(&self, date: NaiveDate) -> Result<Vec<Visit>, RepositoryError>;
}

//! Port for bill persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Bill, BillId, BillStatus, PatientId, VisitId};

/// Bill list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillFilter {
    /// Settlement state.
    pub status: Option<BillStatus>,
    /// Billed patient.
    pub patient_id: Option<PatientId>,
}

impl BillFilter {
    /// Whether `bill` passes the filter.
    pub fn matches(&self, bill: &Bill) -> bool {
        self.status.is_none_or(|status| bill.status == status)
            && self.patient_id.is_none_or(|id| bill.patient_id == id)
    }
}

/// Storage for bills. At most one bill exists per visit; a second insert
/// for the same visit is a [`RepositoryError::Conflict`]. Updates are
/// conditional on the stored bill still matching the one the caller read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Insert a new bill.
    async fn create(&self, bill: &Bill) -> Result<(), RepositoryError>;
    /// Replace `current` with `next`. A stored bill that no longer equals
    /// `current` is a [`RepositoryError::Conflict`].
    async fn update(&self, current: &Bill, next: &Bill) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: BillId) -> Result<Option<Bill>, RepositoryError>;
    /// Fetch the bill of a visit.
    async fn find_by_visit(&self, visit_id: VisitId) -> Result<Option<Bill>, RepositoryError>;
    /// Filtered page, newest first.
    async fn list(
        &self,
        filter: &BillFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Bill>, RepositoryError>;
    /// Bills holding at least one payment made in `[from, to)`.
    async fn with_payments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bill>, RepositoryError>;
}

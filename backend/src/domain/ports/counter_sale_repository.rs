//! Port for counter sale persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{CounterSale, CounterSaleId, PatientId, VisitId};

/// Counter sale list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSaleFilter {
    /// Linked visit.
    pub visit_id: Option<VisitId>,
    /// Buying patient.
    pub patient_id: Option<PatientId>,
    /// Sale day (UTC).
    pub date: Option<NaiveDate>,
}

impl CounterSaleFilter {
    /// Whether `sale` passes the filter.
    pub fn matches(&self, sale: &CounterSale) -> bool {
        self.visit_id.is_none_or(|id| sale.visit_id == Some(id))
            && self.patient_id.is_none_or(|id| sale.patient_id == Some(id))
            && self.date.is_none_or(|date| sale.created_at.date_naive() == date)
    }
}

/// Storage for counter sales.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterSaleRepository: Send + Sync {
    /// Insert a new sale.
    async fn create(&self, sale: &CounterSale) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: CounterSaleId) -> Result<Option<CounterSale>, RepositoryError>;
    /// Filtered page, newest first.
    async fn list(
        &self,
        filter: &CounterSaleFilter,
        page: PageRequest,
    ) -> Result<ListSlice<CounterSale>, RepositoryError>;
    /// Every sale linked to a visit, oldest first.
    async fn for_visit(&self, visit_id: VisitId) -> Result<Vec<CounterSale>, RepositoryError>;
    /// Sales created in `[from, to)`.
    async fn created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CounterSale>, RepositoryError>;
}

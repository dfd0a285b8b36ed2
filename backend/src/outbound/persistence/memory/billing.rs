//! Bill storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::table::Table;
use crate::domain::ports::{BillFilter, BillRepository, ListSlice, RepositoryError};
use crate::domain::{Bill, BillId, VisitId};

/// Bills keyed by id; one per visit.
#[derive(Debug, Default)]
pub struct MemoryBillRepository {
    rows: Table<BillId, Bill>,
}

impl MemoryBillRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillRepository for MemoryBillRepository {
    async fn create(&self, bill: &Bill) -> Result<(), RepositoryError> {
        self.rows
            .insert(bill.id, bill, |b| {
                b.visit_id == bill.visit_id || b.number == bill.number
            })
            .await
    }

    async fn update(&self, current: &Bill, next: &Bill) -> Result<(), RepositoryError> {
        self.rows.swap(next.id, current, next).await
    }

    async fn find(&self, id: BillId) -> Result<Option<Bill>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn find_by_visit(&self, visit_id: VisitId) -> Result<Option<Bill>, RepositoryError> {
        Ok(self.rows.find(|b| b.visit_id == visit_id).await)
    }

    async fn list(
        &self,
        filter: &BillFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Bill>, RepositoryError> {
        Ok(self
            .rows
            .page(
                |b| filter.matches(b),
                |a, b| (b.created_at, &b.number).cmp(&(a.created_at, &a.number)),
                page,
            )
            .await)
    }

    async fn with_payments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bill>, RepositoryError> {
        Ok(self
            .rows
            .select(
                |b| b.payments.iter().any(|p| p.paid_at >= from && p.paid_at < to),
                |a, b| a.created_at.cmp(&b.created_at),
            )
            .await)
    }
}

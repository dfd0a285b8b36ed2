//! Counter sale storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::table::Table;
use crate::domain::ports::{
    CounterSaleFilter, CounterSaleRepository, ListSlice, RepositoryError,
};
use crate::domain::{CounterSale, CounterSaleId, VisitId};

/// Counter sales keyed by id with unique numbers.
#[derive(Debug, Default)]
pub struct MemoryCounterSaleRepository {
    rows: Table<CounterSaleId, CounterSale>,
}

impl MemoryCounterSaleRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(a: &CounterSale, b: &CounterSale) -> std::cmp::Ordering {
    (a.created_at, &a.number).cmp(&(b.created_at, &b.number))
}

#[async_trait]
impl CounterSaleRepository for MemoryCounterSaleRepository {
    async fn create(&self, sale: &CounterSale) -> Result<(), RepositoryError> {
        self.rows
            .insert(sale.id, sale, |s| s.number == sale.number)
            .await
    }

    async fn find(&self, id: CounterSaleId) -> Result<Option<CounterSale>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn list(
        &self,
        filter: &CounterSaleFilter,
        page: PageRequest,
    ) -> Result<ListSlice<CounterSale>, RepositoryError> {
        Ok(self
            .rows
            .page(|s| filter.matches(s), |a, b| oldest_first(b, a), page)
            .await)
    }

    async fn for_visit(&self, visit_id: VisitId) -> Result<Vec<CounterSale>, RepositoryError> {
        Ok(self
            .rows
            .select(|s| s.visit_id == Some(visit_id), oldest_first)
            .await)
    }

    async fn created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CounterSale>, RepositoryError> {
        Ok(self
            .rows
            .select(|s| s.created_at >= from && s.created_at < to, oldest_first)
            .await)
    }
}

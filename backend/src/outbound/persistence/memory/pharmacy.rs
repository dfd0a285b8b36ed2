//! Products, stock batches, intents, and GRNs.

use std::collections::HashMap;

use async_trait::async_trait;
use pagination::PageRequest;
use tokio::sync::RwLock;

use super::table::{Table, same_text};
use crate::domain::ports::{
    GrnFilter, GrnRepository, IntentFilter, IntentRepository, ListSlice, ProductFilter,
    ProductRepository, RepositoryError, StockDeduction, StockRepository, StockRepositoryError,
};
use crate::domain::{BatchId, Grn, GrnId, Intent, IntentId, Product, ProductId, StockBatch};

/// Product storage with case-insensitive unique names.
#[derive(Debug, Default)]
pub struct MemoryProductRepository {
    rows: Table<ProductId, Product>,
}

impl MemoryProductRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        self.rows
            .insert(product.id, product, |p| same_text(&p.name, &product.name))
            .await
    }

    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        self.rows
            .replace(product.id, product, |_, p| same_text(&p.name, &product.name))
            .await
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self.rows.find(|p| same_text(&p.name, name)).await)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Product>, RepositoryError> {
        Ok(self
            .rows
            .page(|p| filter.matches(p), |a, b| a.name.cmp(&b.name), page)
            .await)
    }

    async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.rows.select(|_| true, |a, b| a.name.cmp(&b.name)).await)
    }
}

/// Stock batches. Deductions are applied atomically under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStockRepository {
    batches: RwLock<HashMap<BatchId, StockBatch>>,
}

impl MemoryStockRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_expiry(a: &StockBatch, b: &StockBatch) -> std::cmp::Ordering {
    (a.expiry_date, a.received_at, a.id).cmp(&(b.expiry_date, b.received_at, b.id))
}

#[async_trait]
impl StockRepository for MemoryStockRepository {
    async fn insert_batches(&self, batches: &[StockBatch]) -> Result<(), StockRepositoryError> {
        let mut rows = self.batches.write().await;
        if let Some(taken) = batches.iter().find(|b| rows.contains_key(&b.id)) {
            return Err(StockRepositoryError::query(format!(
                "batch {} already exists",
                taken.id
            )));
        }
        rows.extend(batches.iter().map(|b| (b.id, b.clone())));
        Ok(())
    }

    async fn batches_for(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<StockBatch>, StockRepositoryError> {
        let mut found: Vec<StockBatch> = self
            .batches
            .read()
            .await
            .values()
            .filter(|b| b.product_id == product_id)
            .cloned()
            .collect();
        found.sort_by(by_expiry);
        Ok(found)
    }

    async fn all_batches(&self) -> Result<Vec<StockBatch>, StockRepositoryError> {
        let mut found: Vec<StockBatch> = self.batches.read().await.values().cloned().collect();
        found.sort_by(by_expiry);
        Ok(found)
    }

    async fn deduct(&self, deductions: &[StockDeduction]) -> Result<(), StockRepositoryError> {
        let mut rows = self.batches.write().await;
        let mut pending: HashMap<BatchId, u32> = HashMap::new();
        for deduction in deductions {
            let batch = rows
                .get(&deduction.batch_id)
                .ok_or_else(|| StockRepositoryError::unknown_batch(deduction.batch_id))?;
            let requested = pending
                .get(&deduction.batch_id)
                .copied()
                .unwrap_or(0)
                .saturating_add(deduction.quantity);
            if requested > batch.quantity_available {
                return Err(StockRepositoryError::insufficient(
                    deduction.batch_id,
                    requested,
                    batch.quantity_available,
                ));
            }
            pending.insert(deduction.batch_id, requested);
        }
        for (batch_id, quantity) in pending {
            if let Some(batch) = rows.get_mut(&batch_id) {
                batch.quantity_available -= quantity;
            }
        }
        Ok(())
    }
}

/// Intent storage.
#[derive(Debug, Default)]
pub struct MemoryIntentRepository {
    rows: Table<IntentId, Intent>,
}

impl MemoryIntentRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntentRepository for MemoryIntentRepository {
    async fn create(&self, intent: &Intent) -> Result<(), RepositoryError> {
        self.rows
            .insert(intent.id, intent, |i| i.number == intent.number)
            .await
    }

    async fn update(&self, current: &Intent, next: &Intent) -> Result<(), RepositoryError> {
        self.rows.swap(next.id, current, next).await
    }

    async fn find(&self, id: IntentId) -> Result<Option<Intent>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn list(
        &self,
        filter: &IntentFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Intent>, RepositoryError> {
        Ok(self
            .rows
            .page(
                |i| filter.matches(i),
                |a, b| (b.created_at, &b.number).cmp(&(a.created_at, &a.number)),
                page,
            )
            .await)
    }
}

/// GRN storage.
#[derive(Debug, Default)]
pub struct MemoryGrnRepository {
    rows: Table<GrnId, Grn>,
}

impl MemoryGrnRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrnRepository for MemoryGrnRepository {
    async fn create(&self, grn: &Grn) -> Result<(), RepositoryError> {
        self.rows.insert(grn.id, grn, |g| g.number == grn.number).await
    }

    async fn find(&self, id: GrnId) -> Result<Option<Grn>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn list(
        &self,
        filter: &GrnFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Grn>, RepositoryError> {
        Ok(self
            .rows
            .page(
                |g| filter.matches(g),
                |a, b| (b.received_at, &b.number).cmp(&(a.received_at, &a.number)),
                page,
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    //! Atomicity and ordering checks for stock storage.

    use chrono::{NaiveDate, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::Money;

    fn batch(product_id: ProductId, number: &str, expiry: NaiveDate, qty: u32) -> StockBatch {
        StockBatch {
            id: BatchId::random(),
            product_id,
            batch_number: number.to_owned(),
            expiry_date: expiry,
            mrp: Money::from_minor(200),
            purchase_price: Money::from_minor(100),
            quantity_available: qty,
            grn_id: GrnId::random(),
            received_at: Utc::now(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, d).expect("date")
    }

    #[fixture]
    fn product_id() -> ProductId {
        ProductId::random()
    }

    #[rstest]
    #[tokio::test]
    async fn batches_come_back_earliest_expiry_first(product_id: ProductId) {
        let repo = MemoryStockRepository::new();
        repo.insert_batches(&[
            batch(product_id, "LATE", day(20), 5),
            batch(product_id, "EARLY", day(2), 5),
            batch(ProductId::random(), "OTHER", day(1), 5),
        ])
        .await
        .expect("insert");

        let found = repo.batches_for(product_id).await.expect("batches");
        let numbers: Vec<_> = found.iter().map(|b| b.batch_number.as_str()).collect();
        assert_eq!(numbers, ["EARLY", "LATE"]);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_deduction_changes_nothing(product_id: ProductId) {
        let repo = MemoryStockRepository::new();
        let first = batch(product_id, "A", day(2), 5);
        let second = batch(product_id, "B", day(3), 2);
        repo.insert_batches(&[first.clone(), second.clone()])
            .await
            .expect("insert");

        let err = repo
            .deduct(&[
                StockDeduction {
                    batch_id: first.id,
                    quantity: 5,
                },
                StockDeduction {
                    batch_id: second.id,
                    quantity: 3,
                },
            ])
            .await
            .expect_err("insufficient");

        assert!(matches!(err, StockRepositoryError::Insufficient { available: 2, .. }));
        let after = repo.batches_for(product_id).await.expect("batches");
        let quantities: Vec<_> = after.iter().map(|b| b.quantity_available).collect();
        assert_eq!(quantities, [5, 2]);
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_deductions_on_one_batch_are_summed(product_id: ProductId) {
        let repo = MemoryStockRepository::new();
        let only = batch(product_id, "A", day(2), 5);
        repo.insert_batches(std::slice::from_ref(&only))
            .await
            .expect("insert");
        let twice = [
            StockDeduction {
                batch_id: only.id,
                quantity: 3,
            },
            StockDeduction {
                batch_id: only.id,
                quantity: 3,
            },
        ];
        assert!(repo.deduct(&twice).await.is_err());

        repo.deduct(&twice[..1]).await.expect("deduct");
        let after = repo.batches_for(product_id).await.expect("batches");
        assert_eq!(after.first().map(|b| b.quantity_available), Some(2));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_batch_is_reported() {
        let repo = MemoryStockRepository::new();
        let err = repo
            .deduct(&[StockDeduction {
                batch_id: BatchId::random(),
                quantity: 1,
            }])
            .await
            .expect_err("unknown");
        assert!(matches!(err, StockRepositoryError::UnknownBatch { .. }));
    }
}

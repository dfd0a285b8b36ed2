//! Port for stock batch persistence.
//!
//! Availability is answered by the storage layer and deductions are applied
//! atomically per sale, so two concurrent sales cannot oversell a batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;
use crate::domain::{BatchId, ProductId, StockBatch};

define_port_error! {
    /// Errors raised by stock adapters.
    pub enum StockRepositoryError {
        /// Storage could not be reached.
        Connection { message: String } => "stock repository connection failed: {message}",
        /// A query or mutation failed.
        Query { message: String } => "stock repository query failed: {message}",
        /// A batch held fewer units than a deduction asked for.
        Insufficient { batch_id: BatchId, requested: u32, available: u32 } =>
            "batch {batch_id} holds {available} units, {requested} requested",
        /// A deduction referenced an unknown batch.
        UnknownBatch { batch_id: BatchId } => "stock batch {batch_id} does not exist",
    }
}

/// Units to remove from one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDeduction {
    /// Batch to decrement.
    pub batch_id: BatchId,
    /// Units to remove.
    pub quantity: u32,
}

/// Storage for stock batches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Insert freshly received batches.
    async fn insert_batches(&self, batches: &[StockBatch]) -> Result<(), StockRepositoryError>;
    /// Every batch of one product, including empty and expired ones.
    async fn batches_for(&self, product_id: ProductId)
    -> Result<Vec<StockBatch>, StockRepositoryError>;
    /// Every batch.
    async fn all_batches(&self) -> Result<Vec<StockBatch>, StockRepositoryError>;
    /// Apply every deduction or none of them.
    async fn deduct(&self, deductions: &[StockDeduction]) -> Result<(), StockRepositoryError>;
}

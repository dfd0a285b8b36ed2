//! Stock batches and first-expiry-first-out allocation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BatchId, Error, GrnId, Money, ProductId};

/// Units of one product received together under one batch number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockBatch {
    /// Stable identifier.
    pub id: BatchId,
    /// Product held.
    pub product_id: ProductId,
    /// Manufacturer batch number.
    pub batch_number: String,
    /// Last usable day is the day before this date.
    pub expiry_date: NaiveDate,
    /// Selling price per unit.
    pub mrp: Money,
    /// Cost per unit.
    pub purchase_price: Money,
    /// Units on the shelf.
    pub quantity_available: u32,
    /// Receiving GRN.
    pub grn_id: GrnId,
    /// Receipt time.
    pub received_at: DateTime<Utc>,
}

impl StockBatch {
    /// A batch is expired on and after its expiry date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date <= today
    }

    /// Non-expired and holding stock.
    pub fn is_sellable(&self, today: NaiveDate) -> bool {
        !self.is_expired(today) && self.quantity_available > 0
    }
}

/// Units taken from one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAllocation {
    /// Source batch.
    pub batch_id: BatchId,
    /// Its batch number.
    pub batch_number: String,
    /// Its expiry date.
    pub expiry_date: NaiveDate,
    /// Units taken.
    pub quantity: u32,
    /// Unit price.
    pub mrp: Money,
    /// `quantity × mrp`.
    pub amount: Money,
}

/// Per-product stock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    /// Product summarised.
    pub product_id: ProductId,
    /// Units in non-expired batches.
    pub available: u64,
    /// Units in expired batches.
    pub expired: u64,
    /// Every batch, earliest expiry first.
    pub batches: Vec<StockBatch>,
}

impl StockSummary {
    /// Summarise `batches` for `product_id` as of `today`.
    pub fn new(product_id: ProductId, mut batches: Vec<StockBatch>, today: NaiveDate) -> Self {
        batches.retain(|batch| batch.product_id == product_id);
        sort_fefo(&mut batches);
        let (expired, live): (Vec<_>, Vec<_>) =
            batches.iter().partition(|batch| batch.is_expired(today));
        Self {
            product_id,
            available: live.iter().map(|b| u64::from(b.quantity_available)).sum(),
            expired: expired.iter().map(|b| u64::from(b.quantity_available)).sum(),
            batches,
        }
    }
}

/// Units of `product_id` in non-expired batches.
pub fn available_quantity(batches: &[StockBatch], product_id: ProductId, today: NaiveDate) -> u64 {
    batches
        .iter()
        .filter(|b| b.product_id == product_id && !b.is_expired(today))
        .map(|b| u64::from(b.quantity_available))
        .sum()
}

fn sort_fefo(batches: &mut [StockBatch]) {
    batches.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.received_at.cmp(&b.received_at))
            .then(a.id.cmp(&b.id))
    });
}

/// Take `quantity` units from the earliest-expiring sellable batches.
///
/// Ties on expiry fall back to receipt time, then batch id. Returns the
/// allocations covering as much as possible; the caller compares the sum
/// with `quantity` to detect a shortage. Fails only on amount overflow.
pub fn allocate_fefo(
    batches: &[StockBatch],
    quantity: u32,
    today: NaiveDate,
) -> Result<Vec<StockAllocation>, Error> {
    let mut candidates: Vec<StockBatch> = batches
        .iter()
        .filter(|b| b.is_sellable(today))
        .cloned()
        .collect();
    sort_fefo(&mut candidates);

    let mut remaining = quantity;
    let mut allocations = Vec::new();
    for batch in candidates {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.quantity_available);
        remaining -= take;
        allocations.push(StockAllocation {
            batch_id: batch.id,
            batch_number: batch.batch_number,
            expiry_date: batch.expiry_date,
            quantity: take,
            mrp: batch.mrp,
            amount: batch.mrp.try_mul(take)?,
        });
    }
    Ok(allocations)
}

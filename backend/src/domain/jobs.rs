//! Background jobs emitted by domain services.

use serde::{Deserialize, Serialize};

use super::{BillId, ProductId, VisitId};

/// Work handed to the job queue after a business operation commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// A sale left a product below its reorder level.
    #[serde(rename_all = "camelCase")]
    LowStock {
        /// Product running low.
        product_id: ProductId,
        /// Sellable units left.
        available: u64,
        /// Configured threshold.
        reorder_level: u32,
    },
    /// A bill has been paid in full.
    #[serde(rename_all = "camelCase")]
    BillSettled {
        /// Settled bill.
        bill_id: BillId,
        /// Its visit.
        visit_id: VisitId,
    },
}

impl Job {
    /// Short name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LowStock { .. } => "low_stock",
            Self::BillSettled { .. } => "bill_settled",
        }
    }
}

//! Pharmacy catalogue, stock batches, purchasing, and counter sales.

mod grn;
mod intent;
mod product;
mod sale;
mod stock;

pub use grn::{Grn, GrnDraft, GrnItem, GrnItemInput};
pub use intent::{Intent, IntentDraft, IntentItem, IntentStatus};
pub use product::{Product, ProductDraft};
pub use sale::{
    AvailabilityLine, CounterSale, CounterSaleDraft, PaymentMode, SaleLine, SaleLineRequest,
    Shortage, merge_lines, shortage_error,
};
pub use stock::{StockAllocation, StockBatch, StockSummary, allocate_fefo, available_quantity};

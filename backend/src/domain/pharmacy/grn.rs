//! Goods received notes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::validation::{
    bounded_text, field_error, field_value_error, non_negative_amount, positive_quantity,
};
use crate::domain::{BatchId, Error, GrnId, IntentId, Money, ProductId};

/// One received line; becomes exactly one stock batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnItem {
    /// Batch created for this line.
    pub batch_id: BatchId,
    /// Product received.
    pub product_id: ProductId,
    /// Manufacturer batch number.
    pub batch_number: String,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Paid units.
    pub quantity: u32,
    /// Bonus units; not costed.
    pub free_quantity: u32,
    /// Cost per paid unit.
    pub purchase_price: Money,
    /// Selling price per unit.
    pub mrp: Money,
}

impl GrnItem {
    /// Units placed on the shelf.
    pub const fn units_received(&self) -> u32 {
        self.quantity.saturating_add(self.free_quantity)
    }
}

/// A goods receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Grn {
    /// Stable identifier.
    pub id: GrnId,
    /// Document number, e.g. `GRN-000001`.
    pub number: String,
    /// Supplier.
    pub supplier_name: String,
    /// Supplier invoice reference.
    pub invoice_number: String,
    /// Intent fulfilled by this receipt.
    pub intent_id: Option<IntentId>,
    /// Received lines.
    pub items: Vec<GrnItem>,
    /// `Σ quantity × purchasePrice`.
    pub total_cost: Money,
    /// Receipt time.
    pub received_at: DateTime<Utc>,
}

/// Raw GRN line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrnItemInput {
    /// Product received.
    pub product_id: ProductId,
    /// Batch number.
    pub batch_number: String,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Paid units.
    pub quantity: u32,
    /// Bonus units.
    pub free_quantity: u32,
    /// Cost per unit.
    pub purchase_price: Money,
    /// Selling price per unit.
    pub mrp: Money,
}

/// Validated receipt, with batch ids assigned and cost totalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrnDraft {
    /// Trimmed supplier.
    pub supplier_name: String,
    /// Trimmed invoice number.
    pub invoice_number: String,
    /// Intent being fulfilled.
    pub intent_id: Option<IntentId>,
    /// Validated lines.
    pub items: Vec<GrnItem>,
    /// Total cost of paid units.
    pub total_cost: Money,
}

impl GrnDraft {
    /// Validate a receipt as of `today`.
    pub fn new(
        supplier_name: &str,
        invoice_number: &str,
        intent_id: Option<IntentId>,
        items: Vec<GrnItemInput>,
        today: NaiveDate,
    ) -> Result<Self, Error> {
        if items.is_empty() {
            return Err(field_error("items", "missing_field", "a GRN needs at least one item"));
        }
        let items = items
            .into_iter()
            .map(|input| validate_item(input, today))
            .collect::<Result<Vec<_>, _>>()?;
        let total_cost = Money::try_sum(
            items
                .iter()
                .map(|item| item.purchase_price.try_mul(item.quantity))
                .collect::<Result<Vec<_>, _>>()?,
        )?;
        Ok(Self {
            supplier_name: bounded_text("supplierName", supplier_name, 2, 120)?,
            invoice_number: bounded_text("invoiceNumber", invoice_number, 1, 60)?,
            intent_id,
            items,
            total_cost,
        })
    }
}

fn validate_item(input: GrnItemInput, today: NaiveDate) -> Result<GrnItem, Error> {
    positive_quantity("items.quantity", input.quantity)?;
    if input.expiry_date <= today {
        return Err(field_value_error(
            "items.expiryDate",
            "already_expired",
            input.expiry_date.to_string(),
            "expiryDate must be after today",
        ));
    }
    let purchase_price = non_negative_amount("items.purchasePrice", input.purchase_price)?;
    let mrp = non_negative_amount("items.mrp", input.mrp)?;
    if mrp < purchase_price {
        return Err(field_error(
            "items.mrp",
            "mrp_below_cost",
            "mrp must not be below purchasePrice",
        ));
    }
    Ok(GrnItem {
        batch_id: BatchId::random(),
        product_id: input.product_id,
        batch_number: bounded_text("items.batchNumber", &input.batch_number, 1, 40)?,
        expiry_date: input.expiry_date,
        quantity: input.quantity,
        free_quantity: input.free_quantity,
        purchase_price,
        mrp,
    })
}

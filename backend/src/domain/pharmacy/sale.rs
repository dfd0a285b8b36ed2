//! Over-the-counter pharmacy sales.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::StockAllocation;
use crate::domain::validation::{
    field_error, field_value_error, non_negative_amount, positive_quantity,
};
use crate::domain::{CounterSaleId, Error, Money, PatientId, ProductId, VisitId};

/// How a counter sale is settled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Cash at the counter.
    Cash,
    /// Card at the counter.
    Card,
    /// UPI transfer at the counter.
    Upi,
    /// Charged to the visit's bill.
    VisitBill,
}

impl PaymentMode {
    /// Every mode.
    pub const ALL: [PaymentMode; 4] = [Self::Cash, Self::Card, Self::Upi, Self::VisitBill];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Upi => "upi",
            Self::VisitBill => "visit_bill",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                field_value_error("paymentMode", "invalid_payment_mode", s, "unknown payment mode")
            })
    }
}

/// Requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    /// Product wanted.
    pub product_id: ProductId,
    /// Units wanted.
    pub quantity: u32,
}

/// Merge repeated products, keeping first-seen order.
///
/// Every input quantity must be positive.
pub fn merge_lines(lines: &[SaleLineRequest]) -> Result<Vec<SaleLineRequest>, Error> {
    if lines.is_empty() {
        return Err(field_error("items", "missing_field", "at least one item is required"));
    }
    let mut merged: Vec<SaleLineRequest> = Vec::with_capacity(lines.len());
    for line in lines {
        positive_quantity("items.quantity", line.quantity)?;
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity =
                    existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                        field_error(
                            "items.quantity",
                            "quantity_overflow",
                            "merged quantity is too large",
                        )
                    })?;
            }
            None => merged.push(*line),
        }
    }
    Ok(merged)
}

/// Unmet demand for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shortage {
    /// Product short.
    pub product_id: ProductId,
    /// Units requested.
    pub requested: u32,
    /// Sellable units on hand.
    pub available: u64,
}

/// Conflict listing every short product.
pub fn shortage_error(shortages: &[Shortage]) -> Error {
    Error::conflict("insufficient stock for one or more items")
        .with_details(json!({ "shortages": shortages }))
}

/// Dry-run result for one requested product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityLine {
    /// Product checked.
    pub product_id: ProductId,
    /// Units requested after merging.
    pub requested: u32,
    /// Sellable units on hand.
    pub available: u64,
    /// `available >= requested`.
    pub sufficient: bool,
    /// Proposed first-expiry-first-out allocation.
    pub allocations: Vec<StockAllocation>,
}

/// A sold product with the batches it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    /// Product sold.
    pub product_id: ProductId,
    /// Units sold.
    pub quantity: u32,
    /// Batch allocations summing to `quantity`.
    pub allocations: Vec<StockAllocation>,
    /// Sum of allocation amounts.
    pub amount: Money,
}

/// A completed counter sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterSale {
    /// Stable identifier.
    pub id: CounterSaleId,
    /// Document number, e.g. `CS-000001`.
    pub number: String,
    /// Buying patient, if registered.
    pub patient_id: Option<PatientId>,
    /// Visit the sale dispenses for.
    pub visit_id: Option<VisitId>,
    /// Sold lines.
    pub items: Vec<SaleLine>,
    /// Sum of line amounts.
    pub subtotal: Money,
    /// Discount, at most the subtotal.
    pub discount: Money,
    /// `subtotal - discount`.
    pub total: Money,
    /// Settlement mode.
    pub payment_mode: PaymentMode,
    /// Sale time.
    pub created_at: DateTime<Utc>,
}

impl CounterSale {
    /// Units of `product_id` sold.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .sum()
    }
}

/// Validated sale request with merged lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSaleDraft {
    /// Explicit patient.
    pub patient_id: Option<PatientId>,
    /// Linked visit.
    pub visit_id: Option<VisitId>,
    /// Merged lines.
    pub lines: Vec<SaleLineRequest>,
    /// Non-negative discount.
    pub discount: Money,
    /// Settlement mode.
    pub payment_mode: PaymentMode,
}

impl CounterSaleDraft {
    /// Validate the request shape. Stock and visit checks happen later.
    pub fn new(
        patient_id: Option<PatientId>,
        visit_id: Option<VisitId>,
        lines: &[SaleLineRequest],
        discount: Money,
        payment_mode: PaymentMode,
    ) -> Result<Self, Error> {
        if payment_mode == PaymentMode::VisitBill && visit_id.is_none() {
            return Err(field_error(
                "visitId",
                "missing_field",
                "visitId is required when paymentMode is visit_bill",
            ));
        }
        Ok(Self {
            patient_id,
            visit_id,
            lines: merge_lines(lines)?,
            discount: non_negative_amount("discount", discount)?,
            payment_mode,
        })
    }

    /// Compute `(subtotal, total)` for priced lines.
    pub fn totals(&self, items: &[SaleLine]) -> Result<(Money, Money), Error> {
        let subtotal = Money::try_sum(items.iter().map(|line| line.amount))?;
        if self.discount > subtotal {
            return Err(field_error(
                "discount",
                "discount_exceeds_subtotal",
                "discount must not exceed the subtotal",
            ));
        }
        Ok((subtotal, subtotal.try_sub(self.discount)?))
    }
}

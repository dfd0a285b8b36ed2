//! Purchase intents awaiting fulfilment through goods receipt.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::validation::{field_error, field_value_error, optional_text, positive_quantity};
use crate::domain::{Error, IntentId, ProductId};

/// Fulfilment state of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Nothing received yet.
    Pending,
    /// Some units received.
    PartiallyFulfilled,
    /// Every line received in full.
    Fulfilled,
    /// Withdrawn before any receipt.
    Cancelled,
}

impl IntentStatus {
    const ALL: [IntentStatus; 4] = [
        Self::Pending,
        Self::PartiallyFulfilled,
        Self::Fulfilled,
        Self::Cancelled,
    ];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyFulfilled => "partially_fulfilled",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                field_value_error("status", "invalid_status", s, "unknown intent status")
            })
    }
}

/// One requested product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentItem {
    /// Requested product.
    pub product_id: ProductId,
    /// Units requested.
    pub quantity_requested: u32,
    /// Units received so far, including free units.
    pub quantity_received: u32,
}

/// A pharmacy purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Stable identifier.
    pub id: IntentId,
    /// Document number, e.g. `IND-000001`.
    pub number: String,
    /// Requested lines, one per product.
    pub items: Vec<IntentItem>,
    /// Fulfilment state.
    pub status: IntentStatus,
    /// Free-text note.
    pub note: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Intent {
    /// Whether a GRN may still be received against this intent.
    pub const fn accepts_receipts(&self) -> bool {
        matches!(
            self.status,
            IntentStatus::Pending | IntentStatus::PartiallyFulfilled
        )
    }

    /// Products on the intent.
    pub fn products(&self) -> BTreeSet<ProductId> {
        self.items.iter().map(|item| item.product_id).collect()
    }

    /// Add received units for each `(product, quantity)` and recompute status.
    pub fn record_receipt(&mut self, received: impl IntoIterator<Item = (ProductId, u32)>) {
        for (product_id, quantity) in received {
            if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
                item.quantity_received = item.quantity_received.saturating_add(quantity);
            }
        }
        self.status = if self
            .items
            .iter()
            .all(|i| i.quantity_received >= i.quantity_requested)
        {
            IntentStatus::Fulfilled
        } else if self.items.iter().any(|i| i.quantity_received > 0) {
            IntentStatus::PartiallyFulfilled
        } else {
            IntentStatus::Pending
        };
    }

    /// Cancel a pending intent.
    pub fn cancel(&mut self) -> Result<(), Error> {
        if self.status != IntentStatus::Pending {
            return Err(Error::conflict(format!(
                "only pending intents can be cancelled; intent is {}",
                self.status
            ))
            .with_details(json!({ "status": self.status })));
        }
        self.status = IntentStatus::Cancelled;
        Ok(())
    }
}

/// Validated intent lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDraft {
    /// `(product, quantity requested)` pairs with unique products.
    pub items: Vec<(ProductId, u32)>,
    /// Trimmed note.
    pub note: Option<String>,
}

impl IntentDraft {
    /// Validate requested lines.
    pub fn new(items: Vec<(ProductId, u32)>, note: Option<&str>) -> Result<Self, Error> {
        if items.is_empty() {
            return Err(field_error("items", "missing_field", "an intent needs at least one item"));
        }
        let mut seen = BTreeSet::new();
        for (product_id, quantity) in &items {
            positive_quantity("items.quantityRequested", *quantity)?;
            if !seen.insert(*product_id) {
                return Err(field_value_error(
                    "items.productId",
                    "duplicate_product",
                    product_id.to_string(),
                    "each product may appear only once",
                ));
            }
        }
        Ok(Self {
            items,
            note: optional_text("note", note, 500)?,
        })
    }
}

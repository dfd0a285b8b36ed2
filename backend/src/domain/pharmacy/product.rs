//! Pharmacy catalogue entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::validation::{bounded_text, optional_text};
use crate::domain::{Error, ProductId};

/// A dispensable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable identifier.
    pub id: ProductId,
    /// Brand name, unique ignoring case.
    pub name: String,
    /// Generic (salt) name.
    pub generic_name: Option<String>,
    /// Manufacturer.
    pub manufacturer: Option<String>,
    /// Dispensing unit, e.g. "tablet".
    pub unit: String,
    /// Available stock below this level raises a low-stock alert.
    pub reorder_level: u32,
    /// Inactive products cannot be ordered or sold.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Overwrite catalogue fields from a validated draft.
    pub fn apply(&mut self, draft: ProductDraft) {
        self.name = draft.name;
        self.generic_name = draft.generic_name;
        self.manufacturer = draft.manufacturer;
        self.unit = draft.unit;
        self.reorder_level = draft.reorder_level;
    }
}

/// Validated product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Trimmed name.
    pub name: String,
    /// Trimmed generic name.
    pub generic_name: Option<String>,
    /// Trimmed manufacturer.
    pub manufacturer: Option<String>,
    /// Trimmed, lowercased unit.
    pub unit: String,
    /// Reorder threshold.
    pub reorder_level: u32,
}

impl ProductDraft {
    /// Validate raw catalogue input.
    pub fn new(
        name: &str,
        generic_name: Option<&str>,
        manufacturer: Option<&str>,
        unit: &str,
        reorder_level: u32,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: bounded_text("name", name, 2, 120)?,
            generic_name: optional_text("genericName", generic_name, 120)?,
            manufacturer: optional_text("manufacturer", manufacturer, 120)?,
            unit: bounded_text("unit", unit, 1, 30)?.to_lowercase(),
            reorder_level,
        })
    }
}

//! Operations that accept idempotency keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scope of an idempotency key. The same UUID may be reused across scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    /// `POST /api/v1/counter-sales`.
    CounterSales,
    /// `POST /api/v1/bills/{id}/payments`.
    BillPayments,
}

impl MutationType {
    /// Every scope.
    pub const ALL: [MutationType; 2] = [MutationType::CounterSales, MutationType::BillPayments];

    /// Stable storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CounterSales => "counter_sales",
            Self::BillPayments => "bill_payments",
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown mutation type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mutation type '{input}'")]
pub struct ParseMutationTypeError {
    /// Rejected input.
    pub input: String,
}

impl FromStr for MutationType {
    type Err = ParseMutationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseMutationTypeError {
                input: s.to_owned(),
            })
    }
}

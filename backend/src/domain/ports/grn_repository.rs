//! Port for goods receipt persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Grn, GrnId, IntentId};

/// GRN list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrnFilter {
    /// Fulfilled intent.
    pub intent_id: Option<IntentId>,
    /// Case-insensitive substring of the supplier name.
    pub supplier: Option<String>,
}

impl GrnFilter {
    /// Whether `grn` passes the filter.
    pub fn matches(&self, grn: &Grn) -> bool {
        self.intent_id.is_none_or(|id| grn.intent_id == Some(id))
            && self.supplier.as_deref().is_none_or(|needle| {
                grn.supplier_name.to_lowercase().contains(&needle.to_lowercase())
            })
    }
}

/// Storage for GRNs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrnRepository: Send + Sync {
    /// Insert a new GRN.
    async fn create(&self, grn: &Grn) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: GrnId) -> Result<Option<Grn>, RepositoryError>;
    /// Filtered page, newest first.
    async fn list(&self, filter: &GrnFilter, page: PageRequest)
    -> Result<ListSlice<Grn>, RepositoryError>;
}

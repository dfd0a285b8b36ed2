//! Port for purchase intent persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Intent, IntentId, IntentStatus};

/// Intent list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentFilter {
    /// Fulfilment state.
    pub status: Option<IntentStatus>,
}

impl IntentFilter {
    /// Whether `intent` passes the filter.
    pub fn matches(&self, intent: &Intent) -> bool {
        self.status.is_none_or(|status| intent.status == status)
    }
}

/// Storage for intents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentRepository: Send + Sync {
    /// Insert a new intent.
    async fn create(&self, intent: &Intent) -> Result<(), RepositoryError>;
    /// Replace `current` with `next`. A stored intent that no longer equals
    /// `current` is a [`RepositoryError::Conflict`].
    async fn update(&self, current: &Intent, next: &Intent) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: IntentId) -> Result<Option<Intent>, RepositoryError>;
    /// Filtered page, newest first.
    async fn list(
        &self,
        filter: &IntentFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Intent>, RepositoryError>;
}

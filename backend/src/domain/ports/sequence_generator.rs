//! Port allocating monotonic sequence numbers.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::numbering::SequenceKind;

/// Source of document and token numbers. Values start at 1 per kind and are
/// never handed out twice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    /// Allocate the next value for `kind`.
    async fn next(&self, kind: SequenceKind) -> Result<u64, RepositoryError>;
}
